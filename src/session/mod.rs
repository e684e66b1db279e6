//! Session Module
//!
//! Everything around the deterministic core that a running game needs:
//! configuration, the owning [`GameSession`], observers, score reporting,
//! best-score storage and replay.

pub mod config;
pub mod game;
pub mod observer;
pub mod replay;
pub mod report;
pub mod store;

pub use config::SessionConfig;
pub use game::{GameSession, SessionId};
pub use observer::{SessionEvent, TracingObserver, TurnObserver};
pub use replay::{replay, ReplayError};
pub use report::{FinalReport, LogSink, ReportHistory, ReportLog, ReportSink, ReportStatus, ScoreReport};
pub use store::{BestScoreStore, JsonFileStore, MemoryStore, StoreError};
