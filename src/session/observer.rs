//! Turn Observers
//!
//! Renderers, reporters and loggers subscribe to a session through
//! [`TurnObserver`]. Every hook returns `()`: an observer can fail however it
//! likes, the engine never sees it.

use std::sync::mpsc::Sender;

use serde::{Serialize, Deserialize};

use crate::game::grid::Grid;
use crate::game::ledger::LedgerSnapshot;
use crate::game::resolver::{Stage, TurnSummary};
use crate::session::report::FinalReport;

/// Subscriber to session output.
pub trait TurnObserver {
    /// A cascade checkpoint was reached.
    fn on_stage(&mut self, _stage: &Stage) {}

    /// A turn finished and the ledger was updated.
    fn on_turn(&mut self, _summary: &TurnSummary, _ledger: &LedgerSnapshot) {}

    /// The board had no valid move left and was regenerated.
    fn on_reshuffle(&mut self, _grid: &Grid) {}

    /// The player left the game.
    fn on_session_end(&mut self, _report: &FinalReport) {}
}

/// Owned copy of one observer notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// See [`TurnObserver::on_stage`]
    Stage(Stage),
    /// See [`TurnObserver::on_turn`]
    Turn {
        /// Turn outcome
        summary: TurnSummary,
        /// Ledger after the turn
        ledger: LedgerSnapshot,
    },
    /// See [`TurnObserver::on_reshuffle`]
    Reshuffled(Grid),
    /// See [`TurnObserver::on_session_end`]
    Ended(FinalReport),
}

/// Forward every notification over a channel.
///
/// A dropped receiver is ignored.
impl TurnObserver for Sender<SessionEvent> {
    fn on_stage(&mut self, stage: &Stage) {
        let _ = self.send(SessionEvent::Stage(stage.clone()));
    }

    fn on_turn(&mut self, summary: &TurnSummary, ledger: &LedgerSnapshot) {
        let _ = self.send(SessionEvent::Turn {
            summary: summary.clone(),
            ledger: *ledger,
        });
    }

    fn on_reshuffle(&mut self, grid: &Grid) {
        let _ = self.send(SessionEvent::Reshuffled(grid.clone()));
    }

    fn on_session_end(&mut self, report: &FinalReport) {
        let _ = self.send(SessionEvent::Ended(report.clone()));
    }
}

/// Logs turn outcomes through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TurnObserver for TracingObserver {
    fn on_turn(&mut self, summary: &TurnSummary, ledger: &LedgerSnapshot) {
        if summary.had_any_match {
            tracing::info!(
                "Swap {:?}: {} cleared over {} step(s), +{} (total {})",
                summary.swap,
                summary.tokens_cleared,
                summary.cascade_steps,
                summary.score_delta,
                ledger.total_score
            );
        } else {
            tracing::debug!("Swap {:?} made no match, reverted", summary.swap);
        }
    }

    fn on_reshuffle(&mut self, _grid: &Grid) {
        tracing::info!("No moves left, board reshuffled");
    }

    fn on_session_end(&mut self, report: &FinalReport) {
        tracing::info!(
            "Session ended: score {} (best {}), {}s played",
            report.total_score,
            report.best_score,
            report.elapsed_seconds
        );
    }
}
