//! Mon Crush Demo
//!
//! Plays a short headless game from hints, logs every turn, then replays the
//! recorded moves to check the engine is deterministic.

use anyhow::{bail, Context, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use mon_crush::{
    VERSION,
    session::{replay, GameSession, JsonFileStore, LogSink, ReportLog, SessionConfig, TracingObserver},
};

/// Turns played by the demo.
const DEMO_TURNS: usize = 20;

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Mon Crush Engine v{}", VERSION);

    // Optional first argument: path to a JSON config
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path))?;
            SessionConfig::from_json(&text)?
        }
        None => SessionConfig::default(),
    };

    demo_game(config)
}

/// Play a game from hints and verify it by replay.
fn demo_game(config: SessionConfig) -> Result<()> {
    info!("=== Starting Demo Game ===");

    let store = JsonFileStore::new(std::env::temp_dir().join("mon-crush-best.json"));
    let mut session = GameSession::for_player(config.clone())?.with_store(Box::new(store));
    let reports = ReportLog::new(LogSink);
    let history = reports.history();
    session.add_observer(Box::new(TracingObserver));
    session.add_observer(Box::new(reports));

    info!("Session ID: {}", session.id());
    info!("RNG Seed: {:#018x}", session.seed());
    info!("Best score so far: {}", session.best_score());
    info!("Starting board:\n{}", session.grid());

    for turn in 0..DEMO_TURNS {
        let Some((a, b)) = session.hint() else {
            info!("No move available after {} turn(s)", turn);
            break;
        };
        session.attempt_swap(a, b)?;
        session.tick();
    }

    info!("=== Game Results ===");
    info!("Final board:\n{}", session.grid());
    let hash = session.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));
    info!("Reports logged: {}", history.recent().len());

    let report = session.finish();
    info!(
        "Score {} ({} matched), best {}{}",
        report.total_score,
        report.matched_count,
        report.best_score,
        if report.new_best { " (new best)" } else { "" }
    );

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let replayed = replay(config, session.seed(), session.moves())?;
    let replay_hash = replayed.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash {
        bail!("DETERMINISM FAILURE: Hashes differ!");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");
    Ok(())
}
