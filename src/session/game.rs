//! Game Session
//!
//! Owns one board, its ledger and its input controller, and is the only path
//! through which a turn mutates them. A renderer drives it in one of two ways:
//!
//! - [`GameSession::select`] then [`GameSession::advance`] repeatedly,
//!   animating each returned [`Stage`];
//! - [`GameSession::attempt_swap`], which resolves the whole turn at once.

use tracing::{debug, info, warn};

use crate::core::hash::{compute_session_hash, short_hex, StateHash};
use crate::core::rng::{derive_session_seed, DeterministicRng};
use crate::game::controller::{SelectOutcome, TurnController, TurnState};
use crate::game::error::{ConfigError, EngineError};
use crate::game::generate::generate_playable;
use crate::game::grid::{Grid, Position};
use crate::game::ledger::{LedgerSnapshot, ScoreLedger};
use crate::game::matcher::{find_valid_moves, has_valid_move};
use crate::game::resolver::{Cascade, CascadeRules, Stage, TurnSummary};
use crate::session::config::SessionConfig;
use crate::session::observer::TurnObserver;
use crate::session::report::FinalReport;
use crate::session::store::BestScoreStore;

/// Unique session identifier.
pub type SessionId = uuid::Uuid;

/// A single-player game.
pub struct GameSession {
    id: SessionId,
    config: SessionConfig,
    rules: CascadeRules,
    rng: DeterministicRng,
    grid: Grid,
    ledger: ScoreLedger,
    controller: TurnController,
    in_flight: Option<Cascade>,
    last_turn: Option<TurnSummary>,
    observers: Vec<Box<dyn TurnObserver + Send>>,
    store: Option<Box<dyn BestScoreStore + Send>>,
    best_score: u32,
    best_at_start: u32,
    moves: Vec<(Position, Position)>,
}

impl GameSession {
    /// Start a session from an explicit seed.
    pub fn new(config: SessionConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::build(config, SessionId::new_v4(), seed, None)
    }

    /// Start a session seeded from a fresh id and the configured player key.
    pub fn for_player(config: SessionConfig) -> Result<Self, ConfigError> {
        let id = SessionId::new_v4();
        let seed = derive_session_seed(id.as_bytes(), &config.player_key);
        Self::build(config, id, seed, None)
    }

    /// Start a session on a given board.
    ///
    /// The board width overrides `config.width`. Every cell must hold a color
    /// from the configured palette; beyond that the board is used as is, even
    /// if it already holds runs or has no valid move.
    pub fn with_grid(mut config: SessionConfig, seed: u64, grid: Grid) -> Result<Self, ConfigError> {
        config.width = grid.width();
        Self::build(config, SessionId::new_v4(), seed, Some(grid))
    }

    fn build(
        config: SessionConfig,
        id: SessionId,
        seed: u64,
        grid: Option<Grid>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = DeterministicRng::new(seed);
        let grid = match grid {
            Some(grid) if !grid.is_filled_from(config.palette_size) => {
                return Err(ConfigError::InvalidGrid {
                    empty: grid.count_empty(),
                    palette_size: config.palette_size,
                });
            }
            Some(grid) => grid,
            None => generate_playable(
                config.width,
                config.palette_size,
                &mut rng,
                config.generation_attempts,
            ),
        };

        info!(
            "Session {} started: {}x{} board, seed {:#018x}",
            id, config.width, config.width, seed
        );

        Ok(Self {
            id,
            rules: config.rules(),
            controller: TurnController::new(config.width),
            config,
            rng,
            grid,
            ledger: ScoreLedger::new(),
            in_flight: None,
            last_turn: None,
            observers: Vec::new(),
            store: None,
            best_score: 0,
            best_at_start: 0,
            moves: Vec::new(),
        })
    }

    /// Attach best-score storage and load the stored best.
    pub fn with_store(mut self, store: Box<dyn BestScoreStore + Send>) -> Self {
        match store.load(&self.config.player_key) {
            Ok(Some(best)) => {
                debug!("Loaded best score {} for {}", best, self.config.player_key);
                self.best_score = best;
            }
            Ok(None) => {}
            Err(e) => warn!("Could not load best score: {}", e),
        }
        self.best_at_start = self.best_score;
        self.store = Some(store);
        self
    }

    /// Subscribe an observer.
    pub fn add_observer(&mut self, observer: Box<dyn TurnObserver + Send>) {
        self.observers.push(observer);
    }

    // =========================================================================
    // Turns
    // =========================================================================

    /// Handle a tap or click on `pos`.
    ///
    /// When the selection completes an adjacent pair the turn starts and
    /// input stays locked until [`advance`](Self::advance) returns `None`.
    pub fn select(&mut self, pos: Position) -> SelectOutcome {
        let outcome = self.controller.select(pos);
        if let SelectOutcome::SwapRequested { a, b } = outcome {
            if let Err(e) = self.start_cascade(a, b) {
                warn!("Swap {} <-> {} rejected: {}", a, b, e);
                self.controller.finish_resolution();
                return SelectOutcome::Ignored;
            }
        }
        outcome
    }

    /// Run the turn in flight up to its next stage.
    ///
    /// Returns `None` when no turn is in flight or the board just became
    /// stable; in the latter case the turn has been applied and the summary
    /// is available from [`last_turn`](Self::last_turn).
    pub fn advance(&mut self) -> Option<Stage> {
        let cascade = self.in_flight.as_mut()?;
        match cascade.advance(&mut self.rng) {
            Some(stage) => {
                for observer in &mut self.observers {
                    observer.on_stage(&stage);
                }
                Some(stage)
            }
            None => {
                if let Some(cascade) = self.in_flight.take() {
                    let summary = cascade.finish(&mut self.rng);
                    self.complete_turn(summary);
                }
                None
            }
        }
    }

    /// Drive the turn in flight to completion.
    pub fn resolve_pending(&mut self) -> Option<TurnSummary> {
        self.in_flight.as_ref()?;
        while self.advance().is_some() {}
        self.last_turn.clone()
    }

    /// Swap two tokens and resolve the whole turn.
    ///
    /// `Ok(None)` when paused or a turn is already in flight.
    pub fn attempt_swap(&mut self, a: Position, b: Position) -> Result<Option<TurnSummary>, EngineError> {
        if !self.controller.attempt_swap(a, b)? {
            return Ok(None);
        }
        if let Err(e) = self.start_cascade(a, b) {
            self.controller.finish_resolution();
            return Err(e);
        }
        Ok(self.resolve_pending())
    }

    fn start_cascade(&mut self, a: Position, b: Position) -> Result<(), EngineError> {
        self.ledger.begin_swap();
        let cascade = Cascade::begin(&self.grid, a, b, self.ledger.combo_streak(), self.rules)?;
        self.in_flight = Some(cascade);
        Ok(())
    }

    fn complete_turn(&mut self, summary: TurnSummary) {
        self.grid = summary.final_grid.clone();
        self.ledger.apply_turn(&summary);
        self.moves.push(summary.swap);
        self.controller.finish_resolution();
        self.update_best();

        let snapshot = self.ledger.snapshot();
        for observer in &mut self.observers {
            observer.on_turn(&summary, &snapshot);
        }

        if self.config.reshuffle_when_stuck && !has_valid_move(&self.grid) {
            self.reshuffle();
        }
        self.last_turn = Some(summary);
    }

    fn update_best(&mut self) {
        let score = self.ledger.total_score();
        if score <= self.best_score {
            return;
        }
        self.best_score = score;
        if let Some(store) = self.store.as_mut() {
            if let Err(e) = store.save(&self.config.player_key, score) {
                warn!("Could not save best score {}: {}", score, e);
            }
        }
    }

    fn reshuffle(&mut self) {
        self.grid = self.fresh_grid();
        info!("No valid move left, board regenerated");
        for observer in &mut self.observers {
            observer.on_reshuffle(&self.grid);
        }
    }

    fn fresh_grid(&mut self) -> Grid {
        generate_playable(
            self.config.width,
            self.config.palette_size,
            &mut self.rng,
            self.config.generation_attempts,
        )
    }

    // =========================================================================
    // Session control
    // =========================================================================

    /// One second of wall time passed. Counted only while the clock runs.
    pub fn tick(&mut self) -> bool {
        if self.controller.clock_running() && self.in_flight.is_none() {
            self.ledger.tick();
            true
        } else {
            false
        }
    }

    /// Pause input and the clock.
    pub fn pause(&mut self) {
        self.controller.pause();
    }

    /// Resume input and the clock.
    pub fn resume(&mut self) {
        self.controller.resume();
    }

    /// Flip the pause flag, returning the new value.
    pub fn toggle_pause(&mut self) -> bool {
        self.controller.toggle_pause()
    }

    /// Fresh board and ledger. Any turn in flight is dropped; pause is kept.
    pub fn new_game(&mut self) {
        self.in_flight = None;
        self.last_turn = None;
        self.controller.cancel_selection();
        self.ledger.reset();
        self.moves.clear();
        self.best_at_start = self.best_score;
        self.grid = self.fresh_grid();
        info!("Session {} new game", self.id);
    }

    /// New game, unpaused.
    pub fn restart(&mut self) {
        self.new_game();
        self.controller.reset();
    }

    /// End the session: persist the best score and notify observers.
    pub fn finish(&mut self) -> FinalReport {
        let total_score = self.ledger.total_score();
        self.update_best();

        let report = FinalReport {
            session_id: self.id,
            player_key: self.config.player_key.clone(),
            total_score,
            matched_count: total_score / self.rules.points_per_token,
            combo_streak: self.ledger.combo_streak(),
            elapsed_seconds: self.ledger.elapsed_seconds(),
            best_score: self.best_score,
            new_best: total_score > self.best_at_start,
        };

        for observer in &mut self.observers {
            observer.on_session_end(&report);
        }
        info!(
            "Session {} finished: score {}, best {}, state {}",
            self.id,
            report.total_score,
            report.best_score,
            short_hex(&self.compute_hash())
        );
        report
    }

    /// One swap that would match, if the board has any.
    pub fn hint(&self) -> Option<(Position, Position)> {
        if self.in_flight.is_some() {
            return None;
        }
        find_valid_moves(&self.grid).first().copied()
    }

    /// Hash of the seed, board and ledger.
    pub fn compute_hash(&self) -> StateHash {
        compute_session_hash(self.rng.seed(), |hasher| {
            self.grid.hash_into(hasher);
            self.ledger.hash_into(hasher);
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Seed the session RNG started from.
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Random values drawn so far.
    pub fn rng_draws(&self) -> u64 {
        self.rng.draws()
    }

    /// Active configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current stable board. While a turn is in flight this is the board
    /// from before the swap; the working board is in each [`Stage`].
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Ledger copy.
    pub fn ledger(&self) -> LedgerSnapshot {
        self.ledger.snapshot()
    }

    /// Current score.
    pub fn total_score(&self) -> u32 {
        self.ledger.total_score()
    }

    /// Best score known for this player.
    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    /// Input state.
    pub fn turn_state(&self) -> TurnState {
        self.controller.state()
    }

    /// Whether input is paused.
    pub fn is_paused(&self) -> bool {
        self.controller.is_paused()
    }

    /// Whether a turn is in flight.
    pub fn is_resolving(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Summary of the last completed turn of this game.
    pub fn last_turn(&self) -> Option<&TurnSummary> {
        self.last_turn.as_ref()
    }

    /// Swaps played this game, in order.
    pub fn moves(&self) -> &[(Position, Position)] {
        &self.moves
    }
}

// =============================================================================
// TESTS
// =============================================================================
