//! Turn Controller
//!
//! Gates player input. Selections move between `Idle`, `AwaitingSecond` and
//! `Resolving`; pausing is an orthogonal flag that swallows every selection.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::game::error::EngineError;
use crate::game::grid::{are_adjacent, Position};

/// Input state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnState {
    /// Nothing selected
    #[default]
    Idle,
    /// One tile selected, waiting for its partner
    AwaitingSecond(Position),
    /// A cascade is running; input is locked
    Resolving,
}

/// What a selection did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectOutcome {
    /// Paused, resolving, or out of range
    Ignored,
    /// First tile selected
    Selected(Position),
    /// Same tile clicked again
    Deselected(Position),
    /// Non-adjacent tile replaced the selection
    Reselected {
        /// Previous selection
        from: Position,
        /// New selection
        to: Position,
    },
    /// Adjacent tile chosen; the caller must resolve the swap and then call
    /// [`TurnController::finish_resolution`]
    SwapRequested {
        /// First selection
        a: Position,
        /// Second selection
        b: Position,
    },
}

/// Selection state machine for a board of fixed width.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnController {
    width: usize,
    state: TurnState,
    paused: bool,
}

impl TurnController {
    /// Controller for a `width × width` board.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            state: TurnState::Idle,
            paused: false,
        }
    }

    /// Current input state.
    #[inline]
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Currently selected tile, if any.
    pub fn selected(&self) -> Option<Position> {
        match self.state {
            TurnState::AwaitingSecond(p) => Some(p),
            _ => None,
        }
    }

    /// Whether a cascade holds the input lock.
    #[inline]
    pub fn is_resolving(&self) -> bool {
        self.state == TurnState::Resolving
    }

    /// Whether input is paused.
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause input. Does not interrupt a resolution in progress.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume input.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Flip the pause flag, returning the new value.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Whether time should advance: not paused and not resolving.
    pub fn clock_running(&self) -> bool {
        !self.paused && !self.is_resolving()
    }

    #[inline]
    fn in_range(&self, pos: Position) -> bool {
        pos < self.width * self.width
    }

    /// Handle a tap or click on `pos`.
    pub fn select(&mut self, pos: Position) -> SelectOutcome {
        if self.paused || !self.in_range(pos) {
            return SelectOutcome::Ignored;
        }

        match self.state {
            TurnState::Resolving => SelectOutcome::Ignored,
            TurnState::Idle => {
                self.state = TurnState::AwaitingSecond(pos);
                SelectOutcome::Selected(pos)
            }
            TurnState::AwaitingSecond(first) if first == pos => {
                self.state = TurnState::Idle;
                SelectOutcome::Deselected(pos)
            }
            TurnState::AwaitingSecond(first) => match self.attempt_swap(first, pos) {
                Ok(true) => SelectOutcome::SwapRequested { a: first, b: pos },
                // Both positions are in range and unpaused, so the only
                // failure left is a non-adjacent pick
                _ => {
                    self.state = TurnState::AwaitingSecond(pos);
                    SelectOutcome::Reselected { from: first, to: pos }
                }
            },
        }
    }

    /// Take the input lock for a swap of `a` and `b`.
    ///
    /// `Ok(false)` when paused or already resolving (nothing happens).
    /// On `Ok(true)` the controller is `Resolving` until
    /// [`finish_resolution`](Self::finish_resolution).
    pub fn attempt_swap(&mut self, a: Position, b: Position) -> Result<bool, EngineError> {
        if self.paused || self.is_resolving() {
            return Ok(false);
        }
        let cells = self.width * self.width;
        for position in [a, b] {
            if !self.in_range(position) {
                return Err(EngineError::OutOfBounds { position, cells });
            }
        }
        if !are_adjacent(self.width, a, b) {
            return Err(EngineError::InvalidSwap { a, b });
        }

        debug!("Swap {} <-> {} accepted", a, b);
        self.state = TurnState::Resolving;
        Ok(true)
    }

    /// Release the input lock after a cascade, match or not.
    pub fn finish_resolution(&mut self) {
        if self.is_resolving() {
            self.state = TurnState::Idle;
        }
    }

    /// Drop any selection or lock, keeping the pause flag.
    pub fn cancel_selection(&mut self) {
        self.state = TurnState::Idle;
    }

    /// Back to `Idle`, unpaused.
    pub fn reset(&mut self) {
        self.state = TurnState::Idle;
        self.paused = false;
    }
}

// =============================================================================
// TESTS
// =============================================================================
