//! Score Ledger
//!
//! Cumulative score, combo streak and play time for one session.

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::game::resolver::TurnSummary;

/// Read-only copy of the ledger for reporting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Points earned this session
    pub total_score: u32,
    /// Cascade steps with a match since the last swap
    pub combo_streak: u32,
    /// Seconds of unpaused, non-resolving play
    pub elapsed_seconds: u32,
    /// Turns whose swap produced a match
    pub turns_played: u32,
    /// Longest streak seen this session
    pub best_combo: u32,
}

impl LedgerSnapshot {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

/// Session bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLedger {
    total_score: u32,
    combo_streak: u32,
    elapsed_seconds: u32,
    turns_played: u32,
    best_combo: u32,
}

impl ScoreLedger {
    /// Fresh ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// A swap is being attempted: the streak starts over.
    pub fn begin_swap(&mut self) {
        self.combo_streak = 0;
    }

    /// Fold a finished turn into the totals.
    pub fn apply_turn(&mut self, summary: &TurnSummary) {
        self.total_score = self.total_score.saturating_add(summary.score_delta);
        self.combo_streak = self.combo_streak.saturating_add(summary.cascade_steps);
        self.best_combo = self.best_combo.max(self.combo_streak);
        if summary.had_any_match {
            self.turns_played += 1;
        }
    }

    /// One second of play elapsed.
    pub fn tick(&mut self) {
        self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);
    }

    /// Zero every field.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Current total score.
    #[inline]
    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    /// Current combo streak.
    #[inline]
    pub fn combo_streak(&self) -> u32 {
        self.combo_streak
    }

    /// Seconds played.
    #[inline]
    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    /// Immutable copy for reporting.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            total_score: self.total_score,
            combo_streak: self.combo_streak,
            elapsed_seconds: self.elapsed_seconds,
            turns_played: self.turns_played,
            best_combo: self.best_combo,
        }
    }

    /// Feed the ledger into a hasher.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.total_score);
        hasher.update_u32(self.combo_streak);
        hasher.update_u32(self.turns_played);
        hasher.update_u32(self.best_combo);
    }
}
