//! Turn Resolution
//!
//! Applies one swap and runs the cascade until the board is stable:
//!
//! ```text
//! swap ─► detect ─┬─ no runs, first pass ─► revert
//!                 ├─ no runs, later pass ─► done
//!                 └─ runs ─► clear ─► drop ─► refill ─► detect ...
//! ```
//!
//! [`Cascade`] exposes every checkpoint as a [`Stage`] so a renderer can
//! animate between them. [`resolve_turn`] drives a cascade to the end in one
//! call. Neither ever waits on a clock.

use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use crate::core::rng::DeterministicRng;
use crate::game::error::EngineError;
use crate::game::grid::{Grid, Position};
use crate::game::matcher::{find_matches, positions_in, total_run_length, MatchRun};
use crate::game::token::PALETTE_SIZE;

/// Scoring and safety parameters for a cascade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeRules {
    /// Colors drawn on refill
    pub palette_size: usize,
    /// Points per cleared token
    pub points_per_token: u32,
    /// Points per pair of prior cascade steps in the current streak
    pub combo_bonus_step: u32,
    /// Hard cap on cascade steps per turn
    pub max_cascade_steps: u32,
}

impl Default for CascadeRules {
    fn default() -> Self {
        Self {
            palette_size: PALETTE_SIZE,
            points_per_token: 10,
            combo_bonus_step: 10,
            max_cascade_steps: 256,
        }
    }
}

impl CascadeRules {
    /// Combo bonus for a step entered with `combo_streak` prior steps.
    ///
    /// Only every second step raises the bonus: streak 0 and 1 pay nothing,
    /// 2 and 3 pay one step, and so on.
    #[inline]
    pub fn combo_bonus(&self, combo_streak: u32) -> u32 {
        (combo_streak / 2).saturating_mul(self.combo_bonus_step)
    }

    /// Points for one cascade step.
    #[inline]
    pub fn step_score(&self, cleared: u32, combo_streak: u32) -> u32 {
        cleared
            .saturating_mul(self.points_per_token)
            .saturating_add(self.combo_bonus(combo_streak))
    }
}

/// What happened at a checkpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageKind {
    /// The two tokens were exchanged
    Swapped {
        /// First position
        a: Position,
        /// Second position
        b: Position,
    },
    /// The swap produced nothing and was undone
    Reverted,
    /// Runs were marked Empty
    Cleared {
        /// Runs found by this step
        runs: Vec<MatchRun>,
        /// Sum of run lengths
        cleared: u32,
        /// Points for this step, bonus included
        points: u32,
        /// Bonus part of `points`
        combo_bonus: u32,
        /// Streak after this step
        combo_streak: u32,
    },
    /// Tokens fell into the gaps
    Dropped {
        /// Tokens that changed cell
        moved: u32,
    },
    /// Gaps at the top received new tokens
    Refilled {
        /// Cells that received a token, row-major
        filled: Vec<Position>,
    },
}

/// A renderer-visible checkpoint within one turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Cascade step this stage belongs to (0 for the swap itself)
    pub step: u32,
    /// What happened
    pub kind: StageKind,
    /// Board right after this stage
    pub grid: Grid,
}

/// Outcome of one turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSummary {
    /// Swapped positions
    pub swap: (Position, Position),
    /// Sum of run lengths over every step
    pub tokens_cleared: u32,
    /// Points earned this turn, bonuses included
    pub score_delta: u32,
    /// Bonus part of `score_delta`
    pub combo_bonus_applied: u32,
    /// Steps that cleared at least one run
    pub cascade_steps: u32,
    /// Every run cleared, in order
    pub runs: Vec<MatchRun>,
    /// Stable board after the turn (the pre-swap board when nothing matched)
    pub final_grid: Grid,
    /// Whether the swap produced any run
    pub had_any_match: bool,
}

impl TurnSummary {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
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

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Swap,
    Detect,
    Drop,
    Refill,
    Done,
}

/// A turn in progress.
///
/// Owns its working copy of the board; the caller's grid is untouched until
/// the summary is applied.
#[derive(Clone, Debug)]
pub struct Cascade {
    rules: CascadeRules,
    original: Grid,
    grid: Grid,
    swap: (Position, Position),
    phase: Phase,
    combo_streak: u32,
    steps: u32,
    tokens_cleared: u32,
    score_delta: u32,
    combo_bonus_applied: u32,
    runs: Vec<MatchRun>,
}

impl Cascade {
    /// Validate the swap and prepare a cascade.
    ///
    /// `combo_streak` is the streak the first step is scored with; a new
    /// swap normally starts from 0.
    pub fn begin(
        grid: &Grid,
        a: Position,
        b: Position,
        combo_streak: u32,
        rules: CascadeRules,
    ) -> Result<Self, EngineError> {
        grid.get(a)?;
        grid.get(b)?;
        if !grid.is_adjacent(a, b) {
            return Err(EngineError::InvalidSwap { a, b });
        }

        Ok(Self {
            rules,
            original: grid.clone(),
            grid: grid.clone(),
            swap: (a, b),
            phase: Phase::Swap,
            combo_streak,
            steps: 0,
            tokens_cleared: 0,
            score_delta: 0,
            combo_bonus_applied: 0,
            runs: Vec::new(),
        })
    }

    /// Run up to the next checkpoint. `None` once the board is stable.
    pub fn advance(&mut self, rng: &mut DeterministicRng) -> Option<Stage> {
        let kind = match self.phase {
            Phase::Swap => {
                let (a, b) = self.swap;
                self.grid.cells_swap(a, b);
                self.phase = Phase::Detect;
                StageKind::Swapped { a, b }
            }
            Phase::Detect => {
                let runs = find_matches(&self.grid);
                if runs.is_empty() {
                    self.phase = Phase::Done;
                    if self.steps > 0 {
                        return None;
                    }
                    self.grid = self.original.clone();
                    StageKind::Reverted
                } else if self.steps >= self.rules.max_cascade_steps {
                    warn!(
                        "Cascade cap of {} steps reached, leaving {} run(s) on the board",
                        self.rules.max_cascade_steps,
                        runs.len()
                    );
                    self.phase = Phase::Done;
                    return None;
                } else {
                    self.clear(runs)
                }
            }
            Phase::Drop => {
                let moved = self.grid.collapse() as u32;
                self.phase = Phase::Refill;
                StageKind::Dropped { moved }
            }
            Phase::Refill => {
                let filled = self.grid.refill(self.rules.palette_size, rng);
                self.phase = Phase::Detect;
                StageKind::Refilled { filled }
            }
            Phase::Done => return None,
        };

        #[cfg(feature = "debug-tracing")]
        tracing::trace!(step = self.steps, "{:?}\n{}", kind, self.grid);

        Some(Stage {
            step: self.steps,
            kind,
            grid: self.grid.clone(),
        })
    }

    fn clear(&mut self, runs: Vec<MatchRun>) -> StageKind {
        let cleared = total_run_length(&runs) as u32;
        let combo_bonus = self.rules.combo_bonus(self.combo_streak);
        let points = self.rules.step_score(cleared, self.combo_streak);

        self.grid.clear_positions(positions_in(&runs));

        self.tokens_cleared = self.tokens_cleared.saturating_add(cleared);
        self.score_delta = self.score_delta.saturating_add(points);
        self.combo_bonus_applied = self.combo_bonus_applied.saturating_add(combo_bonus);
        self.combo_streak += 1;
        self.steps += 1;
        self.runs.extend(runs.iter().cloned());
        self.phase = Phase::Drop;

        debug!(
            "Cascade step {}: {} run(s), {} token(s), {} points (bonus {})",
            self.steps,
            runs.len(),
            cleared,
            points,
            combo_bonus
        );

        StageKind::Cleared {
            runs,
            cleared,
            points,
            combo_bonus,
            combo_streak: self.combo_streak,
        }
    }

    /// Whether the cascade has reached a stable board.
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Current working board.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Swapped positions.
    pub fn swap(&self) -> (Position, Position) {
        self.swap
    }

    /// Drive to completion, discarding any remaining stages.
    pub fn finish(mut self, rng: &mut DeterministicRng) -> TurnSummary {
        while self.advance(rng).is_some() {}
        self.into_summary()
    }

    fn into_summary(self) -> TurnSummary {
        TurnSummary {
            swap: self.swap,
            tokens_cleared: self.tokens_cleared,
            score_delta: self.score_delta,
            combo_bonus_applied: self.combo_bonus_applied,
            cascade_steps: self.steps,
            runs: self.runs,
            had_any_match: self.steps > 0,
            final_grid: self.grid,
        }
    }
}

/// Resolve one full turn.
///
/// Every stage is passed to `on_stage` in order before the next one runs.
pub fn resolve_turn<F>(
    grid: &Grid,
    a: Position,
    b: Position,
    combo_streak: u32,
    rules: CascadeRules,
    rng: &mut DeterministicRng,
    mut on_stage: F,
) -> Result<TurnSummary, EngineError>
where
    F: FnMut(&Stage),
{
    let mut cascade = Cascade::begin(grid, a, b, combo_streak, rules)?;
    while let Some(stage) = cascade.advance(rng) {
        on_stage(&stage);
    }
    Ok(cascade.finish(rng))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::matcher::has_match;
    use crate::game::token::Token;
    use proptest::prelude::*;

    fn resolve(grid: &Grid, a: Position, b: Position, seed: u64) -> (TurnSummary, Vec<Stage>) {
        let mut rng = DeterministicRng::new(seed);
        let mut stages = Vec::new();
        let summary = resolve_turn(grid, a, b, 0, CascadeRules::default(), &mut rng, |s| {
            stages.push(s.clone())
        })
        .unwrap();
        (summary, stages)
    }

    fn board(rows: [&str; 8]) -> Grid {
        Grid::from_rows(&rows).unwrap()
    }

    /// Swapping 2 (B) with 10 (R) completes R R R at 0, 1, 2 and nothing else.
    fn three_run_board() -> Grid {
        board([
            "RRBOPOPO",
            "GYRBGYRB",
            "RBGYRBGY",
            "GYRBGYRB",
            "RBGYRBGY",
            "GYRBGYRB",
            "RBGYRBGY",
            "GYRBGYRB",
        ])
    }

    #[test]
    fn test_rejects_non_adjacent() {
        let grid = Grid::filled(8, Token::Blue);
        let mut rng = DeterministicRng::new(1);
        let err = resolve_turn(&grid, 0, 2, 0, CascadeRules::default(), &mut rng, |_| {});
        assert_eq!(err, Err(EngineError::InvalidSwap { a: 0, b: 2 }));

        let err = resolve_turn(&grid, 0, 9, 0, CascadeRules::default(), &mut rng, |_| {});
        assert_eq!(err, Err(EngineError::InvalidSwap { a: 0, b: 9 }));
    }

    #[test]
    fn test_rejects_out_of_bounds() {
        let grid = Grid::filled(8, Token::Blue);
        let mut rng = DeterministicRng::new(1);
        let err = resolve_turn(&grid, 63, 64, 0, CascadeRules::default(), &mut rng, |_| {});
        assert_eq!(err, Err(EngineError::OutOfBounds { position: 64, cells: 64 }));
    }

    #[test]
    fn test_no_match_reverts() {
        let grid = board([
            "RBGYRBGY",
            "GYRBGYRB",
            "RBGYRBGY",
            "GYRBGYRB",
            "RBGYRBGY",
            "GYRBGYRB",
            "RBGYRBGY",
            "GYRBGYRB",
        ]);
        let (summary, stages) = resolve(&grid, 0, 1, 7);

        assert!(!summary.had_any_match);
        assert_eq!(summary.score_delta, 0);
        assert_eq!(summary.tokens_cleared, 0);
        assert_eq!(summary.final_grid, grid);
        assert_eq!(stages.len(), 2);
        assert!(matches!(stages[0].kind, StageKind::Swapped { a: 0, b: 1 }));
        assert_eq!(stages[1].kind, StageKind::Reverted);
        assert_eq!(stages[1].grid, grid);
    }

    #[test]
    fn test_single_three_run() {
        let grid = three_run_board();
        assert!(!has_match(&grid));

        let (summary, stages) = resolve(&grid, 2, 10, 11);

        assert!(summary.had_any_match);
        let first = stages
            .iter()
            .find_map(|s| match &s.kind {
                StageKind::Cleared { runs, cleared, points, .. } => Some((runs.clone(), *cleared, *points)),
                _ => None,
            })
            .unwrap();
        assert_eq!(first.0.len(), 1);
        assert_eq!(first.0[0].positions, vec![0, 1, 2]);
        assert_eq!(first.1, 3);
        assert_eq!(first.2, 30);
        assert_eq!(summary.final_grid.count_empty(), 0);
        assert!(!has_match(&summary.final_grid));
    }

    #[test]
    fn test_score_matches_formula() {
        let mut rng = DeterministicRng::new(5);
        for _ in 0..50 {
            let grid = Grid::random(8, 6, &mut rng);
            let moves = crate::game::matcher::find_valid_moves(&grid);
            let Some(&(a, b)) = moves.first() else { continue };

            let rules = CascadeRules::default();
            let mut expected = 0;
            let mut cleared_total = 0;
            let summary = resolve_turn(&grid, a, b, 0, rules, &mut rng, |s| {
                if let StageKind::Cleared { cleared, combo_streak, .. } = &s.kind {
                    expected += cleared * 10 + ((combo_streak - 1) / 2) * 10;
                    cleared_total += cleared;
                }
            })
            .unwrap();

            assert!(summary.had_any_match);
            assert_eq!(summary.score_delta, expected);
            assert_eq!(summary.tokens_cleared, cleared_total);
            assert!(summary.score_delta > 0);
        }
    }

    #[test]
    fn test_stage_order() {
        let grid = three_run_board();
        let (_, stages) = resolve(&grid, 2, 10, 3);

        assert!(matches!(stages[0].kind, StageKind::Swapped { .. }));
        for chunk in stages[1..].chunks(3) {
            assert!(matches!(chunk[0].kind, StageKind::Cleared { .. }));
            assert!(matches!(chunk[1].kind, StageKind::Dropped { .. }));
            assert!(matches!(chunk[2].kind, StageKind::Refilled { .. }));
        }
        // Empty cells only ever appear between clear and refill
        for stage in &stages {
            match stage.kind {
                StageKind::Cleared { .. } | StageKind::Dropped { .. } => {
                    assert!(stage.grid.count_empty() > 0)
                }
                _ => assert_eq!(stage.grid.count_empty(), 0),
            }
        }
    }

    #[test]
    fn test_cascade_cap() {
        // A single-color palette makes every refill match again
        let grid = Grid::from_rows(&["RRB", "BBR", "RRB"]).unwrap();
        let rules = CascadeRules {
            palette_size: 1,
            max_cascade_steps: 5,
            ..CascadeRules::default()
        };
        let mut rng = DeterministicRng::new(1);
        let summary = resolve_turn(&grid, 2, 5, 0, rules, &mut rng, |_| {}).unwrap();

        assert_eq!(summary.cascade_steps, 5);
        assert_eq!(summary.final_grid.count_empty(), 0);
    }

    #[test]
    fn test_staged_and_direct_agree() {
        let mut rng = DeterministicRng::new(42);
        let grid = crate::game::generate::generate_playable(8, 6, &mut rng, 64);
        let (a, b) = crate::game::matcher::find_valid_moves(&grid)[0];

        let mut rng1 = DeterministicRng::new(7);
        let direct = resolve_turn(&grid, a, b, 0, CascadeRules::default(), &mut rng1, |_| {}).unwrap();

        let mut rng2 = DeterministicRng::new(7);
        let mut cascade = Cascade::begin(&grid, a, b, 0, CascadeRules::default()).unwrap();
        let mut last = None;
        while let Some(stage) = cascade.advance(&mut rng2) {
            last = Some(stage.grid);
        }
        assert!(cascade.is_finished());
        let staged = cascade.finish(&mut rng2);

        assert_eq!(direct, staged);
        assert_eq!(last, Some(staged.final_grid));
    }

    #[test]
    fn test_summary_serialization() {
        let grid = Grid::from_rows(&["RRB", "BBR", "GGY"]).unwrap();
        let mut rng = DeterministicRng::new(1);
        let summary = resolve_turn(&grid, 2, 5, 0, CascadeRules::default(), &mut rng, |_| {}).unwrap();

        let json = summary.to_json().unwrap();
        assert_eq!(TurnSummary::from_json(&json).unwrap(), summary);
        let bytes = summary.to_bytes().unwrap();
        assert_eq!(TurnSummary::from_bytes(&bytes).unwrap(), summary);
    }

    #[test]
    fn test_combo_bonus_pacing() {
        let rules = CascadeRules::default();
        assert_eq!(rules.combo_bonus(0), 0);
        assert_eq!(rules.combo_bonus(1), 0);
        assert_eq!(rules.combo_bonus(2), 10);
        assert_eq!(rules.combo_bonus(3), 10);
        assert_eq!(rules.combo_bonus(4), 20);
        assert_eq!(rules.step_score(3, 0), 30);
        assert_eq!(rules.step_score(4, 2), 50);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_any_swap_terminates_stable(seed in any::<u64>(), pos in 0usize..64, right in any::<bool>()) {
            let mut rng = DeterministicRng::new(seed);
            let grid = Grid::random(8, 4, &mut rng);
            let other = if right { pos + 1 } else { pos + 8 };
            prop_assume!(grid.is_adjacent(pos, other));

            let rules = CascadeRules { palette_size: 4, max_cascade_steps: 1000, ..CascadeRules::default() };
            let summary = resolve_turn(&grid, pos, other, 0, rules, &mut rng, |_| {}).unwrap();

            prop_assert_eq!(summary.final_grid.len(), 64);
            prop_assert_eq!(summary.final_grid.count_empty(), 0);
            prop_assert!(summary.final_grid.is_filled_from(4));
            prop_assert!(summary.cascade_steps < 1000);
            prop_assert!(!has_match(&summary.final_grid));
            if summary.had_any_match {
                prop_assert!(summary.score_delta > 0);
            } else {
                prop_assert_eq!(summary.score_delta, 0);
                prop_assert_eq!(&summary.final_grid, &grid);
            }
        }
    }
}
