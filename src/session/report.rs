//! Score Reporting
//!
//! Turns scoring outcomes into reports for an external sink (a chain relay,
//! a leaderboard). Submission is fire-and-forget: a failed report is marked
//! `Failed` in the history and logged, nothing more.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tracing::{info, warn};

use crate::game::ledger::LedgerSnapshot;
use crate::game::resolver::TurnSummary;
use crate::session::observer::TurnObserver;

/// Reports kept in the history.
pub const REPORT_HISTORY_LEN: usize = 10;

/// Delivery state of a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    /// Created, not yet handed to the sink
    Pending,
    /// Accepted by the sink
    Submitted,
    /// Rejected by the sink
    Failed,
}

/// One score report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Report id
    pub id: uuid::Uuid,
    /// Running session score after the turn
    pub total_score: u32,
    /// Tokens cleared by the turn
    pub matched_count: u32,
    /// Combo bonus earned by the turn
    pub combo_bonus: u32,
    /// Millisecond timestamp, unique per report
    pub nonce: i64,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Delivery state
    pub status: ReportStatus,
}

impl ScoreReport {
    /// Build a pending report.
    pub fn new(total_score: u32, matched_count: u32, combo_bonus: u32) -> Self {
        let timestamp = Utc::now();
        Self {
            id: uuid::Uuid::new_v4(),
            total_score,
            matched_count,
            combo_bonus,
            nonce: timestamp.timestamp_millis(),
            timestamp,
            status: ReportStatus::Pending,
        }
    }

    /// Message a sink signs or posts.
    pub fn message(&self) -> String {
        format!(
            "Score: {} | Matches: {} | Combo: {} | Nonce: {}",
            self.total_score, self.matched_count, self.combo_bonus, self.nonce
        )
    }
}

/// Sink rejected a report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("report rejected: {0}")]
pub struct ReportError(pub String);

/// Destination for score reports.
pub trait ReportSink {
    /// Deliver one report.
    fn submit(&mut self, report: &ScoreReport) -> Result<(), ReportError>;
}

/// Sink that only logs the report message.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn submit(&mut self, report: &ScoreReport) -> Result<(), ReportError> {
        info!("Score report ready: {}", report.message());
        Ok(())
    }
}

/// Shared view of the most recent reports, newest first.
#[derive(Debug, Clone, Default)]
pub struct ReportHistory(Arc<Mutex<VecDeque<ScoreReport>>>);

impl ReportHistory {
    /// Copy of the stored reports, newest first.
    pub fn recent(&self) -> Vec<ScoreReport> {
        match self.0.lock() {
            Ok(reports) => reports.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    fn push(&self, report: ScoreReport) {
        let mut reports = match self.0.lock() {
            Ok(reports) => reports,
            Err(poisoned) => poisoned.into_inner(),
        };
        reports.push_front(report);
        reports.truncate(REPORT_HISTORY_LEN);
    }
}

/// Observer that reports every scoring turn to a sink.
pub struct ReportLog<S: ReportSink> {
    sink: S,
    history: ReportHistory,
}

impl<S: ReportSink> ReportLog<S> {
    /// Report into `sink`.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            history: ReportHistory::default(),
        }
    }

    /// Handle on the report history; stays valid after the log is boxed.
    pub fn history(&self) -> ReportHistory {
        self.history.clone()
    }

    fn submit(&mut self, mut report: ScoreReport) {
        report.status = match self.sink.submit(&report) {
            Ok(()) => ReportStatus::Submitted,
            Err(e) => {
                warn!("Score report {} failed: {}", report.id, e);
                ReportStatus::Failed
            }
        };
        self.history.push(report);
    }
}

impl<S: ReportSink> TurnObserver for ReportLog<S> {
    fn on_turn(&mut self, summary: &TurnSummary, ledger: &LedgerSnapshot) {
        if !summary.had_any_match {
            return;
        }
        let report = ScoreReport::new(
            ledger.total_score,
            summary.tokens_cleared,
            summary.combo_bonus_applied,
        );
        self.submit(report);
    }

    fn on_session_end(&mut self, final_report: &FinalReport) {
        if final_report.total_score == 0 {
            return;
        }
        let report = ScoreReport::new(
            final_report.total_score,
            final_report.matched_count,
            final_report.combo_streak,
        );
        self.submit(report);
    }
}

/// Summary handed out when the player leaves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalReport {
    /// Session id
    pub session_id: uuid::Uuid,
    /// Key the best score is stored under
    pub player_key: String,
    /// Final score
    pub total_score: u32,
    /// Approximate tokens matched (`total_score / points_per_token`)
    pub matched_count: u32,
    /// Combo streak at exit
    pub combo_streak: u32,
    /// Seconds played
    pub elapsed_seconds: u32,
    /// Best score after this session
    pub best_score: u32,
    /// Whether this session set the best score
    pub new_best: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::grid::Grid;

    struct FlakySink {
        fail_every: u32,
        calls: u32,
    }

    impl ReportSink for FlakySink {
        fn submit(&mut self, _report: &ScoreReport) -> Result<(), ReportError> {
            self.calls += 1;
            if self.calls % self.fail_every == 0 {
                Err(ReportError("relay unavailable".into()))
            } else {
                Ok(())
            }
        }
    }

    fn scoring_turn(score_delta: u32) -> TurnSummary {
        TurnSummary {
            swap: (0, 1),
            tokens_cleared: score_delta / 10,
            score_delta,
            combo_bonus_applied: 0,
            cascade_steps: 1,
            runs: Vec::new(),
            final_grid: Grid::empty(3),
            had_any_match: true,
        }
    }

    #[test]
    fn test_message_format() {
        let report = ScoreReport::new(120, 9, 10);
        assert_eq!(
            report.message(),
            format!("Score: 120 | Matches: 9 | Combo: 10 | Nonce: {}", report.nonce)
        );
        assert_eq!(report.status, ReportStatus::Pending);
    }

    #[test]
    fn test_failures_are_recorded_not_raised() {
        let mut log = ReportLog::new(FlakySink { fail_every: 2, calls: 0 });
        let history = log.history();

        let ledger = LedgerSnapshot { total_score: 30, ..LedgerSnapshot::default() };
        log.on_turn(&scoring_turn(30), &ledger);
        log.on_turn(&scoring_turn(30), &ledger);

        let recent = history.recent();
        assert_eq!(recent.len(), 2);
        // Newest first
        assert_eq!(recent[0].status, ReportStatus::Failed);
        assert_eq!(recent[1].status, ReportStatus::Submitted);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut log = ReportLog::new(LogSink);
        let history = log.history();
        for i in 1..=15 {
            let ledger = LedgerSnapshot { total_score: i * 30, ..LedgerSnapshot::default() };
            log.on_turn(&scoring_turn(30), &ledger);
        }
        let recent = history.recent();
        assert_eq!(recent.len(), REPORT_HISTORY_LEN);
        assert_eq!(recent[0].total_score, 450);
    }

    #[test]
    fn test_no_match_turn_not_reported() {
        let mut log = ReportLog::new(LogSink);
        let mut turn = scoring_turn(0);
        turn.had_any_match = false;
        log.on_turn(&turn, &LedgerSnapshot::default());
        assert!(log.history().recent().is_empty());
    }
}
