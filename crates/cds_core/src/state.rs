//! Contest state folded from a stream of updates.
//!
//! [`ContestState`] is the mutable accumulator: updates are applied in
//! stream order, last write wins per run and message id, and entries keep
//! the position of their first appearance. Once the contest reaches
//! [`ContestStatus::Finalized`] the accumulator is consumed into a
//! [`FinalContestState`], which is read-only.

use crate::analytics::AnalyticsMessage;
use crate::contest::{ContestInfo, ContestStatus};
use crate::error::{CoreError, CoreResult};
use crate::id::{MessageId, RunId};
use crate::run::RunInfo;
use crate::update::ContestUpdate;
use indexmap::IndexMap;

/// Effect of an update on the tracked contest status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    /// Status did not change
    Unchanged,
    /// Status moved forward
    Advanced {
        /// Previous status
        from: ContestStatus,
        /// New status
        to: ContestStatus,
    },
    /// Info carried an earlier status; the tracked status was kept
    Ignored {
        /// Status kept
        current: ContestStatus,
        /// Status carried by the update
        requested: ContestStatus,
    },
}

/// Accumulated contest state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContestState {
    info: Option<ContestInfo>,
    status: ContestStatus,
    runs: IndexMap<RunId, RunInfo>,
    analytics: IndexMap<MessageId, AnalyticsMessage>,
    applied: u64,
}

impl ContestState {
    /// Create an empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a single update
    pub fn apply(&mut self, update: ContestUpdate) -> StatusTransition {
        self.applied += 1;
        match update {
            ContestUpdate::Info(info) => {
                let requested = info.status;
                self.info = Some(info);
                self.advance_status(requested)
            }
            ContestUpdate::Run(run) => {
                self.runs.insert(run.id.clone(), run);
                StatusTransition::Unchanged
            }
            ContestUpdate::Analytics(message) => {
                self.analytics.insert(message.id.clone(), message);
                StatusTransition::Unchanged
            }
        }
    }

    fn advance_status(&mut self, requested: ContestStatus) -> StatusTransition {
        let current = self.status;
        if requested > current {
            self.status = requested;
            StatusTransition::Advanced {
                from: current,
                to: requested,
            }
        } else if requested < current {
            StatusTransition::Ignored { current, requested }
        } else {
            StatusTransition::Unchanged
        }
    }

    /// Tracked status (never regresses)
    #[must_use]
    pub const fn status(&self) -> ContestStatus {
        self.status
    }

    /// Latest contest info
    #[must_use]
    pub const fn info(&self) -> Option<&ContestInfo> {
        self.info.as_ref()
    }

    /// Get a run by id
    #[must_use]
    pub fn run(&self, id: &RunId) -> Option<&RunInfo> {
        self.runs.get(id)
    }

    /// Get an analytics message by id
    #[must_use]
    pub fn analytics_message(&self, id: &MessageId) -> Option<&AnalyticsMessage> {
        self.analytics.get(id)
    }

    /// Number of distinct runs seen
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Number of runs without a final verdict
    #[must_use]
    pub fn unresolved_runs(&self) -> usize {
        self.runs.values().filter(|run| !run.is_final()).count()
    }

    /// Number of updates applied so far
    #[must_use]
    pub const fn applied_count(&self) -> u64 {
        self.applied
    }

    /// Check if the contest reached its terminal status
    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        self.status.is_terminal()
    }

    /// Freeze the state for replay
    ///
    /// # Errors
    ///
    /// Returns error if the contest is not finalized yet
    pub fn finalize(self) -> CoreResult<FinalContestState> {
        if !self.is_finalized() {
            return Err(CoreError::NotFinalized {
                status: self.status,
            });
        }
        let info = self.info.ok_or(CoreError::MissingInfo)?;

        Ok(FinalContestState {
            info,
            runs: self.runs.into_values().collect(),
            analytics: self.analytics.into_values().collect(),
        })
    }
}

/// Immutable snapshot of a finalized contest
#[derive(Debug, Clone, PartialEq)]
pub struct FinalContestState {
    info: ContestInfo,
    runs: Vec<RunInfo>,
    analytics: Vec<AnalyticsMessage>,
}

impl FinalContestState {
    /// Final contest info
    #[must_use]
    pub const fn info(&self) -> &ContestInfo {
        &self.info
    }

    /// Runs in order of first appearance
    #[must_use]
    pub fn runs(&self) -> &[RunInfo] {
        &self.runs
    }

    /// Analytics messages in order of first appearance
    #[must_use]
    pub fn analytics(&self) -> &[AnalyticsMessage] {
        &self.analytics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::{RunResult, Verdict};
    use std::time::Duration;

    fn info(status: ContestStatus) -> ContestUpdate {
        ContestInfo::new("Test", status, Duration::from_secs(300)).into()
    }

    fn run(id: &str, result: RunResult) -> ContestUpdate {
        RunInfo::new(id, "t1", "A", Duration::from_secs(10), result).into()
    }

    fn accepted() -> RunResult {
        RunResult::final_verdict(Verdict::accepted())
    }

    fn judging() -> RunResult {
        RunResult::InProgress { percentage: 0.3 }
    }

    #[test]
    fn test_unresolved_count() {
        let mut state = ContestState::new();
        state.apply(info(ContestStatus::Over));
        state.apply(run("1", accepted()));
        state.apply(run("2", judging()));
        state.apply(run("3", accepted()));
        state.apply(run("4", judging()));
        state.apply(run("5", accepted()));

        assert_eq!(state.run_count(), 5);
        assert_eq!(state.unresolved_runs(), 2);
        assert_eq!(state.applied_count(), 6);
    }

    #[test]
    fn test_last_write_wins_keeps_position() {
        let mut state = ContestState::new();
        state.apply(run("a", judging()));
        state.apply(run("b", judging()));
        state.apply(run("a", accepted()));
        state.apply(info(ContestStatus::Finalized));

        let final_state = state.finalize().unwrap();
        let ids: Vec<_> = final_state.runs().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(final_state.runs()[0].is_final());
    }

    #[test]
    fn test_status_never_regresses() {
        let mut state = ContestState::new();
        assert_eq!(
            state.apply(info(ContestStatus::Over)),
            StatusTransition::Advanced {
                from: ContestStatus::Before,
                to: ContestStatus::Over,
            }
        );
        assert_eq!(
            state.apply(info(ContestStatus::Running)),
            StatusTransition::Ignored {
                current: ContestStatus::Over,
                requested: ContestStatus::Running,
            }
        );
        assert_eq!(state.status(), ContestStatus::Over);
        assert_eq!(state.apply(info(ContestStatus::Over)), StatusTransition::Unchanged);
    }

    #[test]
    fn test_finalize_requires_terminal_status() {
        let mut state = ContestState::new();
        state.apply(info(ContestStatus::Over));
        let err = state.finalize().unwrap_err();
        assert_eq!(
            err,
            CoreError::NotFinalized {
                status: ContestStatus::Over
            }
        );
    }

    #[test]
    fn test_finalize_keeps_analytics_and_info() {
        let mut state = ContestState::new();
        state.apply(AnalyticsMessage::new("m1", Duration::from_secs(5), "hello").into());
        state.apply(AnalyticsMessage::new("m1", Duration::from_secs(6), "edited").into());
        state.apply(info(ContestStatus::Finalized));

        let final_state = state.finalize().unwrap();
        assert_eq!(final_state.analytics().len(), 1);
        assert_eq!(final_state.analytics()[0].message, "edited");
        assert_eq!(final_state.info().status, ContestStatus::Finalized);
    }

    fn status_from_index(index: u8) -> ContestStatus {
        match index % 4 {
            0 => ContestStatus::Before,
            1 => ContestStatus::Running,
            2 => ContestStatus::Over,
            _ => ContestStatus::Finalized,
        }
    }

    proptest::proptest! {
        #[test]
        fn prop_status_is_running_max(indices in proptest::collection::vec(0u8..4, 0..32)) {
            let mut state = ContestState::new();
            let mut expected = ContestStatus::Before;
            for index in indices {
                let status = status_from_index(index);
                let previous = state.status();
                state.apply(info(status));
                expected = expected.max(status);
                proptest::prop_assert!(state.status() >= previous);
                proptest::prop_assert_eq!(state.status(), expected);
            }
        }
    }
}
