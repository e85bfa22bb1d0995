//! Submissions and their judging results.

use crate::error::{CoreError, CoreResult};
use crate::id::{ProblemId, RunId, TeamId};
use crate::time::duration_ms;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Judge verdict for a fully judged run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Verdict {
    /// Short verdict code, e.g. `AC` or `WA`
    pub short_name: String,
    /// Counts as a solve
    pub is_accepted: bool,
    /// Adds a penalty attempt
    pub is_added_to_penalty: bool,
}

impl Verdict {
    /// Accepted
    #[must_use]
    pub fn accepted() -> Self {
        Self {
            short_name: "AC".to_string(),
            is_accepted: true,
            is_added_to_penalty: false,
        }
    }

    /// Wrong answer
    #[must_use]
    pub fn wrong_answer() -> Self {
        Self {
            short_name: "WA".to_string(),
            is_accepted: false,
            is_added_to_penalty: true,
        }
    }
}

/// Judging state of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", try_from = "RunResultRepr")]
pub enum RunResult {
    /// Still being judged
    InProgress {
        /// Judged fraction in `0.0..=1.0`
        percentage: f64,
    },
    /// Judging complete
    Final {
        /// Judge verdict
        verdict: Verdict,
    },
}

/// Wire form of [`RunResult`], checked before use
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RunResultRepr {
    InProgress { percentage: f64 },
    Final { verdict: Verdict },
}

impl TryFrom<RunResultRepr> for RunResult {
    type Error = CoreError;

    fn try_from(repr: RunResultRepr) -> CoreResult<Self> {
        match repr {
            RunResultRepr::InProgress { percentage } => Self::in_progress(percentage),
            RunResultRepr::Final { verdict } => Ok(Self::final_verdict(verdict)),
        }
    }
}

impl RunResult {
    /// In-progress result, validating the fraction
    ///
    /// # Errors
    ///
    /// Returns error if `percentage` is not within `0.0..=1.0`
    pub fn in_progress(percentage: f64) -> CoreResult<Self> {
        if !(0.0..=1.0).contains(&percentage) {
            return Err(CoreError::InvalidPercentage { value: percentage });
        }
        Ok(Self::InProgress { percentage })
    }

    /// Final result with the given verdict
    #[must_use]
    pub fn final_verdict(verdict: Verdict) -> Self {
        Self::Final { verdict }
    }

    /// Check if judging is complete
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Final { .. })
    }

    /// Judged fraction, if still in progress
    #[must_use]
    pub const fn percentage(&self) -> Option<f64> {
        match self {
            Self::InProgress { percentage } => Some(*percentage),
            Self::Final { .. } => None,
        }
    }
}

/// A single submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    /// Run ID
    pub id: RunId,
    /// Submitting team
    pub team_id: TeamId,
    /// Target problem
    pub problem_id: ProblemId,
    /// Submission offset from contest start
    #[serde(with = "duration_ms")]
    pub time: Duration,
    /// Judging state
    pub result: RunResult,
}

impl RunInfo {
    /// Create a new run
    #[must_use]
    pub fn new(
        id: impl Into<RunId>,
        team_id: impl Into<TeamId>,
        problem_id: impl Into<ProblemId>,
        time: Duration,
        result: RunResult,
    ) -> Self {
        Self {
            id: id.into(),
            team_id: team_id.into(),
            problem_id: problem_id.into(),
            time,
            result,
        }
    }

    /// Copy with a different result
    #[must_use]
    pub fn with_result(&self, result: RunResult) -> Self {
        Self {
            result,
            ..self.clone()
        }
    }

    /// Check if judging is complete
    #[must_use]
    pub const fn is_final(&self) -> bool {
        self.result.is_final()
    }
}
