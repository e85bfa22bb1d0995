//! Analytics (commentary) messages attached to a contest timeline.

use crate::id::{MessageId, RunId, TeamId};
use crate::time::duration_ms;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A commentary message positioned on the contest timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsMessage {
    /// Message ID
    pub id: MessageId,
    /// Offset from contest start
    #[serde(with = "duration_ms")]
    pub relative_time: Duration,
    /// Message text
    pub message: String,
    /// Teams the message refers to
    #[serde(default)]
    pub team_ids: Vec<TeamId>,
    /// Runs the message refers to
    #[serde(default)]
    pub run_ids: Vec<RunId>,
}

impl AnalyticsMessage {
    /// Create a message not linked to any team or run
    #[must_use]
    pub fn new(id: impl Into<MessageId>, relative_time: Duration, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            relative_time,
            message: message.into(),
            team_ids: Vec::new(),
            run_ids: Vec::new(),
        }
    }

    /// Link to a run
    #[must_use]
    pub fn with_run(mut self, run_id: impl Into<RunId>) -> Self {
        self.run_ids.push(run_id.into());
        self
    }

    /// Link to a team
    #[must_use]
    pub fn with_team(mut self, team_id: impl Into<TeamId>) -> Self {
        self.team_ids.push(team_id.into());
        self
    }
}
