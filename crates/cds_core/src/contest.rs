//! Contest-level information and lifecycle status.

use crate::id::{ProblemId, TeamId};
use crate::time::{duration_ms, option_duration_ms};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Contest lifecycle status
///
/// Ordered: a contest only ever moves forward through these phases.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContestStatus {
    /// Not started yet
    #[default]
    Before,
    /// In progress
    Running,
    /// Time is up, judging may still be pending
    Over,
    /// No further changes will happen
    Finalized,
}

impl ContestStatus {
    /// Check if no further updates can follow
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finalized)
    }
}

impl std::fmt::Display for ContestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Before => "BEFORE",
            Self::Running => "RUNNING",
            Self::Over => "OVER",
            Self::Finalized => "FINALIZED",
        };
        f.write_str(name)
    }
}

/// A contest problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemInfo {
    /// Problem ID
    pub id: ProblemId,
    /// Scoreboard letter
    pub letter: String,
    /// Full problem name
    pub name: String,
}

/// A participating team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInfo {
    /// Team ID
    pub id: TeamId,
    /// Display name
    pub name: String,
}

/// Contest description as published by the contest system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestInfo {
    /// Display name
    pub name: String,
    /// Current lifecycle status
    pub status: ContestStatus,
    /// Wall clock start, if scheduled
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// Total contest duration
    #[serde(with = "duration_ms")]
    pub contest_length: Duration,
    /// Offset at which the scoreboard freezes
    #[serde(with = "option_duration_ms", default)]
    pub freeze_time: Option<Duration>,
    /// Replay speed multiplier, 1.0 for a live contest
    #[serde(default = "default_emulation_speed")]
    pub emulation_speed: f64,
    /// Problems in scoreboard order
    #[serde(default)]
    pub problems: Vec<ProblemInfo>,
    /// Participating teams
    #[serde(default)]
    pub teams: Vec<TeamInfo>,
}

const fn default_emulation_speed() -> f64 {
    1.0
}

impl ContestInfo {
    /// Create contest info with no problems or teams
    #[must_use]
    pub fn new(name: impl Into<String>, status: ContestStatus, contest_length: Duration) -> Self {
        Self {
            name: name.into(),
            status,
            start_time: None,
            contest_length,
            freeze_time: None,
            emulation_speed: default_emulation_speed(),
            problems: Vec::new(),
            teams: Vec::new(),
        }
    }

    /// Copy with a different status
    #[must_use]
    pub fn with_status(&self, status: ContestStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// Set the start time
    #[must_use]
    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// Set the emulation speed
    #[must_use]
    pub fn with_emulation_speed(mut self, speed: f64) -> Self {
        self.emulation_speed = speed;
        self
    }

    /// Set the freeze offset
    #[must_use]
    pub fn with_freeze_time(mut self, freeze_time: Duration) -> Self {
        self.freeze_time = Some(freeze_time);
        self
    }
}
