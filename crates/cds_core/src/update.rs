//! Update envelope emitted by contest data sources.

use crate::analytics::AnalyticsMessage;
use crate::contest::ContestInfo;
use crate::error::CoreResult;
use crate::run::RunInfo;
use serde::{Deserialize, Serialize};

/// A single change to the contest state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ContestUpdate {
    /// New contest info
    Info(ContestInfo),
    /// New or changed run
    Run(RunInfo),
    /// New or changed analytics message
    Analytics(AnalyticsMessage),
}

impl ContestUpdate {
    /// Short name of the update kind, for logging
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Info(_) => "info",
            Self::Run(_) => "run",
            Self::Analytics(_) => "analytics",
        }
    }

    /// Parse one JSON-encoded update
    ///
    /// # Errors
    ///
    /// Returns error if the input is not a valid update
    pub fn from_json(input: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Encode as a single line of JSON
    ///
    /// # Errors
    ///
    /// Returns error if encoding fails
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<ContestInfo> for ContestUpdate {
    fn from(value: ContestInfo) -> Self {
        Self::Info(value)
    }
}

impl From<RunInfo> for ContestUpdate {
    fn from(value: RunInfo) -> Self {
        Self::Run(value)
    }
}

impl From<AnalyticsMessage> for ContestUpdate {
    fn from(value: AnalyticsMessage) -> Self {
        Self::Analytics(value)
    }
}
