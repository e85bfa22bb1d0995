//! CDS Core Types
//!
//! Pure contest data model with no I/O: contest info, runs, analytics
//! messages, the update envelope and the fold that turns a stream of
//! updates into a contest state.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analytics;
pub mod contest;
pub mod error;
pub mod id;
pub mod run;
pub mod state;
pub mod time;
pub mod update;

// Re-exports
pub use analytics::AnalyticsMessage;
pub use contest::{ContestInfo, ContestStatus, ProblemInfo, TeamInfo};
pub use error::{CoreError, CoreResult};
pub use id::{MessageId, ProblemId, RunId, TeamId};
pub use run::{RunInfo, RunResult, Verdict};
pub use state::{ContestState, FinalContestState, StatusTransition};
pub use time::EventOffset;
pub use update::ContestUpdate;
