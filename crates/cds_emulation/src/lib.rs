//! CDS Emulation Replay
//!
//! Turns the update stream of a finished contest back into a live-looking,
//! time-paced stream at an arbitrary speed.
//!
//! The pipeline runs in three one-way stages:
//! - [`StateAggregator`] folds updates until the contest is finalized,
//!   reporting progress while it waits
//! - [`EventSynthesizer`] enumerates the events to replay, adding simulated
//!   judging progress for every judged run, sorted by contest offset
//! - [`TimedEmitter`] waits for each event's wall clock deadline and
//!   yields it
//!
//! [`Emulation`] wires the stages together.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod clock;
pub mod config;
pub mod emit;
pub mod error;
pub mod judging;
pub mod observer;
pub mod pipeline;
pub mod synth;

pub use aggregate::StateAggregator;
pub use clock::{Clock, SystemClock, TokioClock};
pub use config::EmulationConfig;
pub use emit::{Schedule, ScheduledEvent, TimedEmitter};
pub use error::{EmulationError, EmulationResult};
pub use judging::{ProgressSource, RandomProgress, ScriptedProgress};
pub use observer::{ProgressObserver, TracingObserver, WaitProgress};
pub use pipeline::{Emulation, EmulationStreamExt};
pub use synth::{EventSynthesizer, TimedEvent};
