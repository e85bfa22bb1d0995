//! Enumeration of the events an emulated contest replays.
//!
//! Besides the original runs and analytics messages, the synthesizer emits
//! the contest phase transitions and, for every judged run, a sequence of
//! in-progress snapshots so consumers see judging happen gradually.

use crate::config::DEFAULT_MAX_PROGRESS_STEPS;
use crate::judging::{INITIAL_FRACTION_LIMIT, ProgressSource};
use cds_core::{ContestStatus, ContestUpdate, EventOffset, FinalContestState, RunInfo, RunResult};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, warn};

/// Smallest fraction increment applied per progress step
pub const MIN_FRACTION_STEP: f64 = 1e-3;

/// Smallest time jitter applied per progress step
pub const MIN_JITTER: Duration = Duration::from_millis(1);

/// An update positioned on the contest timeline
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent {
    /// Logical offset from contest start
    pub offset: EventOffset,
    /// Update to deliver
    pub payload: ContestUpdate,
}

impl TimedEvent {
    /// Create a timed event
    #[must_use]
    pub fn new(offset: impl Into<EventOffset>, payload: impl Into<ContestUpdate>) -> Self {
        Self {
            offset: offset.into(),
            payload: payload.into(),
        }
    }
}

/// Builds the sorted replay event list for a finalized contest
pub struct EventSynthesizer<P> {
    source: P,
    max_progress_steps: usize,
}

impl<P: ProgressSource> EventSynthesizer<P> {
    /// Create a synthesizer drawing from `source`
    #[must_use]
    pub fn new(source: P) -> Self {
        Self {
            source,
            max_progress_steps: DEFAULT_MAX_PROGRESS_STEPS,
        }
    }

    /// Cap the number of in-progress snapshots per run (at least one)
    #[must_use]
    pub fn with_max_progress_steps(mut self, steps: usize) -> Self {
        self.max_progress_steps = steps.max(1);
        self
    }

    /// Enumerate every replay event, sorted by offset
    ///
    /// Contest info copies carry `start_time` and `speed`. Ties keep
    /// insertion order: phase transitions, then runs in their original
    /// order, then analytics messages.
    pub fn synthesize(
        &mut self,
        state: &FinalContestState,
        start_time: DateTime<Utc>,
        speed: f64,
    ) -> Vec<TimedEvent> {
        let info = state
            .info()
            .clone()
            .with_start_time(start_time)
            .with_emulation_speed(speed);

        let mut events = Vec::with_capacity(3 + state.runs().len() * 4 + state.analytics().len());
        events.push(TimedEvent::new(
            EventOffset::Immediate,
            info.with_status(ContestStatus::Before),
        ));
        events.push(TimedEvent::new(
            EventOffset::zero(),
            info.with_status(ContestStatus::Running),
        ));
        events.push(TimedEvent::new(
            info.contest_length,
            info.with_status(ContestStatus::Over),
        ));

        for run in state.runs() {
            self.push_run_events(&mut events, run);
        }

        events.extend(
            state
                .analytics()
                .iter()
                .map(|message| TimedEvent::new(message.relative_time, message.clone())),
        );

        // Vec::sort_by_key is stable
        events.sort_by_key(|event| event.offset);

        debug!(
            events = events.len(),
            runs = state.runs().len(),
            analytics = state.analytics().len(),
            "synthesized emulation events"
        );
        events
    }

    fn push_run_events(&mut self, events: &mut Vec<TimedEvent>, run: &RunInfo) {
        if !run.is_final() {
            events.push(TimedEvent::new(run.time, run.clone()));
            return;
        }

        let mut fraction = self
            .source
            .initial_fraction()
            .clamp(0.0, INITIAL_FRACTION_LIMIT);
        let mut jitter = Duration::ZERO;
        let mut steps = 0;

        loop {
            events.push(TimedEvent::new(
                run.time.saturating_add(jitter),
                run.with_result(RunResult::InProgress {
                    percentage: fraction,
                }),
            ));
            steps += 1;

            fraction += self.source.fraction_step().max(MIN_FRACTION_STEP);
            jitter = jitter.saturating_add(self.source.jitter().max(MIN_JITTER));

            if fraction >= 1.0 {
                break;
            }
            if steps >= self.max_progress_steps {
                warn!(run = %run.id, steps, "judging progress step cap reached");
                break;
            }
        }

        events.push(TimedEvent::new(run.time.saturating_add(jitter), run.clone()));
    }
}
