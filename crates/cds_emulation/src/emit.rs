//! Real-time pacing of replay events.
//!
//! Every logical offset maps to the wall clock deadline
//! `start + offset / speed`. Deadlines are computed up front by
//! [`TimedEmitter::schedule`]; [`TimedEmitter::emit`] then sleeps until
//! each one and yields the payload.

use crate::clock::{Clock, TokioClock};
use crate::config::{DEFAULT_REPLAY_REPORT_INTERVAL, validate_speed};
use crate::error::{EmulationError, EmulationResult};
use crate::observer::{ProgressObserver, TracingObserver};
use crate::synth::TimedEvent;
use async_stream::stream;
use cds_core::{ContestUpdate, EventOffset};
use chrono::{DateTime, TimeDelta, Utc};
use futures::Stream;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// An update with its wall clock deadline
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent {
    /// Logical offset the deadline was computed from
    pub offset: EventOffset,
    /// When to deliver; `None` delivers without waiting
    pub deadline: Option<DateTime<Utc>>,
    /// Update to deliver
    pub payload: ContestUpdate,
}

/// Events with precomputed deadlines, in delivery order
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    start: DateTime<Utc>,
    speed: f64,
    events: Vec<ScheduledEvent>,
}

impl Schedule {
    /// Wall clock instant of contest offset zero
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Speed multiplier
    #[must_use]
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    /// Scheduled events
    #[must_use]
    pub fn events(&self) -> &[ScheduledEvent] {
        &self.events
    }

    /// Number of scheduled events
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if nothing is scheduled
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Map a deadline back to simulated contest time
    #[must_use]
    pub fn simulated_time(&self, deadline: DateTime<Utc>) -> Duration {
        simulated_time(self.start, deadline, self.speed)
    }
}

/// Scale a logical offset to wall clock time
///
/// # Errors
///
/// Returns error if the speed is invalid or the scaled offset overflows
pub fn scale_offset(offset: Duration, speed: f64) -> EmulationResult<Duration> {
    validate_speed(speed)?;
    let nanos = (offset.as_nanos() as f64 / speed).round();
    if !nanos.is_finite() || nanos >= u64::MAX as f64 {
        return Err(EmulationError::DeadlineOverflow { offset, speed });
    }
    Ok(Duration::from_nanos(nanos as u64))
}

/// Wall clock deadline of a logical offset: `start + offset / speed`
///
/// # Errors
///
/// Returns error if the speed is invalid or the deadline is not
/// representable
pub fn deadline_for(
    start: DateTime<Utc>,
    offset: Duration,
    speed: f64,
) -> EmulationResult<DateTime<Utc>> {
    let scaled = scale_offset(offset, speed)?;
    TimeDelta::from_std(scaled)
        .ok()
        .and_then(|delta| start.checked_add_signed(delta))
        .ok_or(EmulationError::DeadlineOverflow { offset, speed })
}

fn simulated_time(start: DateTime<Utc>, deadline: DateTime<Utc>, speed: f64) -> Duration {
    let elapsed = (deadline - start).to_std().unwrap_or_default();
    let nanos = (elapsed.as_nanos() as f64 * speed).round();
    if nanos >= u64::MAX as f64 {
        Duration::MAX
    } else {
        Duration::from_nanos(nanos as u64)
    }
}

/// Paces replay events against a clock
pub struct TimedEmitter {
    clock: Arc<dyn Clock>,
    observer: Arc<dyn ProgressObserver>,
    report_interval: Duration,
}

impl TimedEmitter {
    /// Create an emitter on tokio time, logging progress via `tracing`
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: Arc::new(TokioClock::new()),
            observer: Arc::new(TracingObserver),
            report_interval: DEFAULT_REPLAY_REPORT_INTERVAL,
        }
    }

    /// Use a different clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a different progress observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Minimum simulated time between progress reports
    #[must_use]
    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    /// Compute every deadline for a sorted event list
    ///
    /// # Errors
    ///
    /// Returns error if the speed is not finite and positive, or a deadline
    /// is not representable
    pub fn schedule(
        events: Vec<TimedEvent>,
        start: DateTime<Utc>,
        speed: f64,
    ) -> EmulationResult<Schedule> {
        validate_speed(speed)?;
        let events = events
            .into_iter()
            .map(|event| {
                let deadline = match event.offset {
                    EventOffset::Immediate => None,
                    EventOffset::At(offset) => Some(deadline_for(start, offset, speed)?),
                };
                Ok(ScheduledEvent {
                    offset: event.offset,
                    deadline,
                    payload: event.payload,
                })
            })
            .collect::<EmulationResult<Vec<_>>>()?;

        Ok(Schedule {
            start,
            speed,
            events,
        })
    }

    /// Deliver scheduled events at their deadlines
    ///
    /// Stops without yielding the in-flight event once `cancel` fires.
    /// Dropping the stream also stops delivery.
    pub fn emit(
        self,
        schedule: Schedule,
        cancel: CancellationToken,
    ) -> impl Stream<Item = ContestUpdate> + Send + 'static {
        let Self {
            clock,
            observer,
            report_interval,
        } = self;
        let Schedule {
            start,
            speed,
            events,
        } = schedule;

        stream! {
            let total = events.len();
            let mut last_reported: Option<Duration> = None;

            for (index, event) in events.into_iter().enumerate() {
                if cancel.is_cancelled() {
                    break;
                }

                if let Some(deadline) = event.deadline {
                    if let Ok(wait) = (deadline - clock.now()).to_std() {
                        let cancelled = tokio::select! {
                            biased;
                            () = cancel.cancelled() => true,
                            () = tokio::time::sleep(wait) => false,
                        };
                        if cancelled {
                            info!(delivered = index, total, "emulation replay cancelled");
                            break;
                        }
                    }

                    let simulated = simulated_time(start, deadline, speed);
                    let due = last_reported
                        .is_none_or(|last| simulated.saturating_sub(last) > report_interval);
                    if due {
                        observer.replay_advanced(simulated);
                        last_reported = Some(simulated);
                    }
                }

                debug!(offset = %event.offset, kind = event.payload.kind(), "emitting replay event");
                yield event.payload;
            }
        }
    }
}

impl Default for TimedEmitter {
    fn default() -> Self {
        Self::new()
    }
}
