//! End-to-end emulation: aggregate, synthesize, pace.

use crate::aggregate::StateAggregator;
use crate::clock::{Clock, TokioClock};
use crate::config::EmulationConfig;
use crate::emit::TimedEmitter;
use crate::error::{EmulationError, EmulationResult};
use crate::judging::RandomProgress;
use crate::observer::{ProgressObserver, TracingObserver};
use crate::synth::EventSynthesizer;
use async_stream::stream;
use cds_core::ContestUpdate;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A configured emulation run
///
/// Configuration is validated on construction, so a bad config is rejected
/// before any update is consumed or emitted.
pub struct Emulation {
    config: EmulationConfig,
    observer: Arc<dyn ProgressObserver>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl Emulation {
    /// Create an emulation from a validated config
    ///
    /// # Errors
    ///
    /// Returns error if the config is invalid
    pub fn new(config: EmulationConfig) -> EmulationResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            observer: Arc::new(TracingObserver),
            clock: Arc::new(TokioClock::new()),
            cancel: CancellationToken::new(),
        })
    }

    /// Use a different progress observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Use a different clock for pacing
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use an external cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops this emulation when cancelled
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Config in use
    #[must_use]
    pub const fn config(&self) -> &EmulationConfig {
        &self.config
    }

    /// Replay `updates` as a live, time-paced stream
    ///
    /// Yields a single error and ends if the updates end before the contest
    /// is finalized. Cancellation ends the stream without an error.
    pub fn run<S>(self, updates: S) -> impl Stream<Item = EmulationResult<ContestUpdate>> + Send
    where
        S: Stream<Item = ContestUpdate> + Send + 'static,
    {
        let Self {
            config,
            observer,
            clock,
            cancel,
        } = self;

        stream! {
            let aggregator = StateAggregator::new()
                .with_observer(Arc::clone(&observer))
                .with_report_interval(config.wait_report_interval)
                .with_cancellation(cancel.clone());

            let state = match aggregator.aggregate(updates).await {
                Ok(state) => state,
                Err(EmulationError::Cancelled) => {
                    info!("emulation cancelled before finalization");
                    return;
                }
                Err(err) => {
                    yield Err(err);
                    return;
                }
            };

            info!(
                speed = config.emulation_speed,
                start_time = %config.start_time,
                "running in emulation mode"
            );

            let mut synthesizer = EventSynthesizer::new(RandomProgress::from_seed_option(config.seed))
                .with_max_progress_steps(config.max_progress_steps);
            let events = synthesizer.synthesize(&state, config.start_time, config.emulation_speed);

            let schedule = match TimedEmitter::schedule(events, config.start_time, config.emulation_speed) {
                Ok(schedule) => schedule,
                Err(err) => {
                    yield Err(err);
                    return;
                }
            };

            let paced = TimedEmitter::new()
                .with_clock(clock)
                .with_observer(observer)
                .with_report_interval(config.replay_report_interval)
                .emit(schedule, cancel);

            for await update in paced {
                yield Ok(update);
            }
        }
    }
}

/// Emulation entry point on any update stream
pub trait EmulationStreamExt: Stream<Item = ContestUpdate> + Sized + Send + 'static {
    /// Replay this stream as a live contest
    ///
    /// # Errors
    ///
    /// Returns error if the config is invalid
    fn emulate(
        self,
        config: EmulationConfig,
    ) -> EmulationResult<BoxStream<'static, EmulationResult<ContestUpdate>>> {
        Ok(Emulation::new(config)?.run(self).boxed())
    }
}

impl<S> EmulationStreamExt for S where S: Stream<Item = ContestUpdate> + Send + 'static {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::testing::RecordingObserver;
    use cds_core::{
        AnalyticsMessage, ContestInfo, ContestStatus, RunInfo, RunResult, Verdict,
    };
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use futures::stream;
    use std::time::Duration;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 18, 9, 0, 0).unwrap()
    }

    fn finished_contest() -> Vec<ContestUpdate> {
        vec![
            ContestInfo::new("Test", ContestStatus::Running, Duration::from_millis(2000)).into(),
            RunInfo::new(
                "r1",
                "t1",
                "A",
                Duration::from_millis(100),
                RunResult::final_verdict(Verdict::accepted()),
            )
            .into(),
            AnalyticsMessage::new("m1", Duration::from_millis(500), "First solve").into(),
            ContestInfo::new("Test", ContestStatus::Finalized, Duration::from_millis(2000)).into(),
        ]
    }

    fn status_of(update: &ContestUpdate) -> Option<ContestStatus> {
        match update {
            ContestUpdate::Info(info) => Some(info.status),
            _ => None,
        }
    }

    #[test]
    fn test_invalid_speed_rejected_up_front() {
        let result = Emulation::new(EmulationConfig::new(t0(), 0.0));
        assert!(matches!(result, Err(EmulationError::InvalidConfig { .. })));

        let result = stream::iter(finished_contest()).emulate(EmulationConfig::new(t0(), -1.0));
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_at_speed_ten() {
        let clock = Arc::new(crate::clock::TokioClock::anchored_at(t0()));
        let emulation = Emulation::new(EmulationConfig::new(t0(), 10.0).with_seed(1))
            .unwrap()
            .with_clock(clock.clone())
            .with_observer(Arc::new(RecordingObserver::default()));

        let stream = emulation.run(stream::iter(finished_contest()));
        let mut stream = std::pin::pin!(stream);

        let mut delivered = Vec::new();
        while let Some(update) = stream.next().await {
            delivered.push((update.unwrap(), clock.now()));
        }

        let deadline = t0() + TimeDelta::milliseconds(200);
        let (first, first_at) = &delivered[0];
        assert_eq!(status_of(first), Some(ContestStatus::Before));
        assert!(*first_at < deadline);

        let running_at = delivered
            .iter()
            .find(|(u, _)| status_of(u) == Some(ContestStatus::Running))
            .map(|(_, at)| *at)
            .unwrap();
        assert_eq!(running_at, t0());

        let over_at = delivered
            .iter()
            .find(|(u, _)| status_of(u) == Some(ContestStatus::Over))
            .map(|(_, at)| *at)
            .unwrap();
        assert!(over_at >= deadline);

        let ContestUpdate::Info(before) = first else {
            panic!("expected info update");
        };
        assert_eq!(before.start_time, Some(t0()));
        assert_eq!(before.emulation_speed, 10.0);

        // The judged run ends with its original verdict
        let last_run = delivered
            .iter()
            .filter_map(|(u, _)| match u {
                ContestUpdate::Run(run) => Some(run.clone()),
                _ => None,
            })
            .last()
            .unwrap();
        assert!(last_run.is_final());
        assert!(delivered.iter().any(|(u, _)| matches!(u, ContestUpdate::Analytics(_))));

        for pair in delivered.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_premature_end_yields_single_error() {
        let mut updates = finished_contest();
        updates.pop();
        let emulation = Emulation::new(EmulationConfig::new(t0(), 1.0))
            .unwrap()
            .with_observer(Arc::new(RecordingObserver::default()));

        let items: Vec<_> = emulation.run(stream::iter(updates)).collect().await;
        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0],
            Err(EmulationError::StreamEnded {
                status: ContestStatus::Running,
                runs: 1,
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_finalization_ends_cleanly() {
        let observer = Arc::new(RecordingObserver::default());
        let emulation = Emulation::new(EmulationConfig::new(t0(), 1.0))
            .unwrap()
            .with_observer(observer.clone());
        let cancel = emulation.cancellation_token();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            cancel.cancel();
        });

        let items: Vec<_> = emulation
            .run(stream::iter(finished_contest()).take(2).chain(stream::pending()))
            .collect()
            .await;
        assert!(items.is_empty());
        assert_eq!(observer.waits().len(), 1);
    }
}
