//! Folding the update stream until the contest is finalized.
//!
//! The fold owns the mutable [`ContestState`]. The only value shared with
//! the reporter task is the latest [`WaitProgress`], held in a single-slot
//! `watch` cell: writes overwrite, the reporter reads whatever is current.

use crate::config::DEFAULT_WAIT_REPORT_INTERVAL;
use crate::error::{EmulationError, EmulationResult};
use crate::observer::{ProgressObserver, TracingObserver, WaitProgress};
use cds_core::{ContestState, ContestUpdate, FinalContestState, StatusTransition};
use futures::{Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Folds contest updates into a finalized state
pub struct StateAggregator {
    observer: Arc<dyn ProgressObserver>,
    report_interval: Duration,
    cancel: CancellationToken,
}

impl StateAggregator {
    /// Create an aggregator that logs progress via `tracing`
    #[must_use]
    pub fn new() -> Self {
        Self {
            observer: Arc::new(TracingObserver),
            report_interval: DEFAULT_WAIT_REPORT_INTERVAL,
            cancel: CancellationToken::new(),
        }
    }

    /// Use a different progress observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Real time between waiting reports
    #[must_use]
    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    /// Stop waiting when `cancel` fires
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Consume updates until the contest is finalized
    ///
    /// Reports [`WaitProgress`] once per report interval while waiting.
    /// Reporting has stopped for good by the time this returns.
    ///
    /// # Errors
    ///
    /// Returns [`EmulationError::StreamEnded`] if the stream ends first,
    /// or [`EmulationError::Cancelled`] on cancellation
    pub async fn aggregate<S>(&self, updates: S) -> EmulationResult<FinalContestState>
    where
        S: Stream<Item = ContestUpdate>,
    {
        let (progress_tx, progress_rx) = watch::channel(WaitProgress::default());
        let stop = self.cancel.child_token();
        let reporter = tokio::spawn(report_wait_progress(
            progress_rx,
            Arc::clone(&self.observer),
            self.report_interval,
            stop.clone(),
        ));

        // Stops the reporter even if this future is dropped mid-fold
        let guard = stop.drop_guard();
        let result = self.fold(updates, &progress_tx).await;
        drop(guard);

        if let Err(err) = reporter.await {
            warn!(%err, "wait progress reporter failed");
        }
        result
    }

    async fn fold<S>(
        &self,
        updates: S,
        progress: &watch::Sender<WaitProgress>,
    ) -> EmulationResult<FinalContestState>
    where
        S: Stream<Item = ContestUpdate>,
    {
        let mut updates = std::pin::pin!(updates);
        let mut state = ContestState::new();

        loop {
            let next = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(EmulationError::Cancelled),
                next = updates.next() => next,
            };
            let Some(update) = next else {
                return Err(EmulationError::StreamEnded {
                    status: state.status(),
                    runs: state.run_count(),
                });
            };

            match state.apply(update) {
                StatusTransition::Advanced { from, to } => {
                    info!(%from, %to, "contest status advanced");
                }
                StatusTransition::Ignored { current, requested } => {
                    warn!(%current, %requested, "ignoring contest status regression");
                }
                StatusTransition::Unchanged => {}
            }

            if state.is_finalized() {
                info!(
                    updates = state.applied_count(),
                    runs = state.run_count(),
                    "contest finalized"
                );
                return Ok(state.finalize()?);
            }

            progress.send_replace(WaitProgress {
                status: state.status(),
                unresolved: state.unresolved_runs(),
            });
        }
    }
}

impl Default for StateAggregator {
    fn default() -> Self {
        Self::new()
    }
}

async fn report_wait_progress(
    progress: watch::Receiver<WaitProgress>,
    observer: Arc<dyn ProgressObserver>,
    interval: Duration,
    stop: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = stop.cancelled() => break,
            _ = ticker.tick() => {
                let current = *progress.borrow();
                observer.waiting_for_finalization(current);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::testing::RecordingObserver;
    use cds_core::{ContestInfo, ContestStatus, RunInfo, RunResult, Verdict};
    use futures::stream;

    fn info(status: ContestStatus) -> ContestUpdate {
        ContestInfo::new("Test", status, Duration::from_secs(300)).into()
    }

    fn run(id: &str, is_final: bool) -> ContestUpdate {
        let result = if is_final {
            RunResult::final_verdict(Verdict::accepted())
        } else {
            RunResult::InProgress { percentage: 0.2 }
        };
        RunInfo::new(id, "t1", "A", Duration::from_secs(1), result).into()
    }

    fn aggregator(observer: Arc<RecordingObserver>) -> StateAggregator {
        StateAggregator::new().with_observer(observer)
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_final_state() {
        let observer = Arc::new(RecordingObserver::default());
        let updates = stream::iter(vec![
            info(ContestStatus::Running),
            run("1", false),
            run("1", true),
            info(ContestStatus::Finalized),
            run("late", true),
        ]);

        let state = aggregator(observer.clone()).aggregate(updates).await.unwrap();
        assert_eq!(state.runs().len(), 1);
        assert!(state.runs()[0].is_final());
        assert_eq!(state.info().status, ContestStatus::Finalized);
        assert!(observer.waits().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_end_before_finalization_is_error() {
        let updates = stream::iter(vec![info(ContestStatus::Over), run("1", true)]);
        let err = aggregator(Arc::new(RecordingObserver::default()))
            .aggregate(updates)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EmulationError::StreamEnded {
                status: ContestStatus::Over,
                runs: 1,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_unresolved_runs_while_waiting() {
        let observer = Arc::new(RecordingObserver::default());
        let updates = stream::iter(vec![
            info(ContestStatus::Over),
            run("1", true),
            run("2", false),
            run("3", true),
            run("4", false),
            run("5", true),
        ])
        .chain(stream::pending());

        let agg = aggregator(observer.clone());
        let result = tokio::time::timeout(Duration::from_millis(2500), agg.aggregate(updates)).await;
        assert!(result.is_err());

        let waits = observer.waits();
        assert_eq!(waits.len(), 2);
        assert!(waits.iter().all(|w| *w
            == WaitProgress {
                status: ContestStatus::Over,
                unresolved: 2,
            }));

        // Dropping the aggregation future stops the reporter
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(observer.waits().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reporting_stops_at_finalization() {
        let observer = Arc::new(RecordingObserver::default());
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let updates = tokio_stream_from(rx);

        tx.send(info(ContestStatus::Running)).unwrap();
        tx.send(run("1", false)).unwrap();

        let agg = aggregator(observer.clone());
        let feeder = async move {
            tokio::time::sleep(Duration::from_millis(3500)).await;
            tx.send(info(ContestStatus::Finalized)).unwrap();
            tx
        };
        let (state, _tx) = tokio::join!(agg.aggregate(updates), feeder);
        let state = state.unwrap();
        assert_eq!(state.runs().len(), 1);

        let reported = observer.waits().len();
        assert_eq!(reported, 3);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(observer.waits().len(), reported);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_while_waiting() {
        let cancel = CancellationToken::new();
        let agg = aggregator(Arc::new(RecordingObserver::default()))
            .with_cancellation(cancel.clone());

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            canceller.cancel();
        });

        let err = agg
            .aggregate(stream::pending::<ContestUpdate>())
            .await
            .unwrap_err();
        assert_eq!(err, EmulationError::Cancelled);
    }

    fn tokio_stream_from(
        mut rx: tokio::sync::mpsc::UnboundedReceiver<ContestUpdate>,
    ) -> impl Stream<Item = ContestUpdate> {
        stream::poll_fn(move |cx| rx.poll_recv(cx))
    }
}
