//! Progress reporting side channel.

use cds_core::ContestStatus;
use std::time::Duration;
use tracing::info;

/// Snapshot reported while waiting for finalization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaitProgress {
    /// Tracked contest status
    pub status: ContestStatus,
    /// Runs without a final verdict
    pub unresolved: usize,
}

/// Receives throttled progress reports
pub trait ProgressObserver: Send + Sync {
    /// Called once per wait report interval until finalization
    fn waiting_for_finalization(&self, progress: WaitProgress);

    /// Called when replay passes another report interval of simulated time
    fn replay_advanced(&self, simulated: Duration);
}

/// Observer that writes reports to the `tracing` log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn waiting_for_finalization(&self, progress: WaitProgress) {
        info!(
            status = %progress.status,
            unresolved = progress.unresolved,
            "waiting for finalization: status={}, unresolved={}",
            progress.status,
            progress.unresolved
        );
    }

    fn replay_advanced(&self, simulated: Duration) {
        info!(
            simulated_ms = u64::try_from(simulated.as_millis()).unwrap_or(u64::MAX),
            "replay advanced to simulated time {:?}",
            simulated
        );
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Observer that records every report
    #[derive(Debug, Default)]
    pub(crate) struct RecordingObserver {
        waits: Mutex<Vec<WaitProgress>>,
        replays: Mutex<Vec<Duration>>,
    }

    impl RecordingObserver {
        pub(crate) fn waits(&self) -> Vec<WaitProgress> {
            self.waits.lock().unwrap().clone()
        }

        pub(crate) fn replays(&self) -> Vec<Duration> {
            self.replays.lock().unwrap().clone()
        }
    }

    impl ProgressObserver for RecordingObserver {
        fn waiting_for_finalization(&self, progress: WaitProgress) {
            self.waits.lock().unwrap().push(progress);
        }

        fn replay_advanced(&self, simulated: Duration) {
            self.replays.lock().unwrap().push(simulated);
        }
    }
}
