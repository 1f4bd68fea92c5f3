//! Background SLA sweep.
//!
//! A tokio task re-evaluates every active SLA on a fixed interval (60 s by
//! default), racing freely with on-demand refreshes; the tracker's optimistic
//! writes keep both sides consistent. Files are processed in batches and the
//! shutdown signal is only observed between batches, so a batch that has
//! started always completes.

use std::sync::Arc;
use std::time::Duration;

use oficio_core::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::error::SlaError;
use crate::tracker::SlaTracker;

/// Source of the current time for sweeps.
pub type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

/// The wall clock.
pub fn system_clock() -> Clock {
    Arc::new(Timestamp::now)
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Files re-evaluated.
    pub examined: usize,
    /// Files whose level rose.
    pub escalated: usize,
    /// Files whose refresh failed.
    pub failed: usize,
    /// Batches completed.
    pub batches: usize,
    /// Shutdown was requested before every batch ran.
    pub interrupted: bool,
}

/// Running totals across sweeps, returned when the sweeper stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepTotals {
    /// Sweeps that ran.
    pub sweeps: usize,
    /// Files re-evaluated across all sweeps.
    pub examined: usize,
    /// Escalations across all sweeps.
    pub escalated: usize,
    /// Failed refreshes across all sweeps.
    pub failed: usize,
}

impl SweepTotals {
    fn add(&mut self, report: &SweepReport) {
        self.sweeps += 1;
        self.examined += report.examined;
        self.escalated += report.escalated;
        self.failed += report.failed;
    }
}

/// Re-evaluate every active SLA at `now`, `batch_size` files at a time.
///
/// When `shutdown` is given it is checked before each batch after the first.
/// Individual refresh failures are counted and logged; only a failure to list
/// active files is returned as an error.
pub async fn sweep_once(
    tracker: &SlaTracker,
    now: Timestamp,
    batch_size: usize,
    mut shutdown: Option<&mut oneshot::Receiver<()>>,
) -> Result<SweepReport, SlaError> {
    let ids = tracker.active_ids()?;
    let mut report = SweepReport::default();
    for (i, batch) in ids.chunks(batch_size.max(1)).enumerate() {
        if i > 0 {
            if let Some(rx) = shutdown.as_mut() {
                if shutdown_requested(rx) {
                    report.interrupted = true;
                    break;
                }
            }
        }
        for file_id in batch {
            match tracker.refresh_with_previous(file_id, now) {
                Ok((stored, previous)) => {
                    report.examined += 1;
                    if stored.escalation_level > previous {
                        report.escalated += 1;
                    }
                }
                Err(SlaError::NotTracked { .. }) => {}
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(file_id = %file_id, error = %e, "SLA refresh failed during sweep");
                }
            }
            tokio::task::yield_now().await;
        }
        report.batches += 1;
    }
    metrics::counter!("oficio_sla_sweeps_total").increment(1);
    tracing::debug!(
        examined = report.examined,
        escalated = report.escalated,
        failed = report.failed,
        interrupted = report.interrupted,
        "SLA sweep finished"
    );
    Ok(report)
}

fn shutdown_requested(rx: &mut oneshot::Receiver<()>) -> bool {
    !matches!(rx.try_recv(), Err(oneshot::error::TryRecvError::Empty))
}

/// Handle to a running sweeper task.
pub struct SweeperHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<SweepTotals>,
}

impl SweeperHandle {
    /// Ask the sweeper to stop after its current batch and wait for it.
    pub async fn shutdown(mut self) -> SweepTotals {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        match self.handle.await {
            Ok(totals) => totals,
            Err(e) => {
                tracing::warn!(error = %e, "SLA sweeper task failed");
                SweepTotals::default()
            }
        }
    }
}

/// Periodic sweeper configuration.
pub struct SlaSweeper {
    tracker: SlaTracker,
    interval: Duration,
    batch_size: usize,
    clock: Clock,
}

impl SlaSweeper {
    /// Sweeper over `tracker` using the wall clock.
    pub fn new(tracker: SlaTracker, interval: Duration, batch_size: usize) -> Self {
        Self {
            tracker,
            interval,
            batch_size,
            clock: system_clock(),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Spawn the sweep loop on the current tokio runtime. The first sweep
    /// runs one interval after spawning.
    pub fn spawn(self) -> SweeperHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(self.run(shutdown_rx));
        SweeperHandle {
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    async fn run(self, mut shutdown: oneshot::Receiver<()>) -> SweepTotals {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Skip the immediate tick so the first sweep happens after one interval.
        ticker.tick().await;
        let mut totals = SweepTotals::default();
        tracing::info!(interval_secs = self.interval.as_secs(), "SLA sweeper started");
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }
            let now = (self.clock)();
            match sweep_once(&self.tracker, now, self.batch_size, Some(&mut shutdown)).await {
                Ok(report) => {
                    totals.add(&report);
                    if report.interrupted {
                        break;
                    }
                }
                Err(e) => tracing::warn!(error = %e, "SLA sweep could not list active files"),
            }
        }
        tracing::info!(sweeps = totals.sweeps, "SLA sweeper stopped");
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::EscalationLevel;
    use crate::store::InMemorySlaStore;
    use chrono::NaiveDate;
    use oficio_core::FileId;
    use oficio_policy::SlaPolicy;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn tracker_with(files: usize) -> SlaTracker {
        let tracker = SlaTracker::new(Arc::new(InMemorySlaStore::new()), &SlaPolicy::default());
        let intake = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        for i in 0..files {
            tracker
                .open(&format!("OF-{i:03}"), intake, 1, ts("2025-01-15T09:00:00Z"))
                .unwrap();
        }
        tracker
    }

    #[tokio::test]
    async fn sweep_escalates_every_active_file() {
        let tracker = tracker_with(5);
        let report = sweep_once(&tracker, ts("2025-01-16T21:00:00Z"), 2, None)
            .await
            .unwrap();
        assert_eq!(report.examined, 5);
        assert_eq!(report.escalated, 5);
        assert_eq!(report.batches, 3);
        assert!(!report.interrupted);

        let again = sweep_once(&tracker, ts("2025-01-16T21:30:00Z"), 2, None)
            .await
            .unwrap();
        assert_eq!(again.examined, 5);
        assert_eq!(again.escalated, 0);
    }

    #[tokio::test]
    async fn sweep_skips_resolved_files() {
        let tracker = tracker_with(3);
        tracker
            .resolve(&FileId::new("OF-001").unwrap(), ts("2025-01-15T10:00:00Z"))
            .unwrap();
        let report = sweep_once(&tracker, ts("2025-01-17T00:00:00Z"), 10, None)
            .await
            .unwrap();
        assert_eq!(report.examined, 2);
        let resolved = tracker.get(&FileId::new("OF-001").unwrap()).unwrap().unwrap();
        assert_eq!(resolved.escalation_level, EscalationLevel::None);
    }

    #[tokio::test]
    async fn shutdown_is_observed_between_batches() {
        let tracker = tracker_with(6);
        let (tx, mut rx) = oneshot::channel();
        tx.send(()).unwrap();
        let report = sweep_once(&tracker, ts("2025-01-17T00:00:00Z"), 4, Some(&mut rx))
            .await
            .unwrap();
        // The first batch always completes.
        assert_eq!(report.batches, 1);
        assert_eq!(report.examined, 4);
        assert!(report.interrupted);
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_sweeper_runs_on_interval_and_stops() {
        let tracker = tracker_with(2);
        let clock: Clock = Arc::new(|| Timestamp::parse("2025-01-17T00:00:00Z").unwrap());
        let handle = SlaSweeper::new(tracker.clone(), Duration::from_secs(60), 10)
            .with_clock(clock)
            .spawn();
        tokio::time::sleep(Duration::from_secs(150)).await;
        let totals = handle.shutdown().await;
        assert_eq!(totals.sweeps, 2);
        assert_eq!(totals.escalated, 2);
        let status = tracker.get(&FileId::new("OF-000").unwrap()).unwrap().unwrap();
        assert_eq!(status.escalation_level, EscalationLevel::Breached);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_before_first_tick_runs_no_sweep() {
        let tracker = tracker_with(1);
        let handle = SlaSweeper::new(tracker, Duration::from_secs(60), 10).spawn();
        tokio::time::sleep(Duration::from_secs(10)).await;
        let totals = handle.shutdown().await;
        assert_eq!(totals.sweeps, 0);
    }
}
