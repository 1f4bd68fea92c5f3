//! SLA tracker: the read-compute-write loop over an [`SlaStore`].
//!
//! Every write reads the current revision, computes the next snapshot from
//! it, and writes only if the revision is unchanged. On a conflict the loop
//! starts again from a fresh read; since [`SlaStatus::advance`] takes the
//! maximum of the persisted and computed levels, a retry can never regress
//! the level another writer persisted. An unchanged snapshot is not written.
//! Non-conflict store errors end the loop immediately.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use oficio_core::{FileId, Timestamp};
use oficio_policy::{EscalationThresholds, SlaPolicy};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::calendar::BusinessCalendar;
use crate::error::{SlaError, StoreError};
use crate::status::{compute_status, validate_intake, EscalationLevel, SlaStatus};
use crate::store::SlaStore;

/// Published when a file's escalation level rises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationEvent {
    /// The escalated file.
    pub file_id: FileId,
    /// Level before.
    pub from_level: EscalationLevel,
    /// Level after.
    pub to_level: EscalationLevel,
    /// The deadline being tracked.
    pub deadline: Timestamp,
    /// When the escalation was computed.
    pub at: Timestamp,
}

/// Tracks SLA statuses in a shared store. Cheap to clone.
#[derive(Clone)]
pub struct SlaTracker {
    store: Arc<dyn SlaStore>,
    calendar: BusinessCalendar,
    cutoff_time: NaiveTime,
    thresholds: EscalationThresholds,
    max_write_attempts: u32,
    events: Option<mpsc::UnboundedSender<EscalationEvent>>,
}

impl std::fmt::Debug for SlaTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlaTracker")
            .field("cutoff_time", &self.cutoff_time)
            .field("thresholds", &self.thresholds)
            .field("max_write_attempts", &self.max_write_attempts)
            .finish_non_exhaustive()
    }
}

impl SlaTracker {
    /// Tracker over `store` configured from `policy`.
    pub fn new(store: Arc<dyn SlaStore>, policy: &SlaPolicy) -> Self {
        Self {
            store,
            calendar: BusinessCalendar::with_holidays(policy.holidays.iter().copied()),
            cutoff_time: policy.cutoff_time,
            thresholds: policy.thresholds(),
            max_write_attempts: policy.max_write_attempts.max(1),
            events: None,
        }
    }

    /// Publish escalations on `sender`.
    pub fn with_events(mut self, sender: mpsc::UnboundedSender<EscalationEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// The business calendar in use.
    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    /// Escalation thresholds in use.
    pub fn thresholds(&self) -> &EscalationThresholds {
        &self.thresholds
    }

    /// Deadline date and instant for a term starting at `intake_date`.
    pub fn deadline_for(&self, intake_date: NaiveDate, days_plazo: u32) -> (NaiveDate, Timestamp) {
        let date = self.calendar.compute_deadline(intake_date, days_plazo);
        (date, Timestamp::at(date, self.cutoff_time))
    }

    /// Status computed at `now` without touching the store.
    pub fn preview(
        &self,
        file_id: &str,
        intake_date: NaiveDate,
        days_plazo: i64,
        now: Timestamp,
    ) -> Result<SlaStatus, SlaError> {
        let (file_id, days) = validate_intake(file_id, days_plazo)?;
        let (deadline_date, deadline) = self.deadline_for(intake_date, days);
        Ok(compute_status(
            file_id,
            intake_date,
            days,
            deadline_date,
            deadline,
            now,
            &self.thresholds,
        ))
    }

    /// Start tracking a file.
    ///
    /// Opening a file that is already tracked with the same intake date and
    /// term refreshes it instead; a resolved file is returned as stored. A different clock is rejected; use
    /// [`SlaTracker::correct_deadline`].
    pub fn open(
        &self,
        file_id: &str,
        intake_date: NaiveDate,
        days_plazo: i64,
        now: Timestamp,
    ) -> Result<SlaStatus, SlaError> {
        let status = self.preview(file_id, intake_date, days_plazo, now)?;
        let file_id = status.file_id.clone();
        let (days, level) = (status.days_plazo, status.escalation_level);
        match self.store.insert(status) {
            Ok(stored) => {
                tracing::info!(
                    file_id = %stored.file_id,
                    deadline = %stored.deadline,
                    level = %level,
                    "SLA tracking opened"
                );
                if level > EscalationLevel::None {
                    self.publish(&stored, EscalationLevel::None);
                }
                Ok(stored)
            }
            Err(StoreError::AlreadyExists { .. }) => {
                let existing = self
                    .store
                    .get(&file_id)?
                    .ok_or_else(|| SlaError::NotTracked {
                        file_id: file_id.clone(),
                    })?;
                if existing.intake_date != intake_date || existing.days_plazo != days {
                    return Err(SlaError::AlreadyTracked { file_id });
                }
                if !existing.is_active() {
                    tracing::debug!(file_id = %file_id, "SLA already resolved, returning stored status");
                    return Ok(existing);
                }
                self.refresh(&file_id, now)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Current stored status, without recomputation.
    pub fn get(&self, file_id: &FileId) -> Result<Option<SlaStatus>, SlaError> {
        Ok(self.store.get(file_id)?)
    }

    /// Re-evaluate a tracked file at `now` and persist the result.
    pub fn refresh(&self, file_id: &FileId, now: Timestamp) -> Result<SlaStatus, SlaError> {
        self.refresh_with_previous(file_id, now).map(|(stored, _)| stored)
    }

    /// [`SlaTracker::refresh`], also returning the level that was replaced.
    pub fn refresh_with_previous(
        &self,
        file_id: &FileId,
        now: Timestamp,
    ) -> Result<(SlaStatus, EscalationLevel), SlaError> {
        let thresholds = self.thresholds;
        self.update(file_id, |current| Ok(current.advance(now, &thresholds)))
    }

    /// Replace a file's term. The level is recomputed from the new deadline
    /// and may go down; the change is logged in the transition history.
    pub fn correct_deadline(
        &self,
        file_id: &FileId,
        days_plazo: i64,
        note: &str,
        now: Timestamp,
    ) -> Result<SlaStatus, SlaError> {
        let (_, days) = validate_intake(file_id.as_str(), days_plazo)?;
        let thresholds = self.thresholds;
        let (corrected, _) = self.update(file_id, |current| {
            let (date, deadline) = self.deadline_for(current.intake_date, days);
            current.correct_deadline(days, date, deadline, now, &thresholds, note)
        })?;
        tracing::info!(
            file_id = %file_id,
            deadline = %corrected.deadline,
            level = %corrected.escalation_level,
            note,
            "SLA deadline corrected"
        );
        Ok(corrected)
    }

    /// Mark a file's SLA as answered.
    pub fn resolve(&self, file_id: &FileId, now: Timestamp) -> Result<SlaStatus, SlaError> {
        let (resolved, _) = self.update(file_id, |current| current.resolve(now))?;
        tracing::info!(file_id = %file_id, level = %resolved.escalation_level, "SLA resolved");
        Ok(resolved)
    }

    /// Files with an open SLA.
    pub fn active_ids(&self) -> Result<Vec<FileId>, SlaError> {
        Ok(self.store.active_ids()?)
    }

    fn update(
        &self,
        file_id: &FileId,
        next: impl Fn(&SlaStatus) -> Result<SlaStatus, SlaError>,
    ) -> Result<(SlaStatus, EscalationLevel), SlaError> {
        for attempt in 1..=self.max_write_attempts {
            let current = self
                .store
                .get(file_id)?
                .ok_or_else(|| SlaError::NotTracked {
                    file_id: file_id.clone(),
                })?;
            let candidate = next(&current)?;
            if candidate == current {
                return Ok((current.clone(), current.escalation_level));
            }
            match self.store.compare_and_swap(current.revision, candidate) {
                Ok(stored) => {
                    if stored.escalation_level > current.escalation_level {
                        self.publish(&stored, current.escalation_level);
                    }
                    return Ok((stored, current.escalation_level));
                }
                Err(StoreError::Conflict { actual, .. }) => {
                    tracing::debug!(
                        file_id = %file_id,
                        attempt,
                        read = current.revision,
                        found = actual,
                        "SLA write lost a race, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        tracing::warn!(file_id = %file_id, attempts = self.max_write_attempts, "SLA write contention exhausted");
        Err(SlaError::ContentionExhausted {
            file_id: file_id.clone(),
            attempts: self.max_write_attempts,
        })
    }

    fn publish(&self, status: &SlaStatus, from_level: EscalationLevel) {
        let to_level = status.escalation_level;
        tracing::info!(
            file_id = %status.file_id,
            from = %from_level,
            to = %to_level,
            remaining_seconds = status.remaining_seconds,
            "SLA escalated"
        );
        metrics::counter!("oficio_sla_escalations_total", "level" => to_level.as_str())
            .increment(1);
        if let Some(tx) = &self.events {
            let event = EscalationEvent {
                file_id: status.file_id.clone(),
                from_level,
                to_level,
                deadline: status.deadline,
                at: status.computed_at,
            };
            if tx.send(event).is_err() {
                tracing::debug!(file_id = %status.file_id, "escalation receiver dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySlaStore;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tracker() -> (SlaTracker, InMemorySlaStore) {
        let store = InMemorySlaStore::new();
        (SlaTracker::new(Arc::new(store.clone()), &SlaPolicy::default()), store)
    }

    #[test]
    fn open_computes_business_day_deadline() {
        let (tracker, store) = tracker();
        let s = tracker
            .open("OF-1", date(2025, 1, 15), 5, ts("2025-01-15T10:00:00Z"))
            .unwrap();
        assert_eq!(s.deadline_date, date(2025, 1, 22));
        assert_eq!(s.deadline.to_string(), "2025-01-22T23:59:59Z");
        assert_eq!(s.revision, 1);
        assert_eq!(s.escalation_level, EscalationLevel::None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn open_rejects_bad_input_without_storing() {
        let (tracker, store) = tracker();
        let now = ts("2025-01-15T10:00:00Z");
        assert!(matches!(
            tracker.open("OF-1", date(2025, 1, 15), 0, now),
            Err(SlaError::InvalidDaysPlazo { days: 0 })
        ));
        assert!(matches!(
            tracker.open("", date(2025, 1, 15), 3, now),
            Err(SlaError::Validation(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn reopen_same_clock_refreshes() {
        let (tracker, _) = tracker();
        tracker
            .open("OF-1", date(2025, 1, 15), 1, ts("2025-01-15T10:00:00Z"))
            .unwrap();
        let again = tracker
            .open("OF-1", date(2025, 1, 15), 1, ts("2025-01-16T21:00:00Z"))
            .unwrap();
        assert_eq!(again.revision, 2);
        assert_eq!(again.escalation_level, EscalationLevel::Critical);
        assert!(matches!(
            tracker.open("OF-1", date(2025, 1, 15), 3, ts("2025-01-16T21:00:00Z")),
            Err(SlaError::AlreadyTracked { .. })
        ));
    }

    #[test]
    fn reopen_resolved_file_leaves_it_untouched() {
        let (tracker, store) = tracker();
        let s = tracker
            .open("OF-1", date(2025, 1, 15), 1, ts("2025-01-15T10:00:00Z"))
            .unwrap();
        let resolved = tracker.resolve(&s.file_id, ts("2025-01-15T12:00:00Z")).unwrap();
        assert_eq!(resolved.revision, 2);

        let again = tracker
            .open("OF-1", date(2025, 1, 15), 1, ts("2025-01-17T09:00:00Z"))
            .unwrap();
        assert_eq!(again, resolved);
        assert_eq!(store.get(&s.file_id).unwrap().unwrap().revision, 2);
    }

    #[test]
    fn unchanged_refresh_is_not_written() {
        let (tracker, store) = tracker();
        let s = tracker
            .open("OF-1", date(2025, 1, 15), 1, ts("2025-01-15T10:00:00Z"))
            .unwrap();
        let same = tracker.refresh(&s.file_id, ts("2025-01-15T10:00:00Z")).unwrap();
        assert_eq!(same.revision, 1);
        // an earlier clock is clamped to the last computation
        let stale = tracker.refresh(&s.file_id, ts("2025-01-15T08:00:00Z")).unwrap();
        assert_eq!(stale, s);
        assert_eq!(store.get(&s.file_id).unwrap().unwrap().revision, 1);
    }

    #[test]
    fn refresh_publishes_escalations() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (tracker, _) = tracker();
        let tracker = tracker.with_events(tx);
        let s = tracker
            .open("OF-1", date(2025, 1, 15), 1, ts("2025-01-15T10:00:00Z"))
            .unwrap();
        tracker.refresh(&s.file_id, ts("2025-01-16T20:59:59Z")).unwrap();
        tracker.refresh(&s.file_id, ts("2025-01-16T21:00:00Z")).unwrap();
        let event = rx.try_recv().unwrap();
        assert_eq!(event.from_level, EscalationLevel::None);
        assert_eq!(event.to_level, EscalationLevel::Critical);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn refresh_unknown_file() {
        let (tracker, _) = tracker();
        let id = FileId::new("OF-404").unwrap();
        assert!(matches!(
            tracker.refresh(&id, ts("2025-01-15T10:00:00Z")),
            Err(SlaError::NotTracked { .. })
        ));
    }

    #[test]
    fn correction_lowers_level_and_is_logged() {
        let (tracker, _) = tracker();
        let s = tracker
            .open("OF-1", date(2025, 1, 15), 1, ts("2025-01-16T22:00:00Z"))
            .unwrap();
        assert_eq!(s.escalation_level, EscalationLevel::Critical);
        let corrected = tracker
            .correct_deadline(&s.file_id, 5, "authority granted extension", ts("2025-01-16T22:00:00Z"))
            .unwrap();
        assert_eq!(corrected.deadline_date, date(2025, 1, 22));
        assert_eq!(corrected.escalation_level, EscalationLevel::None);
        assert_eq!(corrected.revision, 2);
        assert!(matches!(
            tracker.correct_deadline(&s.file_id, 0, "bad", ts("2025-01-16T22:00:00Z")),
            Err(SlaError::InvalidDaysPlazo { .. })
        ));
    }

    #[test]
    fn resolve_removes_from_active_set() {
        let (tracker, _) = tracker();
        let s = tracker
            .open("OF-1", date(2025, 1, 15), 1, ts("2025-01-15T10:00:00Z"))
            .unwrap();
        tracker.resolve(&s.file_id, ts("2025-01-15T12:00:00Z")).unwrap();
        assert!(tracker.active_ids().unwrap().is_empty());
        assert!(matches!(
            tracker.resolve(&s.file_id, ts("2025-01-15T13:00:00Z")),
            Err(SlaError::AlreadyResolved { .. })
        ));
    }

    /// Store that reports a conflict on the first `n` writes.
    struct FlakyStore {
        inner: InMemorySlaStore,
        conflicts_left: AtomicU32,
    }

    impl SlaStore for FlakyStore {
        fn get(&self, file_id: &FileId) -> Result<Option<SlaStatus>, StoreError> {
            self.inner.get(file_id)
        }

        fn insert(&self, status: SlaStatus) -> Result<SlaStatus, StoreError> {
            self.inner.insert(status)
        }

        fn compare_and_swap(&self, expected: u64, status: SlaStatus) -> Result<SlaStatus, StoreError> {
            if self.conflicts_left.load(Ordering::SeqCst) > 0 {
                self.conflicts_left.fetch_sub(1, Ordering::SeqCst);
                return Err(StoreError::Conflict {
                    file_id: status.file_id,
                    expected,
                    actual: expected + 1,
                });
            }
            self.inner.compare_and_swap(expected, status)
        }

        fn active_ids(&self) -> Result<Vec<FileId>, StoreError> {
            self.inner.active_ids()
        }
    }

    #[test]
    fn conflicts_are_retried_then_exhausted() {
        let flaky = Arc::new(FlakyStore {
            inner: InMemorySlaStore::new(),
            conflicts_left: AtomicU32::new(2),
        });
        let tracker = SlaTracker::new(flaky.clone(), &SlaPolicy::default());
        let s = tracker
            .open("OF-1", date(2025, 1, 15), 1, ts("2025-01-15T10:00:00Z"))
            .unwrap();
        let refreshed = tracker.refresh(&s.file_id, ts("2025-01-15T11:00:00Z")).unwrap();
        assert_eq!(refreshed.revision, 2);

        flaky.conflicts_left.store(100, Ordering::SeqCst);
        assert!(matches!(
            tracker.refresh(&s.file_id, ts("2025-01-15T12:00:00Z")),
            Err(SlaError::ContentionExhausted { attempts: 5, .. })
        ));
    }

    /// Store whose writes always fail.
    struct DownStore;

    impl SlaStore for DownStore {
        fn get(&self, _: &FileId) -> Result<Option<SlaStatus>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        fn insert(&self, _: SlaStatus) -> Result<SlaStatus, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        fn compare_and_swap(&self, _: u64, _: SlaStatus) -> Result<SlaStatus, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        fn active_ids(&self) -> Result<Vec<FileId>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn store_failures_surface_unmasked() {
        let tracker = SlaTracker::new(Arc::new(DownStore), &SlaPolicy::default());
        let err = tracker
            .open("OF-1", date(2025, 1, 15), 1, ts("2025-01-15T10:00:00Z"))
            .unwrap_err();
        assert_eq!(
            err,
            SlaError::Store(StoreError::Unavailable("connection refused".into()))
        );
    }

    #[test]
    fn concurrent_refreshes_never_regress() {
        let (tracker, _) = tracker();
        let s = tracker
            .open("OF-1", date(2025, 1, 15), 1, ts("2025-01-15T10:00:00Z"))
            .unwrap();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let tracker = tracker.clone();
                let id = s.file_id.clone();
                std::thread::spawn(move || {
                    // Interleave early and late clocks.
                    let now = if i % 2 == 0 {
                        ts("2025-01-15T11:00:00Z")
                    } else {
                        ts("2025-01-16T22:00:00Z")
                    };
                    for _ in 0..20 {
                        let _ = tracker.refresh(&id, now);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let final_status = tracker.get(&s.file_id).unwrap().unwrap();
        assert_eq!(final_status.escalation_level, EscalationLevel::Critical);
        assert_eq!(final_status.computed_at, ts("2025-01-16T22:00:00Z"));
    }
}
