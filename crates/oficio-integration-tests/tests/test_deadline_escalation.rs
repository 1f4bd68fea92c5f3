//! Business-day deadlines and escalation through the tracker and sweep.

use std::sync::Arc;

use chrono::Duration;
use oficio_core::FileId;
use oficio_integration_tests::{at, builtin_config, date};
use oficio_policy::SlaPolicy;
use oficio_sla::{
    compute_deadline, sweep_once, BusinessCalendar, EscalationLevel, InMemorySlaStore, SlaError,
    SlaTracker,
};
use proptest::prelude::*;
use tokio::sync::mpsc;

fn tracker() -> SlaTracker {
    SlaTracker::new(Arc::new(InMemorySlaStore::new()), builtin_config().sla())
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

#[test]
fn wednesday_intake() {
    assert_eq!(compute_deadline(date("2025-01-15"), 1), date("2025-01-16"));
    assert_eq!(compute_deadline(date("2025-01-15"), 5), date("2025-01-22"));
}

#[test]
fn zero_days_is_intake() {
    assert_eq!(compute_deadline(date("2025-01-18"), 0), date("2025-01-18"));
}

#[test]
fn friday_plus_one_is_monday() {
    assert_eq!(compute_deadline(date("2025-01-17"), 1), date("2025-01-20"));
}

#[test]
fn configured_holidays_are_skipped() {
    let policy = SlaPolicy {
        holidays: [date("2025-02-03")].into_iter().collect(),
        ..SlaPolicy::default()
    };
    let calendar = BusinessCalendar::with_holidays(policy.holidays.iter().copied());
    // Friday 2025-01-31 + 1 skips the weekend and the Constitution Day holiday
    assert_eq!(calendar.compute_deadline(date("2025-01-31"), 1), date("2025-02-04"));
}

// ---------------------------------------------------------------------------
// Escalation
// ---------------------------------------------------------------------------

#[test]
fn three_hours_left_is_critical() {
    let status = tracker()
        .preview("OF-1", date("2025-01-15"), 1, at("2025-01-16T20:59:59Z"))
        .unwrap();
    assert_eq!(status.remaining_seconds, 3 * 3600);
    assert_eq!(status.escalation_level, EscalationLevel::Critical);
}

#[test]
fn one_second_past_is_breached() {
    let status = tracker()
        .preview("OF-1", date("2025-01-15"), 1, at("2025-01-17T00:00:00Z"))
        .unwrap();
    assert_eq!(status.remaining_seconds, -1);
    assert_eq!(status.escalation_level, EscalationLevel::Breached);
}

#[test]
fn invalid_intake_rejected() {
    let t = tracker();
    assert!(matches!(
        t.open("OF-1", date("2025-01-15"), 0, at("2025-01-15T10:00:00Z")),
        Err(SlaError::InvalidDaysPlazo { days: 0 })
    ));
    assert!(matches!(
        t.open(" ", date("2025-01-15"), 3, at("2025-01-15T10:00:00Z")),
        Err(SlaError::Validation(_))
    ));
    assert!(t.active_ids().unwrap().is_empty());
}

#[test]
fn stale_refresh_never_regresses() {
    let t = tracker();
    let id = FileId::new("OF-2").unwrap();
    t.open("OF-2", date("2025-01-15"), 1, at("2025-01-16T22:00:00Z"))
        .unwrap();
    let earlier = t.refresh(&id, at("2025-01-15T08:00:00Z")).unwrap();
    assert_eq!(earlier.escalation_level, EscalationLevel::Critical);
}

#[test]
fn correction_is_the_only_way_down() {
    let t = tracker();
    let id = FileId::new("OF-3").unwrap();
    t.open("OF-3", date("2025-01-15"), 1, at("2025-01-16T22:00:00Z"))
        .unwrap();
    let corrected = t
        .correct_deadline(&id, 10, "authority extended the term", at("2025-01-16T22:30:00Z"))
        .unwrap();
    assert_eq!(corrected.escalation_level, EscalationLevel::None);
    assert_eq!(corrected.deadline_date, date("2025-01-29"));
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sweep_escalates_and_skips_resolved() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let t = tracker().with_events(tx);
    let opened = at("2025-01-15T09:00:00Z");
    for i in 0..5 {
        t.open(&format!("OF-S{i}"), date("2025-01-15"), 1, opened)
            .unwrap();
    }
    t.resolve(&FileId::new("OF-S0").unwrap(), opened).unwrap();

    let report = sweep_once(&t, at("2025-01-16T21:00:00Z"), 2, None)
        .await
        .unwrap();
    assert_eq!(report.examined, 4);
    assert_eq!(report.escalated, 4);
    assert_eq!(report.batches, 2);
    assert!(!report.interrupted);

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(events.len(), 4);
    assert!(events
        .iter()
        .all(|e| e.to_level == EscalationLevel::Critical && e.file_id.as_str() != "OF-S0"));

    let resolved = t.get(&FileId::new("OF-S0").unwrap()).unwrap().unwrap();
    assert_eq!(resolved.escalation_level, EscalationLevel::None);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn deadline_is_a_business_day_after_intake(offset in 0i64..3650, days in 1u32..60) {
        let intake = date("2020-01-01") + Duration::days(offset);
        let calendar = BusinessCalendar::weekends_only();
        let deadline = calendar.compute_deadline(intake, days);
        prop_assert!(deadline > intake);
        prop_assert!(calendar.is_business_day(deadline));
        // at most two weekend days per five business days, plus a partial week
        prop_assert!(deadline - intake <= Duration::days(i64::from(days) * 7 / 5 + 3));
    }

    #[test]
    fn escalation_is_monotonic(steps in prop::collection::vec(0i64..40_000, 1..40)) {
        let t = tracker();
        let id = FileId::new("OF-P").unwrap();
        let mut now = at("2025-01-15T00:00:00Z");
        t.open("OF-P", date("2025-01-15"), 2, now).unwrap();
        let mut last = EscalationLevel::None;
        for step in steps {
            now = now.plus_seconds(step);
            let status = t.refresh(&id, now).unwrap();
            prop_assert!(status.escalation_level >= last);
            last = status.escalation_level;
        }
    }
}
