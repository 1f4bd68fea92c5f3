//! Escalation state machine.
//!
//! An [`SlaStatus`] is created at intake and re-evaluated on every query or
//! sweep. Its level only moves upward for a fixed deadline:
//!
//! ```text
//! None ──> Warning ──> Critical ──> Breached
//! ```
//!
//! Levels may be skipped (an oficio opened with three hours left starts at
//! `Critical`). The only way down is an explicit deadline correction, which
//! is recorded in the transition log. A resolved status is frozen.

use chrono::NaiveDate;
use oficio_core::{FileId, Timestamp};
use oficio_policy::EscalationThresholds;
use serde::{Deserialize, Serialize};

use crate::error::SlaError;

// ─── Escalation Level ────────────────────────────────────────────────

/// Urgency of a tracked deadline, ordered by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationLevel {
    /// More than the warning window remains.
    #[default]
    None,
    /// Within the warning window.
    Warning,
    /// Within the critical window.
    Critical,
    /// The deadline has passed.
    Breached,
}

impl EscalationLevel {
    /// Level for `remaining_secs` until the deadline.
    pub fn for_remaining(remaining_secs: i64, thresholds: &EscalationThresholds) -> Self {
        if remaining_secs <= 0 {
            Self::Breached
        } else if remaining_secs <= thresholds.critical_secs {
            Self::Critical
        } else if remaining_secs <= thresholds.warning_secs {
            Self::Warning
        } else {
            Self::None
        }
    }

    /// Snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Breached => "breached",
        }
    }
}

impl std::fmt::Display for EscalationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Transitions ─────────────────────────────────────────────────────

/// Why the level or deadline changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum TransitionReason {
    /// Time passed a threshold.
    Escalated,
    /// The deadline was corrected by an operator.
    DeadlineCorrected {
        previous_deadline: Timestamp,
        note: String,
    },
    /// The oficio was answered.
    Resolved,
}

/// One entry in a status's transition log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationTransition {
    /// Level before the change.
    pub from_level: EscalationLevel,
    /// Level after the change.
    pub to_level: EscalationLevel,
    /// When the change was computed.
    pub at: Timestamp,
    /// Cause of the change.
    #[serde(flatten)]
    pub reason: TransitionReason,
}

// ─── Status ──────────────────────────────────────────────────────────

/// Durable SLA record for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaStatus {
    /// The tracked file.
    pub file_id: FileId,
    /// Date the oficio was received.
    pub intake_date: NaiveDate,
    /// Business days granted by the authority.
    pub days_plazo: u32,
    /// Last business day of the term.
    pub deadline_date: NaiveDate,
    /// Instant the term expires.
    pub deadline: Timestamp,
    /// Seconds left at `computed_at`. Negative once breached.
    pub remaining_seconds: i64,
    /// Current urgency.
    pub escalation_level: EscalationLevel,
    /// When the current level was first reached. `None` at level `none`.
    pub escalated_at: Option<Timestamp>,
    /// When this snapshot was computed.
    pub computed_at: Timestamp,
    /// Optimistic-concurrency revision, owned by the store.
    pub revision: u64,
    /// When the oficio was answered.
    pub resolved_at: Option<Timestamp>,
    /// Every level change and correction, oldest first.
    pub transitions: Vec<EscalationTransition>,
}

/// Validate intake inputs. Returns the term as an unsigned day count.
pub fn validate_intake(file_id: &str, days_plazo: i64) -> Result<(FileId, u32), SlaError> {
    let file_id = FileId::new(file_id)?;
    if days_plazo <= 0 || days_plazo > i64::from(u32::MAX) {
        return Err(SlaError::InvalidDaysPlazo { days: days_plazo });
    }
    Ok((file_id, days_plazo as u32))
}

/// Fresh status for a deadline evaluated at `now`.
///
/// This is the stateless computation: it knows nothing about previously
/// persisted levels. Use [`SlaStatus::advance`] to re-evaluate a stored
/// status without regressing it.
pub fn compute_status(
    file_id: FileId,
    intake_date: NaiveDate,
    days_plazo: u32,
    deadline_date: NaiveDate,
    deadline: Timestamp,
    now: Timestamp,
    thresholds: &EscalationThresholds,
) -> SlaStatus {
    let remaining_seconds = now.seconds_until(&deadline);
    let level = EscalationLevel::for_remaining(remaining_seconds, thresholds);
    let mut transitions = Vec::new();
    if level > EscalationLevel::None {
        transitions.push(EscalationTransition {
            from_level: EscalationLevel::None,
            to_level: level,
            at: now,
            reason: TransitionReason::Escalated,
        });
    }
    SlaStatus {
        file_id,
        intake_date,
        days_plazo,
        deadline_date,
        deadline,
        remaining_seconds,
        escalation_level: level,
        escalated_at: (level > EscalationLevel::None).then_some(now),
        computed_at: now,
        revision: 0,
        resolved_at: None,
        transitions,
    }
}

impl SlaStatus {
    /// Whether the SLA is still open.
    pub fn is_active(&self) -> bool {
        self.resolved_at.is_none()
    }

    /// Re-evaluate at `now` without ever lowering the level.
    ///
    /// A `now` earlier than the last computation is treated as the last
    /// computation time, so a stale writer cannot move the clock backwards.
    /// Resolved statuses are returned unchanged.
    pub fn advance(&self, now: Timestamp, thresholds: &EscalationThresholds) -> SlaStatus {
        if !self.is_active() {
            return self.clone();
        }
        let now = now.max(self.computed_at);
        let remaining_seconds = now.seconds_until(&self.deadline);
        let computed = EscalationLevel::for_remaining(remaining_seconds, thresholds);
        let mut next = self.clone();
        next.remaining_seconds = remaining_seconds;
        next.computed_at = now;
        if computed > self.escalation_level {
            next.transitions.push(EscalationTransition {
                from_level: self.escalation_level,
                to_level: computed,
                at: now,
                reason: TransitionReason::Escalated,
            });
            next.escalation_level = computed;
            next.escalated_at = Some(now);
        }
        next
    }

    /// Replace the deadline and recompute the level from scratch.
    ///
    /// This is the only operation that may lower the level.
    pub fn correct_deadline(
        &self,
        days_plazo: u32,
        deadline_date: NaiveDate,
        deadline: Timestamp,
        now: Timestamp,
        thresholds: &EscalationThresholds,
        note: &str,
    ) -> Result<SlaStatus, SlaError> {
        self.require_active()?;
        let remaining_seconds = now.seconds_until(&deadline);
        let level = EscalationLevel::for_remaining(remaining_seconds, thresholds);
        let mut next = self.clone();
        next.transitions.push(EscalationTransition {
            from_level: self.escalation_level,
            to_level: level,
            at: now,
            reason: TransitionReason::DeadlineCorrected {
                previous_deadline: self.deadline,
                note: note.to_string(),
            },
        });
        next.days_plazo = days_plazo;
        next.deadline_date = deadline_date;
        next.deadline = deadline;
        next.remaining_seconds = remaining_seconds;
        next.computed_at = now;
        if level != self.escalation_level {
            next.escalated_at = (level > EscalationLevel::None).then_some(now);
        }
        next.escalation_level = level;
        Ok(next)
    }

    /// Mark the SLA as answered. The level is frozen from here on.
    pub fn resolve(&self, now: Timestamp) -> Result<SlaStatus, SlaError> {
        self.require_active()?;
        let mut next = self.clone();
        next.transitions.push(EscalationTransition {
            from_level: self.escalation_level,
            to_level: self.escalation_level,
            at: now,
            reason: TransitionReason::Resolved,
        });
        next.resolved_at = Some(now);
        next.computed_at = now.max(self.computed_at);
        Ok(next)
    }

    fn require_active(&self) -> Result<(), SlaError> {
        match self.resolved_at {
            Some(at) => Err(SlaError::AlreadyResolved {
                file_id: self.file_id.clone(),
                resolved_at: at.to_string(),
            }),
            None => Ok(()),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn thresholds() -> EscalationThresholds {
        EscalationThresholds::default()
    }

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn open_at(now: &str) -> SlaStatus {
        let deadline_date = date("2025-01-16");
        let deadline = Timestamp::at(deadline_date, NaiveTime::from_hms_opt(23, 59, 59).unwrap());
        compute_status(
            FileId::new("OF-1").unwrap(),
            date("2025-01-15"),
            1,
            deadline_date,
            deadline,
            ts(now),
            &thresholds(),
        )
    }

    #[test]
    fn level_boundaries() {
        let t = thresholds();
        assert_eq!(EscalationLevel::for_remaining(86_401, &t), EscalationLevel::None);
        assert_eq!(EscalationLevel::for_remaining(86_400, &t), EscalationLevel::Warning);
        assert_eq!(EscalationLevel::for_remaining(14_400, &t), EscalationLevel::Critical);
        assert_eq!(EscalationLevel::for_remaining(3 * 3600, &t), EscalationLevel::Critical);
        assert_eq!(EscalationLevel::for_remaining(1, &t), EscalationLevel::Critical);
        assert_eq!(EscalationLevel::for_remaining(0, &t), EscalationLevel::Breached);
        assert_eq!(EscalationLevel::for_remaining(-1, &t), EscalationLevel::Breached);
    }

    #[test]
    fn fresh_status_with_time_left() {
        let s = open_at("2025-01-16T09:00:00Z");
        assert_eq!(s.escalation_level, EscalationLevel::Warning);
        assert_eq!(s.remaining_seconds, 14 * 3600 + 59 * 60 + 59);
        assert_eq!(s.escalated_at, Some(ts("2025-01-16T09:00:00Z")));
        assert_eq!(s.transitions.len(), 1);
    }

    #[test]
    fn fresh_status_far_out_is_none() {
        let s = open_at("2025-01-14T09:00:00Z");
        assert_eq!(s.escalation_level, EscalationLevel::None);
        assert_eq!(s.escalated_at, None);
        assert!(s.transitions.is_empty());
    }

    #[test]
    fn advance_escalates_and_logs() {
        let s = open_at("2025-01-14T09:00:00Z");
        let later = s.advance(ts("2025-01-16T20:59:59Z"), &thresholds());
        assert_eq!(later.remaining_seconds, 3 * 3600);
        assert_eq!(later.escalation_level, EscalationLevel::Critical);
        assert_eq!(later.transitions.last().unwrap().from_level, EscalationLevel::None);
        let breached = later.advance(ts("2025-01-17T00:00:00Z"), &thresholds());
        assert_eq!(breached.remaining_seconds, -1);
        assert_eq!(breached.escalation_level, EscalationLevel::Breached);
        assert_eq!(breached.transitions.len(), 2);
    }

    #[test]
    fn advance_never_regresses() {
        let s = open_at("2025-01-16T22:00:00Z");
        assert_eq!(s.escalation_level, EscalationLevel::Critical);
        let stale = s.advance(ts("2025-01-15T00:00:00Z"), &thresholds());
        assert_eq!(stale.escalation_level, EscalationLevel::Critical);
        assert_eq!(stale.computed_at, s.computed_at);
        let relaxed = EscalationThresholds {
            warning_secs: 600,
            critical_secs: 60,
        };
        let same = s.advance(ts("2025-01-16T22:00:01Z"), &relaxed);
        assert_eq!(same.escalation_level, EscalationLevel::Critical);
    }

    #[test]
    fn correction_may_lower_level() {
        let s = open_at("2025-01-16T22:00:00Z");
        let new_date = date("2025-01-22");
        let new_deadline = Timestamp::at(new_date, NaiveTime::from_hms_opt(23, 59, 59).unwrap());
        let corrected = s
            .correct_deadline(5, new_date, new_deadline, ts("2025-01-16T22:00:00Z"), &thresholds(), "term misread")
            .unwrap();
        assert_eq!(corrected.escalation_level, EscalationLevel::None);
        assert_eq!(corrected.escalated_at, None);
        assert_eq!(corrected.days_plazo, 5);
        match &corrected.transitions.last().unwrap().reason {
            TransitionReason::DeadlineCorrected { previous_deadline, note } => {
                assert_eq!(*previous_deadline, s.deadline);
                assert_eq!(note, "term misread");
            }
            other => panic!("unexpected reason {other:?}"),
        }
    }

    #[test]
    fn resolved_status_is_frozen() {
        let s = open_at("2025-01-15T09:00:00Z");
        let resolved = s.resolve(ts("2025-01-15T10:00:00Z")).unwrap();
        assert!(!resolved.is_active());
        let later = resolved.advance(ts("2025-01-20T00:00:00Z"), &thresholds());
        assert_eq!(later, resolved);
        assert!(matches!(
            resolved.resolve(ts("2025-01-15T11:00:00Z")),
            Err(SlaError::AlreadyResolved { .. })
        ));
    }

    #[test]
    fn intake_validation() {
        assert!(matches!(
            validate_intake("OF-1", 0),
            Err(SlaError::InvalidDaysPlazo { days: 0 })
        ));
        assert!(matches!(
            validate_intake("OF-1", -3),
            Err(SlaError::InvalidDaysPlazo { days: -3 })
        ));
        assert!(matches!(validate_intake("  ", 5), Err(SlaError::Validation(_))));
        let (id, days) = validate_intake("OF-1", 10).unwrap();
        assert_eq!((id.as_str(), days), ("OF-1", 10));
    }

    #[test]
    fn transition_serializes_reason_inline() {
        let s = open_at("2025-01-16T09:00:00Z");
        let json = serde_json::to_value(&s.transitions[0]).unwrap();
        assert_eq!(json["reason"], "escalated");
        assert_eq!(json["to_level"], "warning");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn escalation_is_monotonic(steps in proptest::collection::vec(0i64..20_000, 1..30)) {
                let mut status = open_at("2025-01-14T00:00:00Z");
                let mut now = status.computed_at;
                for step in steps {
                    now = now.plus_seconds(step);
                    let next = status.advance(now, &thresholds());
                    prop_assert!(next.escalation_level >= status.escalation_level);
                    prop_assert!(next.transitions.len() >= status.transitions.len());
                    status = next;
                }
            }

            #[test]
            fn level_matches_fresh_computation_when_time_only_moves_forward(
                offsets in proptest::collection::vec(0i64..300_000, 1..10)
            ) {
                let base = open_at("2025-01-14T00:00:00Z");
                let mut sorted = offsets.clone();
                sorted.sort();
                let mut status = base.clone();
                for off in &sorted {
                    status = status.advance(base.computed_at.plus_seconds(*off), &thresholds());
                }
                let last = base.computed_at.plus_seconds(*sorted.last().unwrap());
                let fresh = EscalationLevel::for_remaining(last.seconds_until(&base.deadline), &thresholds());
                prop_assert_eq!(status.escalation_level, fresh);
            }
        }
    }
}
