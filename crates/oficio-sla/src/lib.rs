//! # oficio-sla — Regulatory Deadline Tracking
//!
//! Computes the legal deadline for an oficio from its intake date and the
//! number of business days the authority granted (*días de plazo*), and
//! tracks how close the file is to that deadline.
//!
//! ## Design
//!
//! - [`BusinessCalendar`] walks business days forward, skipping weekends
//!   and configured holidays.
//! - [`SlaStatus`] is a validated state machine over [`EscalationLevel`]
//!   (`none < warning < critical < breached`). Re-evaluation never lowers
//!   the level; only an explicit, logged deadline correction can.
//! - [`SlaStore`] is the persistence seam. [`SlaTracker`] performs
//!   read-compute-compare-and-swap loops against it, retrying only on
//!   revision conflicts and surfacing every other store failure unchanged.
//! - [`SlaSweeper`] re-evaluates every active file on an interval with
//!   cooperative, batch-granular shutdown.
//!
//! ## Crate Policy
//!
//! - Store locks are never held across an `.await`.
//! - No `.unwrap()` outside tests.

pub mod calendar;
pub mod error;
pub mod status;
pub mod store;
pub mod sweeper;
pub mod tracker;

pub use calendar::{compute_deadline, BusinessCalendar};
pub use error::{SlaError, StoreError};
pub use status::{
    compute_status, validate_intake, EscalationLevel, EscalationTransition, SlaStatus,
    TransitionReason,
};
pub use store::{InMemorySlaStore, SlaStore};
pub use sweeper::{sweep_once, system_clock, Clock, SlaSweeper, SweepReport, SweepTotals, SweeperHandle};
pub use tracker::{EscalationEvent, SlaTracker};
