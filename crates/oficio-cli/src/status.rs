//! # Status Subcommand
//!
//! Evaluates the SLA status of a file at an instant, without persisting it.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use oficio_core::Timestamp;
use oficio_policy::EngineConfig;
use oficio_sla::{EscalationLevel, InMemorySlaStore, SlaStatus, SlaTracker};

use crate::{parse_timestamp, print_json};

/// Arguments for the status subcommand.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// File identifier.
    #[arg(long)]
    pub file_id: String,

    /// Intake date (YYYY-MM-DD).
    #[arg(long)]
    pub intake: NaiveDate,

    /// Business days granted. Must be positive.
    #[arg(long, allow_negative_numbers = true)]
    pub days: i64,

    /// Evaluate at this instant instead of now (RFC 3339, UTC).
    #[arg(long, value_parser = parse_timestamp)]
    pub now: Option<Timestamp>,

    /// Pretty-print the output.
    #[arg(long)]
    pub pretty: bool,
}

/// Compute the status for `args` under `config`.
pub fn evaluate(args: &StatusArgs, config: &EngineConfig) -> Result<SlaStatus> {
    let tracker = SlaTracker::new(Arc::new(InMemorySlaStore::new()), config.sla());
    let now = args.now.unwrap_or_else(Timestamp::now);
    tracker
        .preview(&args.file_id, args.intake, args.days, now)
        .with_context(|| format!("cannot evaluate SLA for '{}'", args.file_id))
}

/// Execute the status subcommand. Exits `3` once the deadline is breached.
pub fn run_status(args: &StatusArgs, config: &EngineConfig) -> Result<u8> {
    let status = evaluate(args, config)?;
    print_json(&status, args.pretty)?;
    Ok(if status.escalation_level == EscalationLevel::Breached {
        3
    } else {
        0
    })
}
