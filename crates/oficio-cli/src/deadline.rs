//! # Deadline Subcommand
//!
//! Computes the last business day of a term and the instant it expires,
//! using the configured holidays and cutoff time.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use oficio_core::Timestamp;
use oficio_policy::EngineConfig;
use oficio_sla::BusinessCalendar;
use serde::Serialize;

use crate::print_json;

/// Arguments for the deadline subcommand.
#[derive(Args, Debug)]
pub struct DeadlineArgs {
    /// Intake date (YYYY-MM-DD).
    #[arg(long)]
    pub intake: NaiveDate,

    /// Business days granted.
    #[arg(long)]
    pub days: u32,
}

/// Output of the deadline subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadlineReport {
    /// Intake date as given.
    pub intake_date: NaiveDate,
    /// Business days granted.
    pub days_plazo: u32,
    /// Last business day of the term.
    pub deadline_date: NaiveDate,
    /// Instant the term expires.
    pub deadline: Timestamp,
}

/// Compute the report for `args` under `config`.
pub fn deadline_report(args: &DeadlineArgs, config: &EngineConfig) -> DeadlineReport {
    let calendar = BusinessCalendar::with_holidays(config.sla().holidays.iter().copied());
    let deadline_date = calendar.compute_deadline(args.intake, args.days);
    DeadlineReport {
        intake_date: args.intake,
        days_plazo: args.days,
        deadline_date,
        deadline: Timestamp::at(deadline_date, config.sla().cutoff_time),
    }
}

/// Execute the deadline subcommand.
pub fn run_deadline(args: &DeadlineArgs, config: &EngineConfig) -> Result<u8> {
    print_json(&deadline_report(args, config), false)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(intake: &str, days: u32) -> DeadlineArgs {
        DeadlineArgs {
            intake: intake.parse().unwrap(),
            days,
        }
    }

    #[test]
    fn wednesday_plus_five() {
        let config = EngineConfig::builtin().unwrap();
        let report = deadline_report(&args("2025-01-15", 5), &config);
        assert_eq!(report.deadline_date, "2025-01-22".parse::<NaiveDate>().unwrap());
        assert_eq!(
            report.deadline,
            Timestamp::parse("2025-01-22T23:59:59Z").unwrap()
        );
    }

    #[test]
    fn zero_days_is_intake() {
        let config = EngineConfig::builtin().unwrap();
        let report = deadline_report(&args("2025-01-17", 0), &config);
        assert_eq!(report.deadline_date, report.intake_date);
    }

    #[test]
    fn configured_holiday_is_skipped() {
        let base = EngineConfig::builtin().unwrap();
        let mut sla = base.sla().clone();
        sla.holidays.insert("2025-01-16".parse().unwrap());
        let config = EngineConfig::new(
            base.matching().clone(),
            base.fields().iter().cloned().collect(),
            base.rules().clone(),
            sla,
        )
        .unwrap();
        let report = deadline_report(&args("2025-01-15", 1), &config);
        assert_eq!(report.deadline_date, "2025-01-17".parse::<NaiveDate>().unwrap());
    }
}
