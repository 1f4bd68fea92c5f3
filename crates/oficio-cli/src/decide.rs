//! # Decide Subcommand
//!
//! Reads a JSON case file and prints the decisions as JSON.
//!
//! The file holds either one case object or an array of cases. Arrays are
//! decided as a batch; the output array keeps the input order and reports
//! per-case failures inline.
//!
//! Exit codes: `0` when every case was decided without review, `2` when at
//! least one decision needs review or one case failed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use oficio_core::Timestamp;
use oficio_engine::{Decision, DecisionCase, DecisionEngine, DecisionService, EngineError};
use oficio_policy::EngineConfig;
use oficio_sla::{InMemorySlaStore, SlaTracker};
use serde::{Deserialize, Serialize};

use crate::{parse_timestamp, print_json};

/// Arguments for the decide subcommand.
#[derive(Args, Debug)]
pub struct DecideArgs {
    /// JSON file with one case or an array of cases.
    pub case_file: PathBuf,

    /// Evaluate SLA status at this instant instead of now (RFC 3339, UTC).
    #[arg(long, value_parser = parse_timestamp)]
    pub now: Option<Timestamp>,

    /// Pretty-print the output.
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CaseInput {
    Batch(Vec<DecisionCase>),
    Single(Box<DecisionCase>),
}

/// One batch slot in the output.
#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum BatchOutcome {
    Decided { decision: Box<Decision> },
    Failed { error: String },
}

/// Parse a case file's contents.
pub fn parse_cases(content: &str) -> Result<Vec<DecisionCase>> {
    let input: CaseInput =
        serde_json::from_str(content).context("case file is neither a case nor an array of cases")?;
    Ok(match input {
        CaseInput::Batch(cases) => cases,
        CaseInput::Single(case) => vec![*case],
    })
}

fn read_cases(path: &Path) -> Result<(Vec<DecisionCase>, bool)> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read case file: {}", path.display()))?;
    let batch = content.trim_start().starts_with('[');
    let cases = parse_cases(&content)
        .with_context(|| format!("invalid case file: {}", path.display()))?;
    Ok((cases, batch))
}

/// Execute the decide subcommand.
pub fn run_decide(args: &DecideArgs, config: EngineConfig) -> Result<u8> {
    let (cases, batch) = read_cases(&args.case_file)?;
    let now = args.now.unwrap_or_else(Timestamp::now);

    let config = Arc::new(config);
    let tracker = SlaTracker::new(Arc::new(InMemorySlaStore::new()), config.sla());
    let service = DecisionService::new(Arc::new(DecisionEngine::new(config)), tracker);

    if !batch {
        let Some(case) = cases.first() else {
            anyhow::bail!("case file holds no case");
        };
        let decision = service
            .decide(case, now)
            .with_context(|| format!("failed to decide {}", case.file_id))?;
        print_json(&decision, args.pretty)?;
        return Ok(if decision.needs_review() { 2 } else { 0 });
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to start worker runtime")?;
    let results = runtime.block_on(service.decide_batch(cases, now));
    let code = batch_exit_code(&results);
    let outcomes: Vec<BatchOutcome> = results
        .into_iter()
        .map(|r| match r {
            Ok(decision) => BatchOutcome::Decided {
                decision: Box::new(decision),
            },
            Err(e) => BatchOutcome::Failed {
                error: e.to_string(),
            },
        })
        .collect();
    print_json(&outcomes, args.pretty)?;
    Ok(code)
}

fn batch_exit_code(results: &[Result<Decision, EngineError>]) -> u8 {
    let clean = results
        .iter()
        .all(|r| matches!(r, Ok(decision) if !decision.needs_review()));
    if clean {
        0
    } else {
        2
    }
}
