// src/lib.rs

pub mod calc;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod ingest;
pub mod logging;
pub mod status;
pub mod store;
pub mod types;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, RawConfigFile, load_raw_or_default};
use crate::engine::{Orchestrator, wait_for_terminal};
use crate::errors::CalcdagError;
use crate::ingest::{SubmissionLedger, SubmitRequest, submit_expression};
use crate::status::OperationReport;
use crate::store::{InMemoryStore, OperationStore};
use crate::types::OperationId;

/// How often the CLI checks whether submitted expressions have settled.
const SETTLE_CHECK_EVERY: Duration = Duration::from_millis(50);

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - an in-memory store and the orchestrator
/// - ingestion of every expression on the command line
/// - Ctrl-C handling
/// - report output on stdout
pub async fn run(args: CliArgs) -> Result<()> {
    run_with_output(args, &mut std::io::stdout()).await
}

/// [`run`], writing the reports (or the dry-run plan) to `out`.
pub async fn run_with_output<W: Write>(args: CliArgs, out: &mut W) -> Result<()> {
    let mut raw = load_raw_or_default(&args.config)?;
    apply_cli_overrides(&mut raw, &args);
    let cfg = ConfigFile::try_from(raw)?;
    debug!(?cfg, "configuration loaded");

    if args.dry_run {
        return print_dry_run(&args, out).await;
    }

    let store = Arc::new(InMemoryStore::new());
    let ledger = SubmissionLedger::new();
    let orchestrator = Orchestrator::start(store.clone(), cfg.options());
    let injector = orchestrator.injector();

    let mut outcomes = Vec::with_capacity(args.expressions.len());
    for expression in &args.expressions {
        let request = match args.owner.as_deref() {
            Some(owner) => SubmitRequest::new(expression).owned_by(owner),
            None => SubmitRequest::new(expression),
        };

        match submit_expression(store.as_ref(), &ledger, request).await {
            Ok(submission) => {
                if let Err(e) = injector.submit_all(&submission.operations).await {
                    let _ = orchestrator.shutdown().await;
                    return Err(e.into());
                }
                outcomes.push(Outcome::Submitted(submission.root));
            }
            Err(CalcdagError::ParseError(msg)) => {
                warn!(expression = %expression, error = %msg, "expression rejected");
                outcomes.push(Outcome::Rejected {
                    expression: expression.clone(),
                    error: msg,
                });
            }
            Err(e) => {
                let _ = orchestrator.shutdown().await;
                return Err(e.into());
            }
        }
    }

    let roots: Vec<OperationId> = outcomes
        .iter()
        .filter_map(|o| match o {
            Outcome::Submitted(id) => Some(*id),
            Outcome::Rejected { .. } => None,
        })
        .collect();

    let failed = orchestrator.shutdown_token();
    let settled = tokio::select! {
        res = wait_for_terminal(store.as_ref(), &roots, SETTLE_CHECK_EVERY) => res.map(|_| ()),
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received; shutting down");
            Ok(())
        }
        _ = failed.cancelled() => Ok(()),
    };

    orchestrator.shutdown().await?;
    settled?;

    print_reports(out, store.as_ref(), &outcomes, args.json)?;

    let rejected = outcomes
        .iter()
        .filter(|o| matches!(o, Outcome::Rejected { .. }))
        .count();
    if rejected > 0 {
        return Err(anyhow!("{rejected} expression(s) could not be parsed"));
    }
    Ok(())
}

enum Outcome {
    Submitted(OperationId),
    Rejected { expression: String, error: String },
}

fn apply_cli_overrides(raw: &mut RawConfigFile, args: &CliArgs) {
    if let Some(workers) = args.workers {
        raw.orchestrator.worker_count = workers;
    }
    if let Some(ref d) = args.operation_duration {
        raw.orchestrator.operation_duration = d.clone();
    }
    if let Some(ref d) = args.poll_interval {
        raw.orchestrator.poll_interval = d.clone();
    }
}

fn print_reports<W: Write>(
    out: &mut W,
    store: &dyn OperationStore,
    outcomes: &[Outcome],
    json: bool,
) -> Result<()> {
    for outcome in outcomes {
        match outcome {
            Outcome::Submitted(root) => {
                let report = OperationReport::from(&store.get(*root)?);
                if json {
                    writeln!(out, "{}", serde_json::to_string(&report)?)?;
                } else {
                    writeln!(out, "{}", report.to_line())?;
                }
            }
            Outcome::Rejected { expression, error } => {
                if json {
                    let value = serde_json::json!({
                        "kind": "expression",
                        "expression": expression,
                        "state": "rejected",
                        "status": format!("error: {error}"),
                    });
                    writeln!(out, "{value}")?;
                } else {
                    writeln!(out, "{expression}: error: {error}")?;
                }
            }
        }
    }
    Ok(())
}

/// Print the operations each expression would be split into.
async fn print_dry_run<W: Write>(args: &CliArgs, out: &mut W) -> Result<()> {
    let scratch = InMemoryStore::new();
    let ledger = SubmissionLedger::new();

    writeln!(out, "calcdag dry-run")?;
    for expression in &args.expressions {
        writeln!(out)?;
        writeln!(out, "{expression}")?;
        match submit_expression(&scratch, &ledger, SubmitRequest::new(expression)).await {
            Ok(submission) => {
                for id in &submission.operations {
                    let op = scratch.get(*id)?;
                    let marker = if *id == submission.root { " (root)" } else { "" };
                    writeln!(out, "  {op}{marker}")?;
                }
            }
            Err(CalcdagError::ParseError(msg)) => writeln!(out, "  error: {msg}")?,
            Err(e) => return Err(e.into()),
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
