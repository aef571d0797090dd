//! Ledgerkeep worker.
//!
//! Runs the scheduled reconciliation, verification and dispute expiry jobs,
//! and exposes each operation as a one-shot command for operators:
//!
//!   ledgerkeep-worker run                  - Scheduler loop until Ctrl-C
//!   ledgerkeep-worker reconcile            - Reconcile yesterday for every provider
//!   ledgerkeep-worker verify               - Nightly ledger verification
//!   ledgerkeep-worker expire-disputes      - Expire disputes past their evidence deadline
//!   ledgerkeep-worker dispute-event        - Apply a dispute webhook read as JSON

mod app;
mod scheduler;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use ledgerkeep_core::dispute::{DisputeEvent, DisputeOutcome};
use ledgerkeep_core::payment::PaymentProvider;
use ledgerkeep_shared::types::DiscrepancyId;
use ledgerkeep_shared::{AppConfig, AppError};
use serde::Serialize;
use serde_json::json;
use tokio::io::AsyncReadExt;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::Services;

#[derive(Parser, Debug)]
#[command(name = "ledgerkeep-worker", version, about = "Marketplace ledger jobs and operator commands")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the scheduled jobs until Ctrl-C
    Run,

    /// Reconcile provider feeds against recorded transactions
    Reconcile {
        /// Provider to reconcile (STRIPE, BKASH, NAGAD); all providers when omitted
        #[arg(long, short = 'p', value_parser = parse_provider)]
        provider: Option<PaymentProvider>,

        /// Single day to reconcile (defaults to yesterday, UTC)
        #[arg(long, short = 'd', conflicts_with_all = ["start", "end"])]
        date: Option<NaiveDate>,

        /// First day of a manual range
        #[arg(long, requires = "end", requires = "provider")]
        start: Option<NaiveDate>,

        /// Last day of a manual range, inclusive
        #[arg(long, requires = "start")]
        end: Option<NaiveDate>,
    },

    /// Cancel a pending or running reconciliation job
    CancelJob {
        /// Human-readable job ID
        job_id: String,
    },

    /// List discrepancies, unresolved ones by default
    Discrepancies {
        /// Only discrepancies recorded by this job
        #[arg(long)]
        job: Option<String>,
    },

    /// Mark a discrepancy as resolved
    ResolveDiscrepancy {
        /// Discrepancy UUID
        id: DiscrepancyId,

        /// Who resolved it
        #[arg(long)]
        resolver: String,

        /// Resolution notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Run the nightly ledger verification once
    Verify,

    /// Expire disputes whose evidence deadline has passed
    ExpireDisputes,

    /// Apply one dispute event (JSON, tagged by "event")
    DisputeEvent {
        /// File holding the event; stdin when omitted
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },

    /// Record that evidence was submitted for a dispute
    SubmitEvidence {
        /// Provider that raised the dispute
        #[arg(long, short = 'p', value_parser = parse_provider)]
        provider: PaymentProvider,

        /// Provider-side dispute ID
        #[arg(long)]
        dispute_id: String,
    },
}

fn parse_provider(value: &str) -> Result<PaymentProvider, String> {
    PaymentProvider::parse(value).ok_or_else(|| {
        let known: Vec<_> = PaymentProvider::ALL.iter().map(|p| p.as_str()).collect();
        format!("unknown provider {value:?}, expected one of {}", known.join(", "))
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "ledgerkeep=debug".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries command output
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match execute(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format_args!("{err:#}"), "Command failed");
            let code = err.downcast_ref::<AppError>().map_or(1, AppError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn execute(command: Command) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let services = Services::build(&config).await?;

    match command {
        Command::Run => {
            scheduler::run(&services, &config.scheduler).await;
        }
        Command::Reconcile {
            provider,
            date,
            start,
            end,
        } => {
            let jobs = match (provider, start.zip(end)) {
                (Some(provider), Some((start, end))) => vec![
                    services
                        .reconciliation
                        .run_manual_reconciliation(provider, start, end)
                        .await
                        .map_err(AppError::from)?,
                ],
                (Some(provider), None) => {
                    let day = date.unwrap_or_else(|| scheduler::previous_day(Utc::now()));
                    vec![
                        services
                            .reconciliation
                            .run_manual_reconciliation(provider, day, day)
                            .await
                            .map_err(AppError::from)?,
                    ]
                }
                (None, _) => {
                    let day = date.unwrap_or_else(|| scheduler::previous_day(Utc::now()));
                    services.reconciliation.run_daily_reconciliation(day).await
                }
            };
            print_json(&jobs)?;
        }
        Command::CancelJob { job_id } => {
            let job = services
                .reconciliation
                .cancel_job(&job_id)
                .await
                .map_err(AppError::from)?;
            print_json(&job)?;
        }
        Command::Discrepancies { job } => {
            let found = match job {
                Some(job_id) => services.reconciliation.discrepancies_for_job(&job_id).await,
                None => services.reconciliation.unresolved_discrepancies().await,
            }
            .map_err(AppError::from)?;
            print_json(&found)?;
        }
        Command::ResolveDiscrepancy {
            id,
            resolver,
            notes,
        } => {
            let resolved = services
                .reconciliation
                .resolve_discrepancy(id, &resolver, notes)
                .await
                .map_err(AppError::from)?;
            print_json(&resolved)?;
        }
        Command::Verify => {
            let report = services
                .verification
                .run_nightly_verification()
                .await
                .map_err(AppError::from)?;
            print_json(&report)?;
            if !report.all_passed() {
                return Err(AppError::BusinessRule(format!(
                    "{} verification check(s) failed",
                    report.failures().count()
                ))
                .into());
            }
        }
        Command::ExpireDisputes => {
            let expired = services
                .disputes
                .expire_overdue(Utc::now())
                .await
                .map_err(AppError::from)?;
            info!(count = expired.len(), "Dispute expiry sweep finished");
            print_json(&expired)?;
        }
        Command::DisputeEvent { file } => {
            let raw = read_input(file).await?;
            let event: DisputeEvent = serde_json::from_str(&raw)
                .map_err(|e| AppError::Validation(format!("dispute event: {e}")))?;
            let outcome = services
                .disputes
                .handle_event(event)
                .await
                .map_err(AppError::from)?;
            print_json(&describe_outcome(&outcome))?;
        }
        Command::SubmitEvidence {
            provider,
            dispute_id,
        } => {
            let dispute = services
                .disputes
                .submit_evidence(provider, &dispute_id)
                .await
                .map_err(AppError::from)?;
            print_json(&dispute)?;
        }
    }

    Ok(())
}

async fn read_input(file: Option<PathBuf>) -> anyhow::Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("reading stdin")?;
            Ok(raw)
        }
    }
}

fn describe_outcome(outcome: &DisputeOutcome) -> serde_json::Value {
    match outcome {
        DisputeOutcome::Created { dispute, freeze } => json!({
            "outcome": "created",
            "dispute": dispute,
            "freeze_posting": freeze.map(|p| p.to_string()),
        }),
        DisputeOutcome::Duplicate(dispute) => json!({ "outcome": "duplicate", "dispute": dispute }),
        DisputeOutcome::Updated(dispute) => json!({ "outcome": "updated", "dispute": dispute }),
        DisputeOutcome::Closed {
            dispute,
            settlement,
        } => json!({
            "outcome": "closed",
            "dispute": dispute,
            "settlement_posting": settlement.map(|p| p.to_string()),
        }),
        DisputeOutcome::Ignored { reason } => json!({ "outcome": "ignored", "reason": reason }),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{out}");
    Ok(())
}
