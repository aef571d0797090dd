//! Timer loop driving the scheduled jobs.
//!
//! Each tick runs one unit of work to completion before the next is
//! picked up. Failures are logged and the loop keeps going.

use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, Utc};
use ledgerkeep_shared::config::SchedulerConfig;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{error, info};

use crate::app::Services;

/// Runs until Ctrl-C.
pub async fn run(services: &Services, config: &SchedulerConfig) {
    let mut reconciliation = ticker(config.reconciliation_interval_secs);
    let mut verification = ticker(config.verification_interval_secs);
    let mut expiry = ticker(config.dispute_expiry_interval_secs);

    info!(
        reconciliation_secs = config.reconciliation_interval_secs,
        verification_secs = config.verification_interval_secs,
        dispute_expiry_secs = config.dispute_expiry_interval_secs,
        "Scheduler started"
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received, scheduler stopping");
                break;
            }
            _ = reconciliation.tick() => {
                let date = previous_day(Utc::now());
                let jobs = services.reconciliation.run_daily_reconciliation(date).await;
                info!(%date, jobs = jobs.len(), "Daily reconciliation finished");
            }
            _ = verification.tick() => {
                match services.verification.run_nightly_verification().await {
                    Ok(report) => info!(
                        passed = report.all_passed(),
                        entries = report.entries_checked,
                        "Nightly verification finished"
                    ),
                    Err(e) => error!(error = %e, code = e.error_code(), "Nightly verification could not read the ledger"),
                }
            }
            _ = expiry.tick() => {
                match services.disputes.expire_overdue(Utc::now()).await {
                    Ok(expired) if expired.is_empty() => {}
                    Ok(expired) => info!(count = expired.len(), "Overdue disputes expired"),
                    Err(e) => error!(error = %e, code = e.error_code(), "Dispute expiry sweep failed"),
                }
            }
        }
    }
}

/// First tick one full period from now.
fn ticker(period_secs: u64) -> Interval {
    let period = Duration::from_secs(period_secs.max(1));
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// The last complete UTC day before `now`.
pub fn previous_day(now: DateTime<Utc>) -> NaiveDate {
    let today = now.date_naive();
    today.checked_sub_days(Days::new(1)).unwrap_or(today)
}
