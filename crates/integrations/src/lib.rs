//! Outbound integrations for Ledgerkeep.
//!
//! - `gateway` - HTTP client for the Stripe, bKash and Nagad settlement feeds
//! - `email` - SMTP notification sink

pub mod email;
pub mod gateway;

use std::sync::Arc;

pub use email::EmailNotifier;
pub use gateway::HttpPaymentGateway;

use ledgerkeep_core::notify::{LoggingNotifier, NotificationSink};
use ledgerkeep_shared::{AppConfig, EmailService};

/// Emails alerts when SMTP is configured, otherwise only logs them.
#[must_use]
pub fn notifier_from_config(config: &AppConfig) -> Arc<dyn NotificationSink> {
    match &config.email {
        Some(email) => Arc::new(EmailNotifier::new(
            EmailService::new(email.clone()),
            &config.alerts,
        )),
        None => {
            tracing::info!("SMTP not configured, alerts will only be logged");
            Arc::new(LoggingNotifier)
        }
    }
}
