//! Application configuration management.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::AppResult;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// SMTP configuration; alerts are only logged when absent.
    #[serde(default)]
    pub email: Option<EmailConfig>,
    /// Payment provider feed endpoints keyed by provider code (`stripe`, `bkash`, `nagad`).
    #[serde(default)]
    pub providers: HashMap<String, ProviderEndpointConfig>,
    /// Scheduler intervals.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Alert routing.
    #[serde(default)]
    pub alerts: AlertConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Endpoint of one payment provider's transaction feed.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEndpointConfig {
    /// Base URL of the provider API.
    pub base_url: String,
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Request timeout in seconds.
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

fn default_provider_timeout() -> u64 {
    30
}

/// Scheduler intervals for the worker loop.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between daily reconciliation runs.
    #[serde(default = "default_daily_interval")]
    pub reconciliation_interval_secs: u64,
    /// Seconds between nightly verification runs.
    #[serde(default = "default_daily_interval")]
    pub verification_interval_secs: u64,
    /// Seconds between overdue-dispute sweeps.
    #[serde(default = "default_dispute_expiry_interval")]
    pub dispute_expiry_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reconciliation_interval_secs: default_daily_interval(),
            verification_interval_secs: default_daily_interval(),
            dispute_expiry_interval_secs: default_dispute_expiry_interval(),
        }
    }
}

fn default_daily_interval() -> u64 {
    86_400 // 24 hours
}

fn default_dispute_expiry_interval() -> u64 {
    3_600 // 1 hour
}

/// Who receives finance alerts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertConfig {
    /// Finance team addresses for reconciliation and verification alerts.
    #[serde(default)]
    pub finance_recipients: Vec<String>,
    /// Operations addresses for dispute alerts.
    #[serde(default)]
    pub dispute_recipients: Vec<String>,
}

/// SMTP configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay host.
    pub smtp_host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: String,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: String,
    /// Sender address.
    pub from_email: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Ledgerkeep".to_string()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "ledger@localhost".to_string(),
            from_name: default_from_name(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> AppResult<Self> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("LEDGERKEEP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Returns the feed endpoint configured for a provider code.
    #[must_use]
    pub fn provider(&self, code: &str) -> Option<&ProviderEndpointConfig> {
        self.providers.get(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("RUN_MODE", Some("test-env-only")),
                ("LEDGERKEEP__DATABASE__URL", Some("postgres://localhost/ledger")),
                ("LEDGERKEEP__SCHEDULER__DISPUTE_EXPIRY_INTERVAL_SECS", Some("120")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/ledger");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.scheduler.dispute_expiry_interval_secs, 120);
                assert_eq!(config.scheduler.reconciliation_interval_secs, 86_400);
                assert!(config.email.is_none());
                assert!(config.provider("stripe").is_none());
            },
        );
    }

    #[test]
    fn test_missing_database_url_is_configuration_error() {
        temp_env::with_vars(
            [
                ("RUN_MODE", Some("test-env-only")),
                ("LEDGERKEEP__DATABASE__URL", None::<&str>),
            ],
            || {
                let err = AppConfig::load().unwrap_err();
                assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
            },
        );
    }

    #[test]
    fn test_email_config_default() {
        let config = EmailConfig::default();
        assert_eq!(config.smtp_host, "localhost");
        assert_eq!(config.smtp_port, 1025);
    }
}
