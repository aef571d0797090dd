//! HTTP gateway over the payment providers' settlement feeds.
//!
//! Each provider has its own request shape and JSON vocabulary; the
//! adapters in this module translate them into [`ProviderTransaction`]s.
//! Transport failures, timeouts, 429 and 5xx responses are retried with
//! exponential backoff before surfacing as a [`GatewayError`].

mod bkash;
mod nagad;
mod stripe;


use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use ledgerkeep_core::payment::{GatewayError, PaymentGateway, PaymentProvider, ProviderTransaction};
use ledgerkeep_shared::{AppConfig, ProviderEndpointConfig};
use reqwest::header::RETRY_AFTER;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Retries after the first attempt.
pub const MAX_RETRIES: u32 = 2;

const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);
const MAX_ERROR_BODY_CHARS: usize = 200;
const USER_AGENT: &str = concat!("ledgerkeep/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
struct Endpoint {
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl From<&ProviderEndpointConfig> for Endpoint {
    fn from(config: &ProviderEndpointConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// A failed attempt and the wait the provider asked for, if any.
struct FailedAttempt {
    error: GatewayError,
    retry_after: Option<Duration>,
}

impl From<GatewayError> for FailedAttempt {
    fn from(error: GatewayError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

/// Payment gateway calling the configured provider APIs over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    http: reqwest::Client,
    endpoints: HashMap<PaymentProvider, Endpoint>,
    retry_backoff: Duration,
}

impl HttpPaymentGateway {
    /// Creates a gateway with no provider configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()?;
        Ok(Self {
            http,
            endpoints: HashMap::new(),
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        })
    }

    /// Creates a gateway for every provider with a `providers.<code>` section.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let mut gateway = Self::new()?;
        for provider in PaymentProvider::ALL {
            if let Some(endpoint) = config.provider(provider.config_key()) {
                gateway = gateway.with_endpoint(provider, endpoint);
            }
        }
        Ok(gateway)
    }

    /// Sets the endpoint for one provider.
    #[must_use]
    pub fn with_endpoint(mut self, provider: PaymentProvider, config: &ProviderEndpointConfig) -> Self {
        self.endpoints.insert(provider, Endpoint::from(config));
        self
    }

    /// Sets the wait before the first retry; it doubles on each retry.
    #[must_use]
    pub const fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Returns true if the provider has an endpoint.
    #[must_use]
    pub fn is_configured(&self, provider: PaymentProvider) -> bool {
        self.endpoints.contains_key(&provider)
    }

    /// GETs a JSON document from a provider, retrying transient failures.
    async fn get_json(
        &self,
        provider: PaymentProvider,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, GatewayError> {
        let endpoint = self
            .endpoints
            .get(&provider)
            .ok_or(GatewayError::NotConfigured(provider))?;
        let url = format!("{}{path}", endpoint.base_url);

        let mut backoff = self.retry_backoff;
        let mut attempt = 0;
        loop {
            match self.send_once(provider, endpoint, &url, query).await {
                Ok(body) => return Ok(body),
                Err(failed) if failed.error.is_retryable() && attempt < MAX_RETRIES => {
                    let wait = failed.retry_after.unwrap_or(backoff);
                    attempt += 1;
                    warn!(
                        provider = %provider,
                        attempt,
                        wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                        error = %failed.error,
                        "Provider request failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    backoff = backoff.saturating_mul(2);
                }
                Err(failed) => return Err(failed.error),
            }
        }
    }

    async fn send_once(
        &self,
        provider: PaymentProvider,
        endpoint: &Endpoint,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Value, FailedAttempt> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&endpoint.api_key)
            .timeout(endpoint.timeout)
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error(provider, &e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let body = response.text().await.unwrap_or_default();
            return Err(FailedAttempt {
                error: GatewayError::UnexpectedStatus {
                    provider,
                    status: status.as_u16(),
                    body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
                },
                retry_after,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| transport_error(provider, &e))?;
        // Some providers prefix their JSON with a byte order mark
        serde_json::from_str(text.trim_start_matches('\u{feff}'))
            .map_err(|e| decode_error(provider, e.to_string()).into())
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[instrument(skip(self), fields(provider = %provider))]
    async fn fetch_transactions_by_date_range(
        &self,
        provider: PaymentProvider,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ProviderTransaction>, GatewayError> {
        let transactions = match provider {
            PaymentProvider::Stripe => stripe::fetch(self, start, end).await?,
            PaymentProvider::Bkash => bkash::fetch(self, start, end).await?,
            PaymentProvider::Nagad => nagad::fetch(self, start, end).await?,
        };
        debug!(%start, %end, count = transactions.len(), "Fetched provider feed");
        Ok(transactions)
    }
}

fn transport_error(provider: PaymentProvider, err: &reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout(provider)
    } else if err.is_decode() {
        decode_error(provider, err.to_string())
    } else {
        GatewayError::Request {
            provider,
            message: err.to_string(),
        }
    }
}

pub(crate) fn decode_error(provider: PaymentProvider, message: impl Into<String>) -> GatewayError {
    GatewayError::Decode {
        provider,
        message: message.into(),
    }
}

/// Array under `field` in a response body.
pub(crate) fn array_field<'a>(
    provider: PaymentProvider,
    body: &'a Value,
    field: &str,
) -> Result<&'a Vec<Value>, GatewayError> {
    body.get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| decode_error(provider, format!("response missing '{field}' array")))
}

/// Required string field of a feed item.
pub(crate) fn str_field<'a>(
    provider: PaymentProvider,
    item: &'a Value,
    field: &str,
) -> Result<&'a str, GatewayError> {
    item.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| decode_error(provider, format!("transaction missing '{field}'")))
}

/// Decimal amount sent either as a string or as a JSON number.
///
/// Numbers are parsed from their text so no binary float is involved.
pub(crate) fn decimal_field(
    provider: PaymentProvider,
    item: &Value,
    field: &str,
) -> Result<Decimal, GatewayError> {
    let text = match item.get(field) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(decode_error(provider, format!("transaction missing '{field}'"))),
    };
    text.parse::<Decimal>()
        .map_err(|e| decode_error(provider, format!("bad '{field}' {text:?}: {e}")))
}
