//! Stripe charges feed.
//!
//! `GET /v1/charges` with `created[gte]`/`created[lt]` epoch bounds and
//! cursor pagination through `starting_after`. Amounts arrive in minor
//! units and currencies in lowercase.

use chrono::{DateTime, NaiveDate};
use ledgerkeep_core::payment::{GatewayError, PaymentProvider, ProviderTransaction};
use ledgerkeep_core::reconciliation::utc_window;
use ledgerkeep_shared::types::minor_units_of;
use rust_decimal::Decimal;
use serde_json::Value;

use super::{HttpPaymentGateway, array_field, decode_error, str_field};

const PROVIDER: PaymentProvider = PaymentProvider::Stripe;
const PATH: &str = "/v1/charges";
const PAGE_LIMIT: u32 = 100;

pub(super) async fn fetch(
    gateway: &HttpPaymentGateway,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ProviderTransaction>, GatewayError> {
    let (from, to) = epoch_window(start, end);
    let mut transactions = Vec::new();
    let mut starting_after: Option<String> = None;

    loop {
        let mut query = vec![
            ("created[gte]", from.to_string()),
            ("created[lt]", to.to_string()),
            ("limit", PAGE_LIMIT.to_string()),
        ];
        if let Some(after) = &starting_after {
            query.push(("starting_after", after.clone()));
        }

        let body = gateway.get_json(PROVIDER, PATH, &query).await?;
        let data = array_field(PROVIDER, &body, "data")?;
        let has_more = body.get("has_more").and_then(Value::as_bool).unwrap_or(false);

        if has_more && data.is_empty() {
            return Err(decode_error(PROVIDER, "has_more=true with an empty page"));
        }
        for item in data {
            transactions.push(parse_charge(item)?);
        }
        if !has_more {
            break;
        }

        let last_id = data
            .last()
            .and_then(|item| item.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| decode_error(PROVIDER, "charge missing 'id' for pagination"))?;
        if starting_after.as_deref() == Some(last_id.as_str()) {
            return Err(decode_error(
                PROVIDER,
                format!("pagination stuck: starting_after={last_id} repeated"),
            ));
        }
        starting_after = Some(last_id);
    }

    Ok(transactions)
}

/// The UTC day window as Unix seconds.
fn epoch_window(start: NaiveDate, end: NaiveDate) -> (i64, i64) {
    let (from, to) = utc_window(start, end);
    (from.timestamp(), to.timestamp())
}

fn parse_charge(item: &Value) -> Result<ProviderTransaction, GatewayError> {
    let currency = str_field(PROVIDER, item, "currency")?.to_uppercase();
    let minor = item
        .get("amount")
        .and_then(Value::as_i64)
        .ok_or_else(|| decode_error(PROVIDER, "charge missing integer 'amount'"))?;
    let created = item
        .get("created")
        .and_then(Value::as_i64)
        .ok_or_else(|| decode_error(PROVIDER, "charge missing 'created'"))?;
    let timestamp = DateTime::from_timestamp(created, 0)
        .ok_or_else(|| decode_error(PROVIDER, format!("bad 'created' {created}")))?;

    Ok(ProviderTransaction {
        transaction_id: str_field(PROVIDER, item, "id")?.to_string(),
        amount: Decimal::new(minor, minor_units_of(&currency)),
        status: str_field(PROVIDER, item, "status")?.to_string(),
        description: item
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        timestamp,
        metadata: item.get("metadata").filter(|m| !m.is_null()).cloned(),
        currency,
    })
}
