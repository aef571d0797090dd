//! Nagad merchant settlement report.
//!
//! `GET /api/v1/merchant/transactions?dateFrom=YYYYMMDD&dateTo=YYYYMMDD`
//! returns the whole range in one `data` array. Timestamps are
//! `yyyyMMddHHmmss` in Bangladesh time and every amount is in taka.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, Utc};
use ledgerkeep_core::payment::{GatewayError, PaymentProvider, ProviderTransaction};
use serde_json::Value;

use super::{HttpPaymentGateway, array_field, decimal_field, decode_error, str_field};

const PROVIDER: PaymentProvider = PaymentProvider::Nagad;
const PATH: &str = "/api/v1/merchant/transactions";
const CURRENCY: &str = "BDT";
const DHAKA_OFFSET_SECS: i32 = 6 * 3600;

pub(super) async fn fetch(
    gateway: &HttpPaymentGateway,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ProviderTransaction>, GatewayError> {
    let query = [
        ("dateFrom", start.format("%Y%m%d").to_string()),
        ("dateTo", end.format("%Y%m%d").to_string()),
    ];
    let body = gateway.get_json(PROVIDER, PATH, &query).await?;
    array_field(PROVIDER, &body, "data")?
        .iter()
        .map(parse_transaction)
        .collect()
}

fn parse_transaction(item: &Value) -> Result<ProviderTransaction, GatewayError> {
    let issued = str_field(PROVIDER, item, "issuerPaymentDateTime")?;

    Ok(ProviderTransaction {
        transaction_id: str_field(PROVIDER, item, "paymentRefId")?.to_string(),
        amount: decimal_field(PROVIDER, item, "amount")?,
        currency: CURRENCY.to_string(),
        status: str_field(PROVIDER, item, "status")?.to_string(),
        description: item
            .get("orderId")
            .and_then(Value::as_str)
            .map(|order| format!("Order {order}")),
        timestamp: parse_dhaka_timestamp(issued)?,
        metadata: Some(item.clone()),
    })
}

fn parse_dhaka_timestamp(value: &str) -> Result<chrono::DateTime<Utc>, GatewayError> {
    let bad = || decode_error(PROVIDER, format!("bad 'issuerPaymentDateTime' {value:?}"));
    let offset = FixedOffset::east_opt(DHAKA_OFFSET_SECS).ok_or_else(bad)?;
    let local = NaiveDateTime::parse_from_str(value, "%Y%m%d%H%M%S").map_err(|_| bad())?;
    local
        .and_local_timezone(offset)
        .single()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(bad)
}
