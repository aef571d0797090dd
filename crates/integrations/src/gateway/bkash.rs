//! bKash merchant transaction search.
//!
//! `GET /v1/transactions?fromDate=..&toDate=..&page=..&pageSize=..` with
//! inclusive ISO dates. Pages are numbered from 1 and the response carries
//! `totalPages`. Amounts are decimal strings in major units.

use chrono::{DateTime, NaiveDate, Utc};
use ledgerkeep_core::payment::{GatewayError, PaymentProvider, ProviderTransaction};
use serde_json::Value;

use super::{HttpPaymentGateway, array_field, decimal_field, decode_error, str_field};

const PROVIDER: PaymentProvider = PaymentProvider::Bkash;
const PATH: &str = "/v1/transactions";
const PAGE_SIZE: u32 = 100;
const DEFAULT_CURRENCY: &str = "BDT";

pub(super) async fn fetch(
    gateway: &HttpPaymentGateway,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ProviderTransaction>, GatewayError> {
    let mut transactions = Vec::new();
    let mut page: u64 = 1;

    loop {
        let query = [
            ("fromDate", start.format("%Y-%m-%d").to_string()),
            ("toDate", end.format("%Y-%m-%d").to_string()),
            ("page", page.to_string()),
            ("pageSize", PAGE_SIZE.to_string()),
        ];
        let body = gateway.get_json(PROVIDER, PATH, &query).await?;
        let items = array_field(PROVIDER, &body, "transactions")?;
        for item in items {
            transactions.push(parse_transaction(item)?);
        }

        let total_pages = body.get("totalPages").and_then(Value::as_u64).unwrap_or(1);
        if items.is_empty() || page >= total_pages {
            break;
        }
        page += 1;
    }

    Ok(transactions)
}

fn parse_transaction(item: &Value) -> Result<ProviderTransaction, GatewayError> {
    let completed = str_field(PROVIDER, item, "completedTime")?;
    let timestamp = DateTime::parse_from_rfc3339(completed)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| decode_error(PROVIDER, format!("bad 'completedTime' {completed:?}: {e}")))?;

    Ok(ProviderTransaction {
        transaction_id: str_field(PROVIDER, item, "trxID")?.to_string(),
        amount: decimal_field(PROVIDER, item, "amount")?,
        currency: item
            .get("currency")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_CURRENCY)
            .to_uppercase(),
        status: str_field(PROVIDER, item, "transactionStatus")?.to_string(),
        description: item
            .get("merchantInvoiceNumber")
            .and_then(Value::as_str)
            .map(|invoice| format!("Invoice {invoice}")),
        timestamp,
        metadata: Some(item.clone()),
    })
}
