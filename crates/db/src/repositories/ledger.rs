//! Ledger repository backed by Postgres.
//!
//! A posting is written in one database transaction. Running balances are
//! versioned per (account type, currency); the unique version index turns a
//! concurrent writer into a `ConcurrentModification`, and the posting is
//! retried from scratch. Keyed postings insert their key in the same
//! transaction, so a retried attempt finds the winner's posting.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ledgerkeep_core::ledger::{
    AccountType, BalanceKey, EntryType, LedgerEntry, LedgerEntryDraft, LedgerError,
    LedgerSnapshot, LedgerStore, MaintainedBalance, PostingReceipt, RunningBalance,
    validate_posting,
};
use ledgerkeep_shared::types::{LedgerEntryId, PostingId};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, IntoCondition};
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, IsolationLevel, QueryFilter, QueryOrder, QuerySelect,
    Set, SqlErr, TransactionTrait,
};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::convert::{to_db, to_utc, to_utc_opt};
use crate::entities::{ledger_entries, ledger_posting_keys};

/// Attempts per posting before a version conflict is returned to the caller.
pub const MAX_POST_ATTEMPTS: u32 = 3;

/// Ledger store over the `ledger_entries` table.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn post_with_retry(
        &self,
        key: Option<&str>,
        drafts: &[LedgerEntryDraft],
    ) -> Result<PostingReceipt, LedgerError> {
        let mut attempt = 1;
        loop {
            match self.try_post(key, drafts).await {
                Err(LedgerError::ConcurrentModification) if attempt < MAX_POST_ATTEMPTS => {
                    warn!(attempt, "Running balance conflict, retrying posting");
                    attempt += 1;
                }
                Ok(receipt) => {
                    debug!(
                        posting_id = %receipt.posting_id,
                        replayed = receipt.replayed,
                        "Posting written"
                    );
                    return Ok(receipt);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_post(
        &self,
        key: Option<&str>,
        drafts: &[LedgerEntryDraft],
    ) -> Result<PostingReceipt, LedgerError> {
        let txn = self.db.begin().await.map_err(ledger_error)?;
        let posting_id = PostingId::new();
        let now = Utc::now();

        if let Some(key) = key {
            let existing = ledger_posting_keys::Entity::find_by_id(key.to_string())
                .one(&txn)
                .await
                .map_err(ledger_error)?;
            if let Some(existing) = existing {
                let entries = find_entries(
                    &txn,
                    ledger_entries::Column::PostingId.eq(existing.posting_id),
                )
                .await?;
                txn.commit().await.map_err(ledger_error)?;
                return Ok(PostingReceipt {
                    posting_id: PostingId::from_uuid(existing.posting_id),
                    entries,
                    replayed: true,
                });
            }

            ledger_posting_keys::ActiveModel {
                posting_key: Set(key.to_string()),
                posting_id: Set(posting_id.into_inner()),
                created_at: Set(to_db(now)),
            }
            .insert(&txn)
            .await
            .map_err(ledger_error)?;
        }

        let mut running: HashMap<BalanceKey, RunningBalance> = HashMap::new();
        let mut entries = Vec::with_capacity(drafts.len());

        for draft in drafts {
            let currency = draft.currency.to_uppercase();
            let key = (draft.account_type, currency.clone());
            let previous = match running.get(&key) {
                Some(balance) => Some(*balance),
                None => latest_balance(&txn, draft.account_type, &currency).await?,
            };
            let balance = RunningBalance::advance(
                previous.as_ref(),
                draft.account_type.balance_change(draft.entry_type, draft.amount),
            );
            running.insert(key, balance);

            let model = ledger_entries::ActiveModel {
                id: Set(LedgerEntryId::new().into_inner()),
                posting_id: Set(posting_id.into_inner()),
                transaction_id: Set(draft.transaction_id.clone()),
                order_id: Set(draft.order_id.clone()),
                account_type: Set(draft.account_type.as_str().to_string()),
                entry_type: Set(draft.entry_type.as_str().to_string()),
                amount: Set(draft.amount),
                currency: Set(currency),
                description: Set(draft.description.clone()),
                reference: Set(draft.reference.clone()),
                metadata: Set(draft.metadata.clone()),
                verified: Set(false),
                verified_by: Set(None),
                verified_at: Set(None),
                effective_date: Set(draft.effective_date),
                account_version: Set(balance.account_version),
                previous_balance: Set(balance.previous_balance),
                current_balance: Set(balance.current_balance),
                created_at: Set(to_db(now)),
                updated_at: Set(to_db(now)),
            };
            let inserted = model.insert(&txn).await.map_err(ledger_error)?;
            entries.push(entry_from_model(inserted)?);
        }

        txn.commit().await.map_err(ledger_error)?;
        Ok(PostingReceipt {
            posting_id,
            entries,
            replayed: false,
        })
    }
}

#[async_trait]
impl LedgerStore for LedgerRepository {
    #[instrument(skip(self, drafts), fields(entries = drafts.len()))]
    async fn post(&self, drafts: Vec<LedgerEntryDraft>) -> Result<PostingReceipt, LedgerError> {
        validate_posting(&drafts)?;
        self.post_with_retry(None, &drafts).await
    }

    #[instrument(skip(self, drafts), fields(entries = drafts.len()))]
    async fn post_once(
        &self,
        key: &str,
        drafts: Vec<LedgerEntryDraft>,
    ) -> Result<PostingReceipt, LedgerError> {
        validate_posting(&drafts)?;
        self.post_with_retry(Some(key), &drafts).await
    }

    async fn balance_of(&self, account_type: AccountType) -> Result<Decimal, LedgerError> {
        reported_balance(&self.db, account_type).await
    }

    async fn entries_for_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        find_entries(&self.db, ledger_entries::Column::TransactionId.eq(transaction_id)).await
    }

    async fn entries_for_posting(
        &self,
        posting_id: PostingId,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let entries = find_entries(
            &self.db,
            ledger_entries::Column::PostingId.eq(posting_id.into_inner()),
        )
        .await?;
        if entries.is_empty() {
            return Err(LedgerError::PostingNotFound(posting_id));
        }
        Ok(entries)
    }

    async fn all_entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        find_entries(&self.db, Expr::value(true)).await
    }

    async fn maintained_balances(&self) -> Result<Vec<MaintainedBalance>, LedgerError> {
        maintained_balances(&self.db).await
    }

    /// Reads inside one REPEATABLE READ, read-only transaction.
    async fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::RepeatableRead), Some(AccessMode::ReadOnly))
            .await
            .map_err(ledger_error)?;

        let entries = find_entries(&txn, Expr::value(true)).await?;
        let mut reported = BTreeMap::new();
        for account in AccountType::ALL {
            reported.insert(account, reported_balance(&txn, account).await?);
        }
        let maintained = maintained_balances(&txn).await?;

        txn.commit().await.map_err(ledger_error)?;
        Ok(LedgerSnapshot {
            entries,
            reported,
            maintained,
        })
    }

    async fn mark_verified(
        &self,
        ids: &[LedgerEntryId],
        verifier: &str,
        at: DateTime<Utc>,
    ) -> Result<u64, LedgerError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids: Vec<Uuid> = ids.iter().map(|id| id.into_inner()).collect();
        let result = ledger_entries::Entity::update_many()
            .col_expr(ledger_entries::Column::Verified, Expr::value(true))
            .col_expr(ledger_entries::Column::VerifiedBy, Expr::value(verifier))
            .col_expr(ledger_entries::Column::VerifiedAt, Expr::value(to_db(at)))
            .col_expr(ledger_entries::Column::UpdatedAt, Expr::value(to_db(at)))
            .filter(ledger_entries::Column::Id.is_in(ids))
            .filter(ledger_entries::Column::Verified.eq(false))
            .exec(&self.db)
            .await
            .map_err(ledger_error)?;
        Ok(result.rows_affected)
    }
}

async fn find_entries<C: ConnectionTrait>(
    conn: &C,
    filter: impl IntoCondition,
) -> Result<Vec<LedgerEntry>, LedgerError> {
    ledger_entries::Entity::find()
        .filter(filter)
        .order_by_asc(ledger_entries::Column::CreatedAt)
        .order_by_asc(ledger_entries::Column::AccountVersion)
        .all(conn)
        .await
        .map_err(ledger_error)?
        .into_iter()
        .map(entry_from_model)
        .collect()
}

async fn reported_balance<C: ConnectionTrait>(
    conn: &C,
    account_type: AccountType,
) -> Result<Decimal, LedgerError> {
    let rows: Vec<(String, Decimal)> = ledger_entries::Entity::find()
        .filter(ledger_entries::Column::AccountType.eq(account_type.as_str()))
        .select_only()
        .column(ledger_entries::Column::EntryType)
        .column(ledger_entries::Column::Amount)
        .into_tuple()
        .all(conn)
        .await
        .map_err(ledger_error)?;

    rows.into_iter().try_fold(Decimal::ZERO, |sum, (entry_type, amount)| {
        Ok(match parse_entry_type(&entry_type)? {
            EntryType::Debit => sum + amount,
            EntryType::Credit => sum - amount,
        })
    })
}

async fn maintained_balances<C: ConnectionTrait>(
    conn: &C,
) -> Result<Vec<MaintainedBalance>, LedgerError> {
    let rows = ledger_entries::Entity::find()
        .distinct_on([
            ledger_entries::Column::AccountType,
            ledger_entries::Column::Currency,
        ])
        .order_by_asc(ledger_entries::Column::AccountType)
        .order_by_asc(ledger_entries::Column::Currency)
        .order_by_desc(ledger_entries::Column::AccountVersion)
        .all(conn)
        .await
        .map_err(ledger_error)?;

    rows.into_iter()
        .map(|row| {
            Ok(MaintainedBalance {
                account_type: parse_account_type(&row.account_type)?,
                currency: row.currency,
                balance: RunningBalance {
                    account_version: row.account_version,
                    previous_balance: row.previous_balance,
                    current_balance: row.current_balance,
                },
            })
        })
        .collect()
}

/// Latest running balance of an account, read inside the posting transaction.
async fn latest_balance(
    txn: &DatabaseTransaction,
    account_type: AccountType,
    currency: &str,
) -> Result<Option<RunningBalance>, LedgerError> {
    let latest = ledger_entries::Entity::find()
        .filter(ledger_entries::Column::AccountType.eq(account_type.as_str()))
        .filter(ledger_entries::Column::Currency.eq(currency))
        .order_by_desc(ledger_entries::Column::AccountVersion)
        .limit(1)
        .one(txn)
        .await
        .map_err(ledger_error)?;

    Ok(latest.map(|row| RunningBalance {
        account_version: row.account_version,
        previous_balance: row.previous_balance,
        current_balance: row.current_balance,
    }))
}

fn ledger_error(err: DbErr) -> LedgerError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => LedgerError::ConcurrentModification,
        _ => LedgerError::Storage(err.to_string()),
    }
}

fn parse_account_type(value: &str) -> Result<AccountType, LedgerError> {
    AccountType::parse(value)
        .ok_or_else(|| LedgerError::Storage(format!("invalid account_type {value:?} in database")))
}

fn parse_entry_type(value: &str) -> Result<EntryType, LedgerError> {
    EntryType::parse(value)
        .ok_or_else(|| LedgerError::Storage(format!("invalid entry_type {value:?} in database")))
}

fn entry_from_model(row: ledger_entries::Model) -> Result<LedgerEntry, LedgerError> {
    Ok(LedgerEntry {
        id: LedgerEntryId::from_uuid(row.id),
        posting_id: PostingId::from_uuid(row.posting_id),
        transaction_id: row.transaction_id,
        order_id: row.order_id,
        account_type: parse_account_type(&row.account_type)?,
        entry_type: parse_entry_type(&row.entry_type)?,
        amount: row.amount,
        currency: row.currency,
        description: row.description,
        reference: row.reference,
        metadata: row.metadata,
        verified: row.verified,
        verified_by: row.verified_by,
        verified_at: to_utc_opt(row.verified_at),
        effective_date: row.effective_date,
        account_version: row.account_version,
        previous_balance: row.previous_balance,
        current_balance: row.current_balance,
        created_at: to_utc(row.created_at),
        updated_at: to_utc(row.updated_at),
    })
}
