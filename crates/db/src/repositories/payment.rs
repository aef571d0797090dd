//! Payment transaction repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ledgerkeep_core::payment::{
    PaymentProvider, Transaction, TransactionStatus, TransactionStore, TransactionType,
};
use ledgerkeep_core::persistence::StoreError;
use ledgerkeep_shared::types::PaymentTransactionId;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::convert::{parse_column, store_error, to_db, to_db_opt, to_utc, to_utc_opt};
use crate::entities::payment_transactions;

/// Store of payment transactions recorded by the payment service.
#[derive(Debug, Clone)]
pub struct PaymentTransactionRepository {
    db: DatabaseConnection,
}

impl PaymentTransactionRepository {
    /// Creates a new payment transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a transaction. `Conflict` if its shared ID already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn insert(&self, txn: &Transaction) -> Result<(), StoreError> {
        let now = to_db(Utc::now());
        payment_transactions::ActiveModel {
            id: Set(txn.id.into_inner()),
            transaction_id: Set(txn.transaction_id.clone()),
            provider: Set(txn.provider.as_str().to_string()),
            transaction_type: Set(txn.transaction_type.as_str().to_string()),
            status: Set(txn.status.as_str().to_string()),
            amount: Set(txn.amount),
            currency: Set(txn.currency.to_uppercase()),
            provider_fee: Set(txn.provider_fee),
            platform_fee: Set(txn.platform_fee),
            order_id: Set(txn.order_id.clone()),
            reconciled: Set(txn.reconciled),
            reconciled_at: Set(to_db_opt(txn.reconciled_at)),
            dispute_id: Set(txn.dispute_id.clone()),
            refunded_transaction_id: Set(txn.refunded_transaction_id.clone()),
            created_at: Set(to_db(txn.created_at)),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(store_error)?;
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for PaymentTransactionRepository {
    async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Transaction>, StoreError> {
        payment_transactions::Entity::find()
            .filter(payment_transactions::Column::TransactionId.eq(transaction_id))
            .one(&self.db)
            .await
            .map_err(store_error)?
            .map(transaction_from_model)
            .transpose()
    }

    async fn find_by_provider_and_date_range(
        &self,
        provider: PaymentProvider,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StoreError> {
        payment_transactions::Entity::find()
            .filter(payment_transactions::Column::Provider.eq(provider.as_str()))
            .filter(payment_transactions::Column::CreatedAt.gte(to_db(start)))
            .filter(payment_transactions::Column::CreatedAt.lt(to_db(end)))
            .order_by_asc(payment_transactions::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(transaction_from_model)
            .collect()
    }

    async fn mark_reconciled(
        &self,
        transaction_ids: &[String],
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        if transaction_ids.is_empty() {
            return Ok(0);
        }
        let result = payment_transactions::Entity::update_many()
            .col_expr(payment_transactions::Column::Reconciled, Expr::value(true))
            .col_expr(payment_transactions::Column::ReconciledAt, Expr::value(to_db(at)))
            .col_expr(payment_transactions::Column::UpdatedAt, Expr::value(to_db(at)))
            .filter(payment_transactions::Column::TransactionId.is_in(transaction_ids.to_vec()))
            .filter(payment_transactions::Column::Reconciled.eq(false))
            .exec(&self.db)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected)
    }

    async fn mark_disputed(&self, transaction_id: &str, dispute_id: &str) -> Result<(), StoreError> {
        let now = to_db(Utc::now());
        let result = payment_transactions::Entity::update_many()
            .col_expr(
                payment_transactions::Column::Status,
                Expr::value(TransactionStatus::Disputed.as_str()),
            )
            .col_expr(payment_transactions::Column::DisputeId, Expr::value(dispute_id))
            .col_expr(payment_transactions::Column::UpdatedAt, Expr::value(now))
            .filter(payment_transactions::Column::TransactionId.eq(transaction_id))
            .exec(&self.db)
            .await
            .map_err(store_error)?;
        if result.rows_affected == 0 {
            return Err(StoreError::not_found("Transaction", transaction_id));
        }
        Ok(())
    }
}

fn transaction_from_model(row: payment_transactions::Model) -> Result<Transaction, StoreError> {
    Ok(Transaction {
        id: PaymentTransactionId::from_uuid(row.id),
        provider: parse_column("provider", &row.provider, PaymentProvider::parse)?,
        transaction_type: parse_column(
            "transaction_type",
            &row.transaction_type,
            TransactionType::parse,
        )?,
        status: parse_column("status", &row.status, TransactionStatus::parse)?,
        transaction_id: row.transaction_id,
        amount: row.amount,
        currency: row.currency,
        provider_fee: row.provider_fee,
        platform_fee: row.platform_fee,
        order_id: row.order_id,
        reconciled: row.reconciled,
        reconciled_at: to_utc_opt(row.reconciled_at),
        dispute_id: row.dispute_id,
        refunded_transaction_id: row.refunded_transaction_id,
        created_at: to_utc(row.created_at),
    })
}
