//! `SeaORM` Entity for ledger_entries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub posting_id: Uuid,
    pub transaction_id: Option<String>,
    pub order_id: Option<String>,
    pub account_type: String,
    pub entry_type: String,
    #[sea_orm(column_type = "Decimal(Some((28, 8)))")]
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
    pub reference: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub metadata: Option<Json>,
    pub verified: bool,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTimeWithTimeZone>,
    pub effective_date: Date,
    pub account_version: i64,
    #[sea_orm(column_type = "Decimal(Some((28, 8)))")]
    pub previous_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 8)))")]
    pub current_balance: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
