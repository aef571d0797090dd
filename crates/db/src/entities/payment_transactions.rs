//! `SeaORM` Entity for payment_transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub transaction_id: String,
    pub provider: String,
    pub transaction_type: String,
    pub status: String,
    #[sea_orm(column_type = "Decimal(Some((28, 8)))")]
    pub amount: Decimal,
    pub currency: String,
    #[sea_orm(column_type = "Decimal(Some((28, 8)))")]
    pub provider_fee: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 8)))")]
    pub platform_fee: Decimal,
    pub order_id: Option<String>,
    pub reconciled: bool,
    pub reconciled_at: Option<DateTimeWithTimeZone>,
    pub dispute_id: Option<String>,
    pub refunded_transaction_id: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
