//! `SeaORM` Entity for disputes table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "disputes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub provider_dispute_id: String,
    pub provider: String,
    pub transaction_id: String,
    pub dispute_type: String,
    pub status: String,
    pub reason: String,
    #[sea_orm(column_type = "Decimal(Some((28, 8)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 8)))")]
    pub fee: Decimal,
    pub currency: String,
    pub evidence_due_by: Option<DateTimeWithTimeZone>,
    pub evidence_submitted: bool,
    pub evidence_submitted_at: Option<DateTimeWithTimeZone>,
    pub funds_frozen: bool,
    pub funds_frozen_at: Option<DateTimeWithTimeZone>,
    pub funds_released_at: Option<DateTimeWithTimeZone>,
    pub admin_notified: bool,
    pub admin_notified_at: Option<DateTimeWithTimeZone>,
    pub provider_notified: bool,
    pub provider_notified_at: Option<DateTimeWithTimeZone>,
    pub resolution_notes: Option<String>,
    pub internal_notes: Option<String>,
    pub received_at: DateTimeWithTimeZone,
    pub resolved_at: Option<DateTimeWithTimeZone>,
    pub updated_at: DateTimeWithTimeZone,
    pub version: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
