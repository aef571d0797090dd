//! `SeaORM` Entity for reconciliation_jobs table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "reconciliation_jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub job_id: String,
    pub provider: String,
    pub trigger_type: String,
    pub start_date: Date,
    pub end_date: Date,
    pub status: String,
    pub provider_transaction_count: i64,
    pub internal_transaction_count: i64,
    pub matched_count: i64,
    pub discrepancy_count: i64,
    #[sea_orm(column_type = "Decimal(Some((28, 8)))")]
    pub provider_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 8)))")]
    pub internal_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 8)))")]
    pub total_difference: Decimal,
    pub error_message: Option<String>,
    pub started_at: Option<DateTimeWithTimeZone>,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::reconciliation_discrepancies::Entity")]
    ReconciliationDiscrepancies,
}

impl Related<super::reconciliation_discrepancies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReconciliationDiscrepancies.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
