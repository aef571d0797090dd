//! `SeaORM` Entity for reconciliation_discrepancies table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "reconciliation_discrepancies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub job_id: String,
    pub discrepancy_type: String,
    pub severity: String,
    pub transaction_id: String,
    pub provider_transaction_id: Option<String>,
    pub internal_transaction_id: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((28, 8)))", nullable)]
    pub provider_amount: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((28, 8)))", nullable)]
    pub internal_amount: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((28, 8)))", nullable)]
    pub amount_difference: Option<Decimal>,
    pub provider_status: Option<String>,
    pub internal_status: Option<String>,
    pub provider_date: Option<Date>,
    pub internal_date: Option<Date>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub provider_payload: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub internal_payload: Option<Json>,
    pub description: String,
    pub resolved: bool,
    pub resolved_by: Option<String>,
    pub resolution_notes: Option<String>,
    pub resolved_at: Option<DateTimeWithTimeZone>,
    pub ticket_id: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::reconciliation_jobs::Entity",
        from = "Column::JobId",
        to = "super::reconciliation_jobs::Column::JobId",
        on_delete = "Cascade"
    )]
    ReconciliationJobs,
}

impl Related<super::reconciliation_jobs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReconciliationJobs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
