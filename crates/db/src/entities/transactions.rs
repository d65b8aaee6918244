//! `SeaORM` Entity for the transactions table.
//!
//! Rows are append-only: a record is inserted `pending` and updated
//! exactly once to a terminal status. Corrections are new rows linked
//! through `reversal_of`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{FailureCode, TransactionStatus, TransferReason};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub from_account: Option<Uuid>,
    pub to_account: Option<Uuid>,
    pub amount: i64,
    pub status: TransactionStatus,
    pub reason: TransferReason,
    pub failure_code: Option<FailureCode>,
    pub idempotency_key: Option<String>,
    pub reversal_of: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub completed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ReversalOf",
        to = "Column::Id"
    )]
    Reversed,
}

impl ActiveModelBehavior for ActiveModel {}
