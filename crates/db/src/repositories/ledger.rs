//! PostgreSQL transaction ledger.
//!
//! Implements the `TransactionLedger` port over the append-only
//! transactions table. Terminal transitions are status-guarded
//! conditional updates so they can happen exactly once, and the
//! partial unique index on `idempotency_key` makes replay detection
//! race-free.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paygo_core::wallet::error::WalletError;
use paygo_core::wallet::store::TransactionLedger;
use paygo_core::wallet::transaction::{FailureCode, Movement, TransactionRecord};
use paygo_shared::types::{AccountId, Amount, PageRequest, PageResponse, TransactionId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};

use crate::entities::{sea_orm_active_enums as db_enums, transactions};

/// Transaction ledger over a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgTransactionLedger {
    db: DatabaseConnection,
}

impl PgTransactionLedger {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: TransactionId) -> Result<Option<transactions::Model>, WalletError> {
        transactions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_err)
    }

    /// Applies a terminal status exactly once.
    async fn transition(
        &self,
        id: TransactionId,
        status: db_enums::TransactionStatus,
        code: Option<FailureCode>,
    ) -> Result<TransactionRecord, WalletError> {
        let mut update = transactions::Entity::update_many()
            .col_expr(transactions::Column::Status, Expr::value(status))
            .col_expr(transactions::Column::CompletedAt, Expr::value(Utc::now()));
        if let Some(code) = code {
            update = update.col_expr(
                transactions::Column::FailureCode,
                Expr::value(db_enums::FailureCode::from(code)),
            );
        }

        let result = update
            .filter(transactions::Column::Id.eq(id.into_inner()))
            .filter(transactions::Column::Status.eq(db_enums::TransactionStatus::Pending))
            .exec(&self.db)
            .await
            .map_err(store_err)?;

        let Some(model) = self.fetch(id).await? else {
            return Err(WalletError::TransactionNotFound(id));
        };
        if result.rows_affected == 0 {
            // The row exists but was already terminal.
            return Err(WalletError::InvalidTransition {
                id,
                status: model.status.into(),
            });
        }
        record_from_model(model)
    }
}

fn store_err(e: sea_orm::DbErr) -> WalletError {
    WalletError::Store(e.to_string())
}

fn movement_from_row(
    id: TransactionId,
    from_account: Option<uuid::Uuid>,
    to_account: Option<uuid::Uuid>,
) -> Result<Movement, WalletError> {
    match (from_account, to_account) {
        (Some(from), Some(to)) => Ok(Movement::Transfer {
            from: AccountId::from_uuid(from),
            to: AccountId::from_uuid(to),
        }),
        (None, Some(to)) => Ok(Movement::Credit {
            to: AccountId::from_uuid(to),
        }),
        (Some(from), None) => Ok(Movement::Debit {
            from: AccountId::from_uuid(from),
        }),
        (None, None) => Err(WalletError::Store(format!(
            "transaction {id} has no endpoints"
        ))),
    }
}

fn record_from_model(model: transactions::Model) -> Result<TransactionRecord, WalletError> {
    let id = TransactionId::from_uuid(model.id);
    Ok(TransactionRecord {
        id,
        movement: movement_from_row(id, model.from_account, model.to_account)?,
        amount: Amount::from_minor_units(model.amount),
        reason: model.reason.into(),
        status: model.status.into(),
        failure_code: model.failure_code.map(Into::into),
        idempotency_key: model.idempotency_key,
        reversal_of: model.reversal_of.map(TransactionId::from_uuid),
        created_at: model.created_at.to_utc(),
        completed_at: model.completed_at.map(|at| at.to_utc()),
    })
}

#[async_trait]
impl TransactionLedger for PgTransactionLedger {
    async fn record_attempt(
        &self,
        record: TransactionRecord,
    ) -> Result<TransactionRecord, WalletError> {
        let model = transactions::ActiveModel {
            id: Set(record.id.into_inner()),
            from_account: Set(record.movement.from_account().map(AccountId::into_inner)),
            to_account: Set(record.movement.to_account().map(AccountId::into_inner)),
            amount: Set(record.amount.minor_units()),
            status: Set(record.status.into()),
            reason: Set(record.reason.into()),
            failure_code: Set(record.failure_code.map(Into::into)),
            idempotency_key: Set(record.idempotency_key.clone()),
            reversal_of: Set(record.reversal_of.map(TransactionId::into_inner)),
            created_at: Set(record.created_at.into()),
            completed_at: Set(record.completed_at.map(Into::into)),
        };

        match model.insert(&self.db).await {
            Ok(inserted) => record_from_model(inserted),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                // Another in-flight attempt holds this idempotency key.
                tracing::debug!(
                    transaction_id = %record.id,
                    "idempotency key already held by an in-flight record"
                );
                Err(WalletError::Busy(record.movement.primary_account()))
            }
            Err(e) => Err(store_err(e)),
        }
    }

    async fn mark_completed(&self, id: TransactionId) -> Result<TransactionRecord, WalletError> {
        self.transition(id, db_enums::TransactionStatus::Completed, None)
            .await
    }

    async fn mark_failed(
        &self,
        id: TransactionId,
        code: FailureCode,
    ) -> Result<TransactionRecord, WalletError> {
        self.transition(id, db_enums::TransactionStatus::Failed, Some(code))
            .await
    }

    async fn find(&self, id: TransactionId) -> Result<Option<TransactionRecord>, WalletError> {
        self.fetch(id).await?.map(record_from_model).transpose()
    }

    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<TransactionRecord>, WalletError> {
        transactions::Entity::find()
            .filter(transactions::Column::IdempotencyKey.eq(key))
            .one(&self.db)
            .await
            .map_err(store_err)?
            .map(record_from_model)
            .transpose()
    }

    async fn list_for_account(
        &self,
        account_id: AccountId,
        page: &PageRequest,
    ) -> Result<PageResponse<TransactionRecord>, WalletError> {
        let account = account_id.into_inner();
        let query = transactions::Entity::find()
            .filter(
                Condition::any()
                    .add(transactions::Column::FromAccount.eq(account))
                    .add(transactions::Column::ToAccount.eq(account)),
            )
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id);

        let total = query.clone().count(&self.db).await.map_err(store_err)?;
        let models = query
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(store_err)?;

        let data = models
            .into_iter()
            .map(record_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    async fn list_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<TransactionRecord>, WalletError> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::Status.eq(db_enums::TransactionStatus::Pending))
            .filter(transactions::Column::CreatedAt.lt(cutoff))
            .order_by_asc(transactions::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(store_err)?;

        models.into_iter().map(record_from_model).collect()
    }
}
