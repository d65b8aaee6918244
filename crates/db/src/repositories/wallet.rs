//! PostgreSQL wallet store.
//!
//! Implements the `WalletStore` port. `adjust_balance` is one
//! conditional UPDATE guarded on version, activity, and the resulting
//! balance; a refusal is disambiguated by a follow-up read so the
//! engine sees the precise error.

use async_trait::async_trait;
use chrono::Utc;
use paygo_core::wallet::error::WalletError;
use paygo_core::wallet::store::WalletStore;
use paygo_core::wallet::types::Wallet;
use paygo_shared::types::{AccountId, Amount};
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};

use crate::entities::wallets;

/// Wallet repository over a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgWalletStore {
    db: DatabaseConnection,
}

impl PgWalletStore {
    /// Creates a new wallet store.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn fetch(&self, account_id: AccountId) -> Result<Option<wallets::Model>, WalletError> {
        wallets::Entity::find_by_id(account_id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_err)
    }
}

fn store_err(e: sea_orm::DbErr) -> WalletError {
    WalletError::Store(e.to_string())
}

fn wallet_from_model(model: wallets::Model) -> Wallet {
    Wallet {
        account_id: AccountId::from_uuid(model.account_id),
        balance: Amount::from_minor_units(model.balance),
        is_active: model.is_active,
        version: model.version,
        created_at: model.created_at.to_utc(),
        updated_at: model.updated_at.to_utc(),
    }
}

#[async_trait]
impl WalletStore for PgWalletStore {
    async fn create_wallet(
        &self,
        account_id: AccountId,
        initial_balance: Amount,
    ) -> Result<Wallet, WalletError> {
        let now = Utc::now().into();
        let wallet = wallets::ActiveModel {
            account_id: Set(account_id.into_inner()),
            balance: Set(initial_balance.minor_units()),
            is_active: Set(true),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match wallet.insert(&self.db).await {
            Ok(model) => Ok(wallet_from_model(model)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(WalletError::AlreadyExists(account_id))
            }
            Err(e) => Err(store_err(e)),
        }
    }

    async fn get(&self, account_id: AccountId) -> Result<Wallet, WalletError> {
        self.fetch(account_id)
            .await?
            .map(wallet_from_model)
            .ok_or(WalletError::NotFound(account_id))
    }

    async fn adjust_balance(
        &self,
        account_id: AccountId,
        delta: Amount,
        expected_version: i64,
    ) -> Result<Wallet, WalletError> {
        let units = delta.minor_units();
        let result = wallets::Entity::update_many()
            .col_expr(
                wallets::Column::Balance,
                Expr::col(wallets::Column::Balance).add(units),
            )
            .col_expr(
                wallets::Column::Version,
                Expr::col(wallets::Column::Version).add(1),
            )
            .col_expr(wallets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(wallets::Column::AccountId.eq(account_id.into_inner()))
            .filter(wallets::Column::Version.eq(expected_version))
            .filter(wallets::Column::IsActive.eq(true))
            .filter(Expr::col(wallets::Column::Balance).add(units).gte(0))
            .exec(&self.db)
            .await
            .map_err(store_err)?;

        if result.rows_affected == 1 {
            return self.get(account_id).await;
        }

        // Zero rows: read the row back to name the exact refusal.
        let Some(current) = self.fetch(account_id).await? else {
            return Err(WalletError::NotFound(account_id));
        };
        if !current.is_active {
            return Err(WalletError::WalletInactive(account_id));
        }
        if current.version != expected_version {
            return Err(WalletError::VersionConflict {
                account: account_id,
                expected: expected_version,
                actual: current.version,
            });
        }
        Err(WalletError::InsufficientFunds {
            account: account_id,
        })
    }

    async fn set_active(
        &self,
        account_id: AccountId,
        is_active: bool,
    ) -> Result<Wallet, WalletError> {
        let result = wallets::Entity::update_many()
            .col_expr(wallets::Column::IsActive, Expr::value(is_active))
            .col_expr(
                wallets::Column::Version,
                Expr::col(wallets::Column::Version).add(1),
            )
            .col_expr(wallets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(wallets::Column::AccountId.eq(account_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(store_err)?;

        if result.rows_affected == 0 {
            return Err(WalletError::NotFound(account_id));
        }
        self.get(account_id).await
    }
}
