//! Initial database migration.
//!
//! Creates the ledger enums, the wallets table, and the append-only
//! transactions table with the indexes the transfer engine relies on.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(WALLETS_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS transactions CASCADE;
             DROP TABLE IF EXISTS wallets CASCADE;
             DROP TYPE IF EXISTS failure_code;
             DROP TYPE IF EXISTS transfer_reason;
             DROP TYPE IF EXISTS transaction_status;",
        )
        .await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE transaction_status AS ENUM ('pending', 'completed', 'failed');

CREATE TYPE transfer_reason AS ENUM (
    'transfer', 'cash_in', 'cash_out', 'funding', 'fee', 'reversal'
);

CREATE TYPE failure_code AS ENUM (
    'insufficient_funds',
    'source_not_found',
    'destination_not_found',
    'source_inactive',
    'destination_inactive',
    'busy',
    'compensation_failed',
    'interrupted',
    'store_error'
);
";

const WALLETS_SQL: &str = r"
-- One wallet per account, created at account-creation time and never
-- deleted, only deactivated.
CREATE TABLE wallets (
    account_id UUID PRIMARY KEY,
    balance BIGINT NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    version BIGINT NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    -- Backstop; the repository refuses overdrafts in its conditional
    -- update before this can fire.
    CONSTRAINT chk_wallets_balance_non_negative CHECK (balance >= 0),
    CONSTRAINT chk_wallets_version_positive CHECK (version >= 1)
);
";

const TRANSACTIONS_SQL: &str = r"
-- Append-only movement history. A row is inserted 'pending' and
-- updated exactly once to a terminal status; it is never deleted.
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    from_account UUID,
    to_account UUID,
    amount BIGINT NOT NULL,
    status transaction_status NOT NULL DEFAULT 'pending',
    reason transfer_reason NOT NULL,
    failure_code failure_code,
    idempotency_key TEXT,
    reversal_of UUID REFERENCES transactions(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    completed_at TIMESTAMPTZ,
    CONSTRAINT chk_transactions_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_transactions_has_endpoint
        CHECK (from_account IS NOT NULL OR to_account IS NOT NULL)
);

-- Replay detection: one record per idempotency key, ever.
CREATE UNIQUE INDEX idx_transactions_idempotency_key
    ON transactions(idempotency_key) WHERE idempotency_key IS NOT NULL;

-- History queries, newest first, for either side of a movement.
CREATE INDEX idx_transactions_from_account
    ON transactions(from_account, created_at DESC) WHERE from_account IS NOT NULL;
CREATE INDEX idx_transactions_to_account
    ON transactions(to_account, created_at DESC) WHERE to_account IS NOT NULL;

-- Recovery sweep over stale pending records.
CREATE INDEX idx_transactions_pending
    ON transactions(created_at) WHERE status = 'pending';
";
