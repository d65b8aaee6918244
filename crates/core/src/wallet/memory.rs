//! In-memory store backend.
//!
//! Backs the engine in tests and local development. Wallet mutations
//! happen under the map's per-entry lock, which gives the same
//! single-wallet atomicity the PostgreSQL repositories provide via
//! conditional updates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use paygo_shared::types::{AccountId, Amount, PageRequest, PageResponse, TransactionId};

use super::error::WalletError;
use super::store::{TransactionLedger, WalletStore};
use super::transaction::{FailureCode, TransactionRecord, TransactionStatus};
use super::types::Wallet;

/// In-memory wallet store.
#[derive(Debug, Default)]
pub struct MemoryWalletStore {
    wallets: DashMap<AccountId, Wallet>,
}

impl MemoryWalletStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletStore for MemoryWalletStore {
    async fn create_wallet(
        &self,
        account_id: AccountId,
        initial_balance: Amount,
    ) -> Result<Wallet, WalletError> {
        match self.wallets.entry(account_id) {
            Entry::Occupied(_) => Err(WalletError::AlreadyExists(account_id)),
            Entry::Vacant(entry) => {
                let wallet = Wallet::new(account_id, initial_balance);
                entry.insert(wallet.clone());
                Ok(wallet)
            }
        }
    }

    async fn get(&self, account_id: AccountId) -> Result<Wallet, WalletError> {
        self.wallets
            .get(&account_id)
            .map(|entry| entry.value().clone())
            .ok_or(WalletError::NotFound(account_id))
    }

    async fn adjust_balance(
        &self,
        account_id: AccountId,
        delta: Amount,
        expected_version: i64,
    ) -> Result<Wallet, WalletError> {
        let mut entry = self
            .wallets
            .get_mut(&account_id)
            .ok_or(WalletError::NotFound(account_id))?;
        let wallet = entry.value_mut();

        if !wallet.is_active {
            return Err(WalletError::WalletInactive(account_id));
        }
        if wallet.version != expected_version {
            return Err(WalletError::VersionConflict {
                account: account_id,
                expected: expected_version,
                actual: wallet.version,
            });
        }
        let next = wallet
            .balance
            .checked_add(delta)
            .ok_or_else(|| WalletError::Store(format!("balance overflow on {account_id}")))?;
        if next.is_negative() {
            return Err(WalletError::InsufficientFunds {
                account: account_id,
            });
        }

        wallet.balance = next;
        wallet.version += 1;
        wallet.updated_at = Utc::now();
        Ok(wallet.clone())
    }

    async fn set_active(
        &self,
        account_id: AccountId,
        is_active: bool,
    ) -> Result<Wallet, WalletError> {
        let mut entry = self
            .wallets
            .get_mut(&account_id)
            .ok_or(WalletError::NotFound(account_id))?;
        let wallet = entry.value_mut();
        wallet.is_active = is_active;
        wallet.version += 1;
        wallet.updated_at = Utc::now();
        Ok(wallet.clone())
    }
}

/// In-memory transaction ledger.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: DashMap<TransactionId, TransactionRecord>,
    by_key: DashMap<String, TransactionId>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn update_status<F>(&self, id: TransactionId, apply: F) -> Result<TransactionRecord, WalletError>
    where
        F: FnOnce(TransactionRecord) -> Result<TransactionRecord, WalletError>,
    {
        let mut entry = self
            .records
            .get_mut(&id)
            .ok_or(WalletError::TransactionNotFound(id))?;
        let updated = apply(entry.value().clone())?;
        *entry.value_mut() = updated.clone();
        Ok(updated)
    }
}

#[async_trait]
impl TransactionLedger for MemoryLedger {
    async fn record_attempt(
        &self,
        record: TransactionRecord,
    ) -> Result<TransactionRecord, WalletError> {
        if let Some(key) = &record.idempotency_key {
            match self.by_key.entry(key.clone()) {
                Entry::Occupied(_) => {
                    return Err(WalletError::Busy(record.movement.primary_account()));
                }
                Entry::Vacant(entry) => {
                    entry.insert(record.id);
                }
            }
        }
        self.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn mark_completed(&self, id: TransactionId) -> Result<TransactionRecord, WalletError> {
        self.update_status(id, TransactionRecord::complete)
    }

    async fn mark_failed(
        &self,
        id: TransactionId,
        code: FailureCode,
    ) -> Result<TransactionRecord, WalletError> {
        self.update_status(id, |record| record.fail(code))
    }

    async fn find(&self, id: TransactionId) -> Result<Option<TransactionRecord>, WalletError> {
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<TransactionRecord>, WalletError> {
        let Some(id) = self.by_key.get(key).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        self.find(id).await
    }

    async fn list_for_account(
        &self,
        account_id: AccountId,
        page: &PageRequest,
    ) -> Result<PageResponse<TransactionRecord>, WalletError> {
        let mut matching: Vec<TransactionRecord> = self
            .records
            .iter()
            .filter(|entry| entry.value().movement.touches(account_id))
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.into_inner().cmp(&a.id.into_inner()))
        });

        let total = matching.len() as u64;
        let data: Vec<TransactionRecord> = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
            .collect();

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    async fn list_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<TransactionRecord>, WalletError> {
        Ok(self
            .records
            .iter()
            .filter(|entry| {
                let record = entry.value();
                record.status == TransactionStatus::Pending && record.created_at < cutoff
            })
            .map(|entry| entry.value().clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::transaction::{Movement, TransferReason};

    fn amount(units: i64) -> Amount {
        Amount::from_minor_units(units)
    }

    #[tokio::test]
    async fn test_create_wallet_rejects_duplicates() {
        let store = MemoryWalletStore::new();
        let account = AccountId::new();

        store.create_wallet(account, amount(50)).await.unwrap();
        assert!(matches!(
            store.create_wallet(account, amount(50)).await,
            Err(WalletError::AlreadyExists(_))
        ));

        // The first funding is intact.
        assert_eq!(store.get(account).await.unwrap().balance, amount(50));
    }

    #[tokio::test]
    async fn test_adjust_balance_applies_delta_and_bumps_version() {
        let store = MemoryWalletStore::new();
        let account = AccountId::new();
        store.create_wallet(account, amount(100)).await.unwrap();

        let wallet = store.adjust_balance(account, amount(-40), 1).await.unwrap();
        assert_eq!(wallet.balance, amount(60));
        assert_eq!(wallet.version, 2);
    }

    #[tokio::test]
    async fn test_adjust_balance_version_conflict() {
        let store = MemoryWalletStore::new();
        let account = AccountId::new();
        store.create_wallet(account, amount(100)).await.unwrap();
        store.adjust_balance(account, amount(-10), 1).await.unwrap();

        let err = store
            .adjust_balance(account, amount(-10), 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WalletError::VersionConflict {
                expected: 1,
                actual: 2,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_adjust_balance_rejects_overdraft() {
        let store = MemoryWalletStore::new();
        let account = AccountId::new();
        store.create_wallet(account, amount(10)).await.unwrap();

        assert!(matches!(
            store.adjust_balance(account, amount(-50), 1).await,
            Err(WalletError::InsufficientFunds { .. })
        ));
        assert_eq!(store.get(account).await.unwrap().balance, amount(10));
    }

    #[tokio::test]
    async fn test_adjust_balance_rejects_frozen_wallet() {
        let store = MemoryWalletStore::new();
        let account = AccountId::new();
        store.create_wallet(account, amount(100)).await.unwrap();
        let frozen = store.set_active(account, false).await.unwrap();

        assert!(matches!(
            store.adjust_balance(account, amount(10), frozen.version).await,
            Err(WalletError::WalletInactive(_))
        ));
    }

    #[tokio::test]
    async fn test_ledger_duplicate_key_refused_while_pending() {
        let ledger = MemoryLedger::new();
        let to = AccountId::new();
        let record = TransactionRecord::attempt(
            Movement::Credit { to },
            amount(10),
            TransferReason::CashIn,
            Some("dup".to_string()),
        );
        ledger.record_attempt(record).await.unwrap();

        let second = TransactionRecord::attempt(
            Movement::Credit { to },
            amount(10),
            TransferReason::CashIn,
            Some("dup".to_string()),
        );
        assert!(matches!(
            ledger.record_attempt(second).await,
            Err(WalletError::Busy(_))
        ));
    }

    #[tokio::test]
    async fn test_ledger_terminal_transitions_happen_once() {
        let ledger = MemoryLedger::new();
        let record = TransactionRecord::attempt(
            Movement::Credit {
                to: AccountId::new(),
            },
            amount(10),
            TransferReason::CashIn,
            None,
        );
        let id = ledger.record_attempt(record).await.unwrap().id;

        ledger.mark_completed(id).await.unwrap();
        assert!(matches!(
            ledger.mark_completed(id).await,
            Err(WalletError::InvalidTransition { .. })
        ));
        assert!(matches!(
            ledger.mark_failed(id, FailureCode::Busy).await,
            Err(WalletError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_for_account_newest_first_and_paginated() {
        let ledger = MemoryLedger::new();
        let account = AccountId::new();
        for _ in 0..5 {
            let record = TransactionRecord::attempt(
                Movement::Credit { to: account },
                amount(10),
                TransferReason::CashIn,
                None,
            );
            ledger.record_attempt(record).await.unwrap();
        }
        // A record for someone else must not appear.
        let other = TransactionRecord::attempt(
            Movement::Credit {
                to: AccountId::new(),
            },
            amount(10),
            TransferReason::CashIn,
            None,
        );
        ledger.record_attempt(other).await.unwrap();

        let page = ledger
            .list_for_account(
                account,
                &PageRequest {
                    page: 1,
                    per_page: 3,
                },
            )
            .await
            .unwrap();
        assert_eq!(page.data.len(), 3);
        assert_eq!(page.meta.total, 5);
        assert_eq!(page.meta.total_pages, 2);
        assert!(
            page.data
                .windows(2)
                .all(|pair| pair[0].created_at >= pair[1].created_at)
        );

        let rest = ledger
            .list_for_account(
                account,
                &PageRequest {
                    page: 2,
                    per_page: 3,
                },
            )
            .await
            .unwrap();
        assert_eq!(rest.data.len(), 2);
    }

    #[tokio::test]
    async fn test_list_stale_pending_filters_by_cutoff_and_status() {
        let ledger = MemoryLedger::new();
        let account = AccountId::new();

        let stale = TransactionRecord::attempt(
            Movement::Credit { to: account },
            amount(10),
            TransferReason::CashIn,
            None,
        );
        let stale_id = ledger.record_attempt(stale).await.unwrap().id;

        let finished = TransactionRecord::attempt(
            Movement::Credit { to: account },
            amount(10),
            TransferReason::CashIn,
            None,
        );
        let finished_id = ledger.record_attempt(finished).await.unwrap().id;
        ledger.mark_completed(finished_id).await.unwrap();

        let cutoff = Utc::now() + chrono::Duration::seconds(1);
        let found = ledger.list_stale_pending(cutoff).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, stale_id);

        // Nothing predates a cutoff in the past.
        let early_cutoff = Utc::now() - chrono::Duration::seconds(60);
        assert!(
            ledger
                .list_stale_pending(early_cutoff)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
