//! Property tests for the transfer engine.
//!
//! Drives random operation sequences through an engine over the
//! in-memory backend and checks the ledger invariants that must hold
//! for every interleaving:
//!
//! - Conservation: wallet balances always sum to initial fundings plus
//!   external credits minus external debits.
//! - No wallet balance is ever negative.
//! - Reconciliation: each balance equals its initial funding plus the
//!   completed credits minus the completed debits referencing it.

use std::sync::Arc;

use paygo_shared::config::WalletConfig;
use paygo_shared::types::{AccountId, Amount, PageRequest};
use proptest::prelude::*;

use super::engine::TransferEngine;
use super::memory::{MemoryLedger, MemoryWalletStore};
use super::store::WalletStore;
use super::transaction::{TransactionRecord, TransactionStatus, TransferReason};
use super::types::{DepositRequest, TransferRequest, WithdrawRequest};

/// A randomly generated engine operation over indexed wallets.
#[derive(Debug, Clone)]
enum Op {
    Transfer { from: usize, to: usize, units: i64 },
    Deposit { to: usize, units: i64 },
    Withdraw { from: usize, units: i64 },
}

const WALLETS: usize = 3;

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..WALLETS, 0..WALLETS, 1i64..=80).prop_map(|(from, to, units)| Op::Transfer {
            from,
            to,
            units
        }),
        (0..WALLETS, 1i64..=80).prop_map(|(to, units)| Op::Deposit { to, units }),
        (0..WALLETS, 1i64..=80).prop_map(|(from, units)| Op::Withdraw { from, units }),
    ]
}

fn ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), 1..=max_len)
}

fn initial_balances_strategy() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(0i64..=200, WALLETS)
}

/// Final observable state after a run: wallet balances plus the
/// completed credit/debit totals per wallet from the ledger.
struct RunOutcome {
    balances: Vec<i64>,
    credits: Vec<i64>,
    debits: Vec<i64>,
}

fn run_ops(initial: &[i64], ops: &[Op]) -> RunOutcome {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime");

    runtime.block_on(async {
        let wallets = Arc::new(MemoryWalletStore::new());
        let ledger = Arc::new(MemoryLedger::new());
        let config = WalletConfig {
            retry_jitter_ms: 0,
            ..WalletConfig::default()
        };
        let engine = TransferEngine::new(wallets.clone(), ledger, config);

        let accounts: Vec<AccountId> = initial.iter().map(|_| AccountId::new()).collect();
        for (account, units) in accounts.iter().zip(initial) {
            wallets
                .create_wallet(*account, Amount::from_minor_units(*units))
                .await
                .expect("create wallet");
        }

        for (i, op) in ops.iter().enumerate() {
            // Business refusals (insufficient funds, same account) are
            // part of the exercise; only the invariants matter here.
            let _ = match *op {
                Op::Transfer { from, to, units } => {
                    engine
                        .transfer(TransferRequest {
                            from: accounts[from],
                            to: accounts[to],
                            amount: Amount::from_minor_units(units),
                            reason: TransferReason::Transfer,
                            idempotency_key: format!("op-{i}"),
                        })
                        .await
                }
                Op::Deposit { to, units } => {
                    engine
                        .deposit(DepositRequest {
                            to: accounts[to],
                            amount: Amount::from_minor_units(units),
                            reason: TransferReason::CashIn,
                            idempotency_key: Some(format!("op-{i}")),
                        })
                        .await
                }
                Op::Withdraw { from, units } => {
                    engine
                        .withdraw(WithdrawRequest {
                            from: accounts[from],
                            amount: Amount::from_minor_units(units),
                            idempotency_key: Some(format!("op-{i}")),
                        })
                        .await
                }
            };
        }

        let mut balances = Vec::with_capacity(WALLETS);
        let mut credits = vec![0i64; WALLETS];
        let mut debits = vec![0i64; WALLETS];

        for (idx, account) in accounts.iter().enumerate() {
            let wallet = engine.get_wallet(*account).await.expect("wallet");
            balances.push(wallet.balance.minor_units());

            let page = PageRequest {
                page: 1,
                per_page: 10_000,
            };
            let history = engine.history(*account, &page).await.expect("history");
            for record in history
                .data
                .iter()
                .filter(|r| r.status == TransactionStatus::Completed)
            {
                credits[idx] += completed_credit(record, *account);
                debits[idx] += completed_debit(record, *account);
            }
        }

        RunOutcome {
            balances,
            credits,
            debits,
        }
    })
}

fn completed_credit(record: &TransactionRecord, account: AccountId) -> i64 {
    if record.movement.to_account() == Some(account) {
        record.amount.minor_units()
    } else {
        0
    }
}

fn completed_debit(record: &TransactionRecord, account: AccountId) -> i64 {
    if record.movement.from_account() == Some(account) {
        record.amount.minor_units()
    } else {
        0
    }
}

fn external_flows(outcome: &RunOutcome) -> (i64, i64) {
    // Transfers net to zero across wallets, so the external flow is
    // what credits/debits sum to beyond the internal moves; computing
    // totals directly keeps the arithmetic honest.
    let total_credits: i64 = outcome.credits.iter().sum();
    let total_debits: i64 = outcome.debits.iter().sum();
    (total_credits, total_debits)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// For any operation sequence, money is conserved: balances sum to
    /// initial fundings plus completed external credits minus
    /// completed external debits. Internal transfers cancel out.
    #[test]
    fn prop_conservation(
        initial in initial_balances_strategy(),
        ops in ops_strategy(24),
    ) {
        let outcome = run_ops(&initial, &ops);

        let initial_total: i64 = initial.iter().sum();
        let (credits, debits) = external_flows(&outcome);
        let balance_total: i64 = outcome.balances.iter().sum();

        prop_assert_eq!(
            balance_total,
            initial_total + credits - debits,
            "balances {:?} must reconcile with initial {:?}",
            outcome.balances,
            initial
        );
    }

    /// No wallet balance is ever observable below zero.
    #[test]
    fn prop_no_negative_balances(
        initial in initial_balances_strategy(),
        ops in ops_strategy(24),
    ) {
        let outcome = run_ops(&initial, &ops);
        for balance in &outcome.balances {
            prop_assert!(*balance >= 0, "negative balance {balance}");
        }
    }

    /// Per-wallet reconciliation: the balance equals the initial
    /// funding plus the sum of completed credits minus the sum of
    /// completed debits referencing that wallet. This is the invariant
    /// the ledger exists to make checkable.
    #[test]
    fn prop_per_wallet_reconciliation(
        initial in initial_balances_strategy(),
        ops in ops_strategy(24),
    ) {
        let outcome = run_ops(&initial, &ops);
        for idx in 0..WALLETS {
            prop_assert_eq!(
                outcome.balances[idx],
                initial[idx] + outcome.credits[idx] - outcome.debits[idx],
                "wallet {} out of reconciliation",
                idx
            );
        }
    }
}
