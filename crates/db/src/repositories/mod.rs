//! Repository abstractions for data access.
//!
//! Repositories implement the storage ports defined in `paygo-core`,
//! hiding the `SeaORM` implementation details from the transfer
//! engine.

pub mod ledger;
pub mod wallet;

pub use ledger::PgTransactionLedger;
pub use wallet::PgWalletStore;
