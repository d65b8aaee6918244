//! Core business logic for Paygo.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, the transfer engine, and the
//! storage ports live here.
//!
//! # Modules
//!
//! - `wallet` - Wallet balances, the transaction ledger, and the
//!   transfer engine

pub mod wallet;
