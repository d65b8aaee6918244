//! Shared types and configuration for Paygo.
//!
//! This crate provides common types used across all other crates:
//! - Integer money amounts in minor currency units
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Configuration management

pub mod config;
pub mod types;

pub use config::AppConfig;
pub use types::{AccountId, Amount, PageRequest, PageResponse, TransactionId};
