//! Append-only movement ledger boundary.
//!
//! This module defines the storage contract the recorder depends on, without
//! making any storage assumptions, plus the adapters that implement it.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryLedger;
#[cfg(feature = "postgres")]
pub use postgres::PostgresLedger;
pub use r#trait::{LedgerError, LedgerSnapshot, MovementFilter, MovementLedger};
