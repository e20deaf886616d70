//! Domain model and transaction synchronization engine for LedgerLink.
//!
//! Storage and provider implementations live in sibling crates; this crate only
//! defines the contracts they fulfil and the orchestration that drives them.

pub mod config;
pub mod connections;
pub mod errors;
pub mod events;
pub mod provider;
pub mod sync;
pub mod transactions;

pub use config::SyncConfig;
pub use errors::{DatabaseError, Error, Result};
