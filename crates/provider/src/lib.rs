//! Plaid-compatible implementation of the LedgerLink transaction provider.

mod client;
mod config;
mod error;
mod types;

pub use client::PlaidClient;
pub use config::{PlaidConfig, PlaidEnvironment, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use error::PlaidSetupError;
pub use types::*;
