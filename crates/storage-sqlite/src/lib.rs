//! SQLite persistence for LedgerLink, built on diesel with an r2d2 pool and a
//! single writer thread.

pub mod connections;
pub mod db;
pub mod errors;
pub mod schema;
pub mod transactions;

pub use connections::ConnectionRepository;
pub use db::{create_pool, get_connection, init, run_migrations, DbPool, WriteHandle};
pub use errors::StorageError;
pub use transactions::TransactionRepository;
