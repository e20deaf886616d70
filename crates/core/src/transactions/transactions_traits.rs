use async_trait::async_trait;
use chrono::NaiveDate;

use super::{BulkInsertResult, Transaction};
use crate::errors::Result;

/// Persistence contract for ledger transactions.
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    /// Explicit create. Fails with `DuplicateTransaction` when the external id is
    /// already stored under a different internal id.
    async fn save(&self, transaction: Transaction) -> Result<Transaction>;

    /// Sync ingestion path. Records whose external id is already stored, or that
    /// repeat an earlier record of the same batch, are skipped and counted.
    async fn bulk_insert(&self, transactions: Vec<Transaction>) -> Result<BulkInsertResult>;

    fn find_by_id(&self, transaction_id: &str) -> Result<Option<Transaction>>;

    /// Newest date first.
    fn find_by_user_id(
        &self,
        user_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Transaction>>;

    fn count_by_user_id(&self, user_id: &str) -> Result<i64>;

    /// Newest date first.
    fn find_by_connection_id(&self, connection_id: &str) -> Result<Vec<Transaction>>;

    fn find_by_external_id(&self, external_id: &str) -> Result<Option<Transaction>>;

    fn find_by_external_ids(&self, external_ids: &[String]) -> Result<Vec<Transaction>>;

    /// Both bounds inclusive, oldest first.
    fn get_transactions_in_range(
        &self,
        connection_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Transaction>>;

    fn get_latest_transaction_date(&self, connection_id: &str) -> Result<Option<NaiveDate>>;

    async fn delete_by_user_id(&self, user_id: &str) -> Result<usize>;

    async fn delete_by_connection_id(&self, connection_id: &str) -> Result<usize>;
}
