use async_trait::async_trait;
use chrono::NaiveDate;

use super::{ProviderError, TransactionPage};

/// Paginated transaction source keyed by a per-connection credential.
///
/// Request timeouts are the implementation's concern and surface as
/// `ProviderError::Timeout`.
#[async_trait]
pub trait TransactionProviderTrait: Send + Sync {
    /// Fetches one page of transactions dated within `[start_date, end_date]`.
    /// `cursor` is `None` for the first page and otherwise the `next_cursor` of
    /// the previous page.
    async fn get_transactions(
        &self,
        credential: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        cursor: Option<&str>,
    ) -> Result<TransactionPage, ProviderError>;
}
