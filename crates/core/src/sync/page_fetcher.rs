//! Paginated provider fetch with per-page retry.

use log::{debug, warn};
use tokio::time::sleep;

use super::retry_policy::RetryPolicy;
use super::sync_model::SyncWindow;
use super::transaction_converter::convert_provider_transaction;
use crate::connections::Connection;
use crate::errors::Error;
use crate::provider::{ProviderError, TransactionPage, TransactionProviderTrait};
use crate::transactions::Transaction;

/// Everything accumulated across the pages of one sync window.
#[derive(Debug, Default)]
pub struct FetchedTransactions {
    pub transactions: Vec<Transaction>,
    pub total_fetched: usize,
    pub pages: usize,
    /// Retries summed over all pages.
    pub retry_count: u32,
}

/// A fetch aborted by a permanent error or an exhausted retry budget.
#[derive(Debug)]
pub struct FetchFailure {
    pub error: Error,
    pub retry_count: u32,
}

struct PageAttempt {
    page: TransactionPage,
    retries: u32,
}

/// Walks the provider's cursor for one connection. Pages are requested strictly
/// one after another; the cursor is sequential and stateful.
pub struct PageFetcher<'a> {
    provider: &'a dyn TransactionProviderTrait,
    policy: RetryPolicy,
    default_currency: &'a str,
}

impl<'a> PageFetcher<'a> {
    pub fn new(
        provider: &'a dyn TransactionProviderTrait,
        policy: RetryPolicy,
        default_currency: &'a str,
    ) -> Self {
        Self {
            provider,
            policy,
            default_currency,
        }
    }

    pub async fn fetch_all(
        &self,
        connection: &Connection,
        window: SyncWindow,
    ) -> Result<FetchedTransactions, FetchFailure> {
        let mut fetched = FetchedTransactions::default();
        let mut cursor: Option<String> = None;

        loop {
            let attempt = self
                .fetch_page_with_retry(&connection.provider_credential, window, cursor.as_deref())
                .await
                .map_err(|mut failure| {
                    failure.retry_count += fetched.retry_count;
                    failure
                })?;
            fetched.retry_count += attempt.retries;
            fetched.pages += 1;

            let page = attempt.page;
            fetched.total_fetched += page.transactions.len();
            debug!(
                "[TransactionSync] Page {} for connection {}: {} records (has_more={})",
                fetched.pages,
                connection.id,
                page.transactions.len(),
                page.has_more
            );
            fetched.transactions.extend(
                page.transactions
                    .into_iter()
                    .map(|raw| convert_provider_transaction(raw, connection, self.default_currency)),
            );

            if !page.has_more {
                return Ok(fetched);
            }

            let next = match page.next_cursor {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => next,
                Some(stale) => {
                    return Err(FetchFailure {
                        error: ProviderError::malformed(format!(
                            "Cursor '{}' did not advance",
                            stale
                        ))
                        .into(),
                        retry_count: fetched.retry_count,
                    });
                }
                None => {
                    return Err(FetchFailure {
                        error: ProviderError::malformed("More pages signalled without a cursor")
                            .into(),
                        retry_count: fetched.retry_count,
                    });
                }
            };
            cursor = Some(next);
        }
    }

    async fn fetch_page_with_retry(
        &self,
        credential: &str,
        window: SyncWindow,
        cursor: Option<&str>,
    ) -> Result<PageAttempt, FetchFailure> {
        let mut retries = 0;
        loop {
            let result = self
                .provider
                .get_transactions(credential, window.start_date, window.end_date, cursor)
                .await;

            let err = match result {
                Ok(page) => return Ok(PageAttempt { page, retries }),
                Err(err) => err,
            };

            if !err.is_transient() {
                return Err(FetchFailure {
                    error: Error::Provider(err),
                    retry_count: retries,
                });
            }
            let attempts = retries + 1;
            if attempts >= self.policy.max_attempts() {
                return Err(FetchFailure {
                    error: Error::RetriesExhausted {
                        attempts,
                        source: err,
                    },
                    retry_count: retries,
                });
            }

            retries += 1;
            let delay = self.policy.delay_for(retries);
            warn!(
                "[TransactionSync] Transient provider error, retry {}/{} in {:?}: {}",
                retries, self.policy.max_retries, delay, err
            );
            sleep(delay).await;
        }
    }
}
