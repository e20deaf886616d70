//! Orchestrates one connection's sync: window, paged fetch, dedup insert,
//! status bookkeeping and the completion event.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use log::{error, info, warn};

use super::in_flight::InFlightRegistry;
use super::page_fetcher::{FetchedTransactions, PageFetcher};
use super::retry_policy::RetryPolicy;
use super::sync_model::{plan_sync_window, BatchSyncResult, SyncOutcome};
use crate::config::SyncConfig;
use crate::connections::{Connection, ConnectionRepositoryTrait, ConnectionStatus};
use crate::errors::{Error, Result};
use crate::events::{DomainEvent, DomainEventSink, SyncCompletedEvent};
use crate::provider::TransactionProviderTrait;
use crate::transactions::TransactionRepositoryTrait;

#[async_trait]
pub trait TransactionSyncServiceTrait: Send + Sync {
    /// Brings one connection's ledger up to date.
    ///
    /// Unknown or disconnected connections, provider failures and bulk-insert
    /// failures all come back as an unsuccessful `SyncOutcome`. `Err` is
    /// reserved for faults reading or writing the connection record.
    async fn sync_connection(&self, connection_id: &str) -> Result<SyncOutcome>;

    /// Sweeps every eligible connection. Never fails; each connection's
    /// failure is collected in `BatchSyncResult::failed`.
    async fn sync_all_connections(&self) -> BatchSyncResult;
}

pub struct TransactionSyncService {
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    connection_repository: Arc<dyn ConnectionRepositoryTrait>,
    provider: Arc<dyn TransactionProviderTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    config: SyncConfig,
    in_flight: InFlightRegistry,
}

impl TransactionSyncService {
    pub fn new(
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        connection_repository: Arc<dyn ConnectionRepositoryTrait>,
        provider: Arc<dyn TransactionProviderTrait>,
        event_sink: Arc<dyn DomainEventSink>,
        config: SyncConfig,
    ) -> Self {
        Self {
            transaction_repository,
            connection_repository,
            provider,
            event_sink,
            config,
            in_flight: InFlightRegistry::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> &InFlightRegistry {
        &self.in_flight
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.max_retries, self.config.retry_base_delay)
    }

    fn load_syncable(&self, connection_id: &str) -> Result<Connection> {
        let connection = self
            .connection_repository
            .find_by_id(connection_id)?
            .ok_or_else(|| Error::connection_not_found(connection_id))?;
        if !connection.is_syncable() {
            return Err(Error::connection_disconnected(connection_id));
        }
        Ok(connection)
    }

    fn sweep_candidates(&self) -> Result<Vec<Connection>> {
        let mut connections = self.connection_repository.find_active_connections()?;
        if self.config.include_failed_in_sweep {
            connections.extend(
                self.connection_repository
                    .find_by_status(ConnectionStatus::Failed)?,
            );
        }
        Ok(connections)
    }

    async fn run_sync(&self, mut connection: Connection) -> Result<SyncOutcome> {
        let latest = self
            .transaction_repository
            .get_latest_transaction_date(&connection.id)?;
        let (sync_type, window) = plan_sync_window(
            latest,
            Utc::now().date_naive(),
            self.config.initial_sync_days,
        );
        info!(
            "[TransactionSync] Starting {} sync for connection {} ({} to {})",
            sync_type.as_str(),
            connection.id,
            window.start_date,
            window.end_date
        );

        let fetcher = PageFetcher::new(
            self.provider.as_ref(),
            self.retry_policy(),
            &self.config.default_currency,
        );
        let FetchedTransactions {
            transactions,
            total_fetched,
            retry_count,
            ..
        } = match fetcher.fetch_all(&connection, window).await {
            Ok(fetched) => fetched,
            Err(failure) => {
                let message = failure.error.to_string();
                warn!(
                    "[TransactionSync] Failed to fetch transactions for connection {}: {}",
                    connection.id, message
                );
                let connection_id = connection.id.clone();
                connection.mark_failed(message.clone(), Utc::now());
                self.connection_repository.update(connection).await?;
                return Ok(SyncOutcome::failed(
                    connection_id,
                    sync_type,
                    failure.retry_count,
                    message,
                ));
            }
        };

        let inserted = match self.transaction_repository.bulk_insert(transactions).await {
            Ok(result) => result,
            Err(err) => {
                error!(
                    "[TransactionSync] Failed to insert transactions for connection {}: {}",
                    connection.id, err
                );
                let mut outcome = SyncOutcome::failed(
                    connection.id,
                    sync_type,
                    retry_count,
                    format!("Failed to insert transactions: {}", err),
                );
                outcome.total_fetched = total_fetched;
                return Ok(outcome);
            }
        };

        connection.mark_synced(Utc::now());
        let connection = self.connection_repository.update(connection).await?;

        self.event_sink
            .emit(DomainEvent::transactions_synced(SyncCompletedEvent {
                connection_id: connection.id.clone(),
                user_id: connection.user_id.clone(),
                transaction_ids: inserted.transaction_ids.clone(),
                sync_type,
                transactions_inserted: inserted.inserted,
                duplicates_skipped: inserted.duplicates_skipped,
            }));

        info!(
            "[TransactionSync] Sync complete for connection {}: {} inserted, {} duplicates skipped",
            connection.id, inserted.inserted, inserted.duplicates_skipped
        );

        Ok(SyncOutcome {
            success: true,
            connection_id: connection.id,
            sync_type,
            transactions_inserted: inserted.inserted,
            duplicates_skipped: inserted.duplicates_skipped,
            total_fetched,
            retry_count,
            transaction_ids: inserted.transaction_ids,
            error: None,
        })
    }
}

#[async_trait]
impl TransactionSyncServiceTrait for TransactionSyncService {
    async fn sync_connection(&self, connection_id: &str) -> Result<SyncOutcome> {
        let _claim = self.in_flight.acquire(connection_id).await;

        let connection = match self.load_syncable(connection_id) {
            Ok(connection) => connection,
            Err(err) if err.is_precondition() => {
                warn!(
                    "[TransactionSync] Rejected sync for connection {}: {}",
                    connection_id, err
                );
                return Ok(SyncOutcome::rejected(connection_id, &err));
            }
            Err(err) => return Err(err),
        };

        self.run_sync(connection).await
    }

    async fn sync_all_connections(&self) -> BatchSyncResult {
        let connections = match self.sweep_candidates() {
            Ok(connections) => connections,
            Err(err) => {
                error!("[TransactionSync] Failed to load connections for sweep: {}", err);
                return BatchSyncResult::default();
            }
        };

        let outcomes: Vec<SyncOutcome> = stream::iter(connections.into_iter().map(|c| c.id))
            .map(|connection_id| async move {
                match self.sync_connection(&connection_id).await {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        error!(
                            "[TransactionSync] Sync of connection {} aborted: {}",
                            connection_id, err
                        );
                        SyncOutcome::rejected(connection_id, &err)
                    }
                }
            })
            .buffered(self.config.batch_concurrency.max(1))
            .collect()
            .await;

        let mut result = BatchSyncResult::default();
        for outcome in outcomes {
            result.record(outcome);
        }

        info!(
            "[TransactionSync] Batch sync complete: {} succeeded, {} failed",
            result.synced.len(),
            result.failed.len()
        );
        result
    }
}
