use std::sync::Arc;

use anyhow::Context;
use log::{info, warn};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use ledgerlink_core::connections::ConnectionRepositoryTrait;
use ledgerlink_core::events::BroadcastEventSink;
use ledgerlink_core::provider::TransactionProviderTrait;
use ledgerlink_core::sync::{AutoSyncScheduler, TransactionSyncService, TransactionSyncServiceTrait};
use ledgerlink_core::transactions::TransactionRepositoryTrait;
use ledgerlink_core::SyncConfig;
use ledgerlink_provider::{PlaidClient, PlaidConfig};
use ledgerlink_storage_sqlite::{init, ConnectionRepository, TransactionRepository, WriteHandle};

const DEFAULT_DATABASE_PATH: &str = "ledgerlink.db";
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_path: String,
    pub sync: SyncConfig,
    pub plaid: PlaidConfig,
}

impl WorkerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_path = std::env::var("LEDGERLINK_DATABASE_PATH")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());

        Ok(Self {
            database_path,
            sync: SyncConfig::from_env(),
            plaid: PlaidConfig::from_env().context("invalid Plaid configuration")?,
        })
    }
}

pub struct ServiceContext {
    pub connection_repository: Arc<dyn ConnectionRepositoryTrait>,
    pub transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    pub event_sink: BroadcastEventSink,
    pub scheduler: AutoSyncScheduler,
}

impl ServiceContext {
    pub fn build(config: &WorkerConfig) -> anyhow::Result<Self> {
        let provider =
            PlaidClient::new(config.plaid.clone()).context("failed to build Plaid client")?;
        Self::with_provider(&config.database_path, config.sync.clone(), Arc::new(provider))
    }

    /// Wires storage, engine and scheduler around any provider.
    pub fn with_provider(
        database_path: &str,
        sync_config: SyncConfig,
        provider: Arc<dyn TransactionProviderTrait>,
    ) -> anyhow::Result<Self> {
        let pool = init(database_path).context("failed to open database")?;
        let writer = WriteHandle::spawn(Arc::clone(&pool)).context("failed to start writer")?;

        let connection_repository: Arc<dyn ConnectionRepositoryTrait> =
            Arc::new(ConnectionRepository::new(Arc::clone(&pool), writer.clone()));
        let transaction_repository: Arc<dyn TransactionRepositoryTrait> =
            Arc::new(TransactionRepository::new(pool, writer));
        let event_sink = BroadcastEventSink::new(EVENT_CHANNEL_CAPACITY);

        let sweep_interval = sync_config.sweep_interval;
        let sync_service: Arc<dyn TransactionSyncServiceTrait> =
            Arc::new(TransactionSyncService::new(
                Arc::clone(&transaction_repository),
                Arc::clone(&connection_repository),
                provider,
                Arc::new(event_sink.clone()),
                sync_config,
            ));
        let scheduler = AutoSyncScheduler::new(sync_service, sweep_interval);

        Ok(Self {
            connection_repository,
            transaction_repository,
            event_sink,
            scheduler,
        })
    }

    /// Logs every domain event until the sink is dropped.
    pub fn spawn_event_logger(&self) -> JoinHandle<()> {
        let mut receiver = self.event_sink.subscribe();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if let Some(payload) = event.as_transactions_synced() {
                            info!(
                                "[Worker] {} for connection {}: {} new, {} duplicate ({})",
                                event.name(),
                                payload.connection_id,
                                payload.transactions_inserted,
                                payload.duplicates_skipped,
                                payload.sync_type.as_str()
                            );
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("[Worker] Event logger lagged, skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
