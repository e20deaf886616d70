//! LedgerLink sync worker: keeps every linked connection's ledger current.

mod context;

use std::collections::BTreeSet;

use anyhow::Result;
use ledgerlink_core::connections::ConnectionRepositoryTrait;
use ledgerlink_core::transactions::TransactionRepositoryTrait;
use tracing::info;
use tracing_subscriber::EnvFilter;

use context::{ServiceContext, WorkerConfig};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = WorkerConfig::from_env()?;
    info!(
        database = %config.database_path,
        interval_secs = config.sync.sweep_interval.as_secs(),
        concurrency = config.sync.batch_concurrency,
        "starting ledgerlink worker"
    );

    let context = ServiceContext::build(&config)?;
    let active = context.connection_repository.find_active_connections()?;
    info!(connections = active.len(), "active connections at startup");
    let users: BTreeSet<&str> = active.iter().map(|c| c.user_id.as_str()).collect();
    for user_id in users {
        let stored = context.transaction_repository.count_by_user_id(user_id)?;
        info!(user = user_id, transactions = stored, "ledger size at startup");
    }

    let event_logger = context.spawn_event_logger();
    context.scheduler.start();

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    context.scheduler.stop();
    event_logger.abort();
    Ok(())
}
