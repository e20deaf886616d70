//! Connection pool, migrations and the single-writer actor.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{debug, error, info};
use tokio::sync::{mpsc, oneshot};

use ledgerlink_core::errors::{DatabaseError, Error, Result};

use crate::errors::StorageError;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA journal_mode = WAL; \
             PRAGMA synchronous = NORMAL; \
             PRAGMA foreign_keys = ON; \
             PRAGMA busy_timeout = {};",
            BUSY_TIMEOUT_MS
        ))
        .map_err(r2d2::Error::QueryError)
    }
}

/// Opens (creating if needed) the database file and builds the pool.
pub fn create_pool(db_path: &str) -> Result<Arc<DbPool>> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }
    }

    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = Pool::builder()
        .max_size(8)
        .connection_timeout(Duration::from_secs(30))
        .connection_customizer(Box::new(SqlitePragmas))
        .build(manager)
        .map_err(|e| Error::Database(DatabaseError::ConnectionFailed(e.to_string())))?;

    info!("[Storage] Opened database at {}", db_path);
    Ok(Arc::new(pool))
}

pub fn get_connection(pool: &DbPool) -> Result<DbConnection> {
    Ok(pool.get().map_err(StorageError::from)?)
}

pub fn run_migrations(pool: &DbPool) -> Result<()> {
    let mut conn = get_connection(pool)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| StorageError::Migration(e.to_string()))?;
    if applied.is_empty() {
        debug!("[Storage] Schema up to date");
    } else {
        info!("[Storage] Applied {} migration(s)", applied.len());
    }
    Ok(())
}

/// Pool + migrations in one step.
pub fn init(db_path: &str) -> Result<Arc<DbPool>> {
    let pool = create_pool(db_path)?;
    run_migrations(&pool)?;
    Ok(pool)
}

type WriteJob = Box<dyn FnOnce(&mut SqliteConnection) + Send + 'static>;

/// Keeps domain errors intact across diesel's transaction boundary.
enum TxError {
    Diesel(diesel::result::Error),
    Domain(Error),
}

impl From<diesel::result::Error> for TxError {
    fn from(err: diesel::result::Error) -> Self {
        TxError::Diesel(err)
    }
}

impl From<TxError> for Error {
    fn from(err: TxError) -> Self {
        match err {
            TxError::Diesel(e) => StorageError::from(e).into(),
            TxError::Domain(e) => e,
        }
    }
}

/// Handle to the writer actor.
///
/// Every write job runs on one dedicated thread inside an immediate
/// transaction, so SQLite never sees two writers racing for the lock. A job
/// that returns `Err` rolls back.
#[derive(Clone)]
pub struct WriteHandle {
    sender: mpsc::UnboundedSender<WriteJob>,
}

impl WriteHandle {
    pub fn spawn(pool: Arc<DbPool>) -> Result<Self> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<WriteJob>();
        std::thread::Builder::new()
            .name("ledgerlink-db-writer".to_string())
            .spawn(move || {
                while let Some(job) = receiver.blocking_recv() {
                    match pool.get() {
                        Ok(mut conn) => job(&mut *conn),
                        // Dropping the job drops its reply channel; the caller sees the failure.
                        Err(e) => error!("[Storage] Writer could not acquire connection: {}", e),
                    }
                }
                debug!("[Storage] Writer stopped");
            })
            .map_err(|e| Error::Database(DatabaseError::Internal(e.to_string())))?;
        Ok(Self { sender })
    }

    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply, response) = oneshot::channel::<Result<T>>();
        let wrapped: WriteJob = Box::new(move |conn: &mut SqliteConnection| {
            let result = conn
                .immediate_transaction::<T, TxError, _>(|tx| job(tx).map_err(TxError::Domain))
                .map_err(Error::from);
            let _ = reply.send(result);
        });

        self.sender.send(wrapped).map_err(|_| {
            Error::Database(DatabaseError::Internal("Writer is not running".to_string()))
        })?;
        response.await.map_err(|_| {
            Error::Database(DatabaseError::ConnectionFailed(
                "Writer dropped the job without a result".to_string(),
            ))
        })?
    }
}
