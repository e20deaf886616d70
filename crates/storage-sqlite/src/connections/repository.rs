use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;

use ledgerlink_core::connections::{Connection, ConnectionRepositoryTrait, ConnectionStatus};
use ledgerlink_core::{Error, Result};

use super::model::ConnectionDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::connections;
use crate::schema::connections::dsl::*;

pub struct ConnectionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ConnectionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        ConnectionRepository { pool, writer }
    }
}

#[async_trait]
impl ConnectionRepositoryTrait for ConnectionRepository {
    fn find_by_id(&self, connection_id: &str) -> Result<Option<Connection>> {
        let mut conn = get_connection(&self.pool)?;
        let row = connections
            .find(connection_id)
            .first::<ConnectionDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Connection::from))
    }

    fn find_by_user_id(&self, owner_id: &str) -> Result<Vec<Connection>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = connections
            .filter(user_id.eq(owner_id))
            .order(created_at.desc())
            .load::<ConnectionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Connection::from).collect())
    }

    fn find_by_status(&self, wanted: ConnectionStatus) -> Result<Vec<Connection>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = connections
            .filter(status.eq(wanted.as_str()))
            .order((created_at.asc(), id.asc()))
            .load::<ConnectionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Connection::from).collect())
    }

    async fn create(&self, connection: Connection) -> Result<Connection> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Connection> {
                let row: ConnectionDB = connection.into();
                let stored = diesel::insert_into(connections::table)
                    .values(&row)
                    .returning(ConnectionDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Connection::from(stored))
            })
            .await
    }

    async fn update(&self, mut connection: Connection) -> Result<Connection> {
        connection.updated_at = Utc::now();
        let connection_id = connection.id.clone();
        let row: ConnectionDB = connection.into();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Connection> {
                let affected = diesel::update(connections.find(&connection_id))
                    .set((
                        status.eq(&row.status),
                        last_sync_at.eq(&row.last_sync_at),
                        last_sync_error.eq(&row.last_sync_error),
                        institution_name.eq(&row.institution_name),
                        provider_credential.eq(&row.provider_credential),
                        updated_at.eq(&row.updated_at),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if affected == 0 {
                    return Err(Error::connection_not_found(connection_id));
                }
                let stored = connections
                    .find(&connection_id)
                    .first::<ConnectionDB>(conn)
                    .map_err(StorageError::from)?;
                Ok(Connection::from(stored))
            })
            .await
    }

    async fn delete(&self, connection_id: &str) -> Result<usize> {
        let connection_id = connection_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let affected = diesel::delete(connections.find(connection_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(affected)
            })
            .await
    }
}
