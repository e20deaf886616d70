//! Database model for linked connections.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::warn;
use serde::{Deserialize, Serialize};

use ledgerlink_core::connections::{Connection, ConnectionStatus};

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::connections)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct ConnectionDB {
    pub id: String,
    pub user_id: String,
    pub provider_credential: String,
    pub institution_id: String,
    pub institution_name: String,
    pub status: String,
    pub last_sync_at: Option<String>,
    pub last_sync_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl From<ConnectionDB> for Connection {
    fn from(db: ConnectionDB) -> Self {
        let status = ConnectionStatus::parse(&db.status).unwrap_or_else(|| {
            warn!(
                "[Storage] Unknown status '{}' on connection {}, treating as failed",
                db.status, db.id
            );
            ConnectionStatus::Failed
        });

        Self {
            id: db.id,
            user_id: db.user_id,
            provider_credential: db.provider_credential,
            institution_id: db.institution_id,
            institution_name: db.institution_name,
            status,
            last_sync_at: db.last_sync_at.as_deref().and_then(parse_timestamp),
            last_sync_error: db.last_sync_error,
            created_at: parse_timestamp(&db.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_timestamp(&db.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

impl From<Connection> for ConnectionDB {
    fn from(domain: Connection) -> Self {
        Self {
            id: domain.id,
            user_id: domain.user_id,
            provider_credential: domain.provider_credential,
            institution_id: domain.institution_id,
            institution_name: domain.institution_name,
            status: domain.status.as_str().to_string(),
            last_sync_at: domain.last_sync_at.map(|at| at.to_rfc3339()),
            last_sync_error: domain.last_sync_error,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }
}
