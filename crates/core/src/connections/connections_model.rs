use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health of a bank link as seen by the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Active,
    Failed,
    /// Terminal for the engine.
    Disconnected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Failed => "failed",
            Self::Disconnected => "disconnected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "failed" => Some(Self::Failed),
            "disconnected" => Some(Self::Disconnected),
            _ => None,
        }
    }
}

/// One linked account-aggregation item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub user_id: String,
    /// Opaque provider access token. Never leaves the backend.
    #[serde(skip_serializing)]
    pub provider_credential: String,
    pub institution_id: String,
    pub institution_name: String,
    pub status: ConnectionStatus,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_sync_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a freshly linked item.
#[derive(Debug, Clone)]
pub struct NewConnection {
    pub id: String,
    pub user_id: String,
    pub provider_credential: String,
    pub institution_id: String,
    pub institution_name: String,
    pub status: Option<ConnectionStatus>,
}

impl Connection {
    pub fn new(params: NewConnection) -> Self {
        let now = Utc::now();
        Self {
            id: params.id,
            user_id: params.user_id,
            provider_credential: params.provider_credential,
            institution_id: params.institution_id,
            institution_name: params.institution_name,
            status: params.status.unwrap_or(ConnectionStatus::Active),
            last_sync_at: None,
            last_sync_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_syncable(&self) -> bool {
        self.status != ConnectionStatus::Disconnected
    }

    /// Successful sync: back to active with the error cleared.
    pub fn mark_synced(&mut self, at: DateTime<Utc>) {
        self.status = ConnectionStatus::Active;
        self.last_sync_at = Some(at);
        self.last_sync_error = None;
        self.updated_at = at;
    }

    /// Provider-side sync failure. `last_sync_at` keeps the last good sync.
    pub fn mark_failed(&mut self, error: impl Into<String>, at: DateTime<Utc>) {
        self.status = ConnectionStatus::Failed;
        self.last_sync_error = Some(error.into());
        self.updated_at = at;
    }

    pub fn disconnect(&mut self, at: DateTime<Utc>) {
        self.status = ConnectionStatus::Disconnected;
        self.updated_at = at;
    }

    pub fn summary(&self) -> ConnectionSummary {
        ConnectionSummary::from(self)
    }
}

/// Client-facing view of a connection without the credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSummary {
    pub id: String,
    pub institution_id: String,
    pub institution_name: String,
    pub status: ConnectionStatus,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Connection> for ConnectionSummary {
    fn from(connection: &Connection) -> Self {
        Self {
            id: connection.id.clone(),
            institution_id: connection.institution_id.clone(),
            institution_name: connection.institution_name.clone(),
            status: connection.status,
            last_sync_at: connection.last_sync_at,
            created_at: connection.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> Connection {
        Connection::new(NewConnection {
            id: "conn-1".to_string(),
            user_id: "user-1".to_string(),
            provider_credential: "access-sandbox-1".to_string(),
            institution_id: "ins_1".to_string(),
            institution_name: "First Platypus Bank".to_string(),
            status: None,
        })
    }

    #[test]
    fn new_connection_defaults_to_active() {
        let conn = connection();
        assert_eq!(conn.status, ConnectionStatus::Active);
        assert!(conn.last_sync_at.is_none());
        assert!(conn.is_syncable());
    }

    #[test]
    fn failure_then_success_restores_active() {
        let mut conn = connection();
        let failed_at = Utc::now();
        conn.mark_failed("ITEM_LOGIN_REQUIRED", failed_at);
        assert_eq!(conn.status, ConnectionStatus::Failed);
        assert_eq!(conn.last_sync_error.as_deref(), Some("ITEM_LOGIN_REQUIRED"));
        assert!(conn.last_sync_at.is_none());

        let synced_at = Utc::now();
        conn.mark_synced(synced_at);
        assert_eq!(conn.status, ConnectionStatus::Active);
        assert_eq!(conn.last_sync_at, Some(synced_at));
        assert!(conn.last_sync_error.is_none());
    }

    #[test]
    fn disconnected_is_not_syncable() {
        let mut conn = connection();
        conn.disconnect(Utc::now());
        assert!(!conn.is_syncable());
    }

    #[test]
    fn summary_omits_credential() {
        let json = serde_json::to_value(connection()).expect("serialize connection");
        assert!(json.get("providerCredential").is_none());
        let summary = connection().summary();
        assert_eq!(summary.institution_name, "First Platypus Bank");
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            ConnectionStatus::Active,
            ConnectionStatus::Failed,
            ConnectionStatus::Disconnected,
        ] {
            assert_eq!(ConnectionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ConnectionStatus::parse("paused"), None);
    }
}
