use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sync::SyncType;

/// Payload of a completed connection sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCompletedEvent {
    pub connection_id: String,
    pub user_id: String,
    pub transaction_ids: Vec<String>,
    pub sync_type: SyncType,
    pub transactions_inserted: usize,
    pub duplicates_skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum DomainEventKind {
    TransactionsSynced(SyncCompletedEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: DomainEventKind,
}

impl DomainEvent {
    pub fn transactions_synced(payload: SyncCompletedEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            kind: DomainEventKind::TransactionsSynced(payload),
        }
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            DomainEventKind::TransactionsSynced(_) => "TransactionsSynced",
        }
    }

    pub fn as_transactions_synced(&self) -> Option<&SyncCompletedEvent> {
        match &self.kind {
            DomainEventKind::TransactionsSynced(payload) => Some(payload),
        }
    }
}
