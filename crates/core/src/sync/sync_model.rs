//! Sync outcomes and window computation.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncType {
    /// No transactions stored yet for the connection.
    Initial,
    /// Resumes after the latest stored transaction date.
    Incremental,
}

impl SyncType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Incremental => "incremental",
        }
    }
}

/// Inclusive date range requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Picks the sync type and window from the latest stored transaction date.
///
/// Initial syncs cover `initial_days` back from `today`. Incremental syncs start
/// the day after `latest`, clamped so the window never starts after `today`.
pub fn plan_sync_window(
    latest: Option<NaiveDate>,
    today: NaiveDate,
    initial_days: i64,
) -> (SyncType, SyncWindow) {
    match latest {
        None => (
            SyncType::Initial,
            SyncWindow {
                start_date: today - Duration::days(initial_days),
                end_date: today,
            },
        ),
        Some(latest) => (
            SyncType::Incremental,
            SyncWindow {
                start_date: (latest + Duration::days(1)).min(today),
                end_date: today,
            },
        ),
    }
}

/// Result of one `sync_connection` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub success: bool,
    pub connection_id: String,
    pub sync_type: SyncType,
    pub transactions_inserted: usize,
    pub duplicates_skipped: usize,
    pub total_fetched: usize,
    pub retry_count: u32,
    pub transaction_ids: Vec<String>,
    pub error: Option<String>,
}

impl SyncOutcome {
    pub fn failed(
        connection_id: impl Into<String>,
        sync_type: SyncType,
        retry_count: u32,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            connection_id: connection_id.into(),
            sync_type,
            transactions_inserted: 0,
            duplicates_skipped: 0,
            total_fetched: 0,
            retry_count,
            transaction_ids: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Failed outcome for a sync rejected before any fetch.
    pub fn rejected(connection_id: impl Into<String>, err: &Error) -> Self {
        Self::failed(connection_id, SyncType::Initial, 0, err.to_string())
    }
}

/// Aggregate of a sweep across connections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSyncResult {
    pub synced: Vec<SyncOutcome>,
    pub failed: Vec<SyncOutcome>,
    pub total_inserted: usize,
    pub total_duplicates_skipped: usize,
}

impl BatchSyncResult {
    pub fn record(&mut self, outcome: SyncOutcome) {
        if outcome.success {
            self.total_inserted += outcome.transactions_inserted;
            self.total_duplicates_skipped += outcome.duplicates_skipped;
            self.synced.push(outcome);
        } else {
            self.failed.push(outcome);
        }
    }
}
