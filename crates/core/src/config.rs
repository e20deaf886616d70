//! Sync engine configuration.

use std::str::FromStr;
use std::time::Duration;

use log::warn;

/// Trailing window fetched on a connection's first sync.
pub const DEFAULT_INITIAL_SYNC_DAYS: i64 = 90;

/// Retries allowed per page beyond the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base unit of the linear retry backoff.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;

/// Settlement currency used when the provider declares none.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Cadence of the background sweep across active connections.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60 * 60 * 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub initial_sync_days: i64,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub default_currency: String,
    pub sweep_interval: Duration,
    /// Connections synced at once during a sweep. 1 keeps the sweep sequential.
    pub batch_concurrency: usize,
    /// Whether the sweep also picks up connections whose last sync failed.
    pub include_failed_in_sweep: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            initial_sync_days: DEFAULT_INITIAL_SYNC_DAYS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
            default_currency: DEFAULT_CURRENCY.to_string(),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            batch_concurrency: 1,
            include_failed_in_sweep: false,
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env_value(key)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("[SyncConfig] Ignoring invalid value for {}: '{}'", key, raw);
            None
        }
    }
}

impl SyncConfig {
    /// Builds a config from `LEDGERLINK_*` environment variables, falling back to
    /// the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            initial_sync_days: env_parse::<i64>("LEDGERLINK_INITIAL_SYNC_DAYS")
                .filter(|days| *days > 0)
                .unwrap_or(defaults.initial_sync_days),
            max_retries: env_parse("LEDGERLINK_MAX_RETRIES").unwrap_or(defaults.max_retries),
            retry_base_delay: env_parse::<u64>("LEDGERLINK_RETRY_BASE_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base_delay),
            default_currency: env_value("LEDGERLINK_DEFAULT_CURRENCY")
                .map(|c| c.to_uppercase())
                .unwrap_or(defaults.default_currency),
            sweep_interval: env_parse::<u64>("LEDGERLINK_SWEEP_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            batch_concurrency: env_parse::<usize>("LEDGERLINK_BATCH_CONCURRENCY")
                .map(|n| n.max(1))
                .unwrap_or(defaults.batch_concurrency),
            include_failed_in_sweep: env_parse("LEDGERLINK_INCLUDE_FAILED_IN_SWEEP")
                .unwrap_or(defaults.include_failed_in_sweep),
        }
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency.max(1);
        self
    }

    pub fn with_failed_in_sweep(mut self, include: bool) -> Self {
        self.include_failed_in_sweep = include;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_sync_contract() {
        let config = SyncConfig::default();
        assert_eq!(config.initial_sync_days, 90);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_base_delay, Duration::from_secs(1));
        assert_eq!(config.default_currency, "USD");
        assert_eq!(config.batch_concurrency, 1);
        assert!(!config.include_failed_in_sweep);
    }

    #[test]
    fn batch_concurrency_never_drops_below_one() {
        let config = SyncConfig::default().with_batch_concurrency(0);
        assert_eq!(config.batch_concurrency, 1);
    }
}
