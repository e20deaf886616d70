use std::fmt;
use std::time::Duration;

use log::warn;

use crate::error::PlaidSetupError;

/// Largest `count` `/transactions/get` accepts.
pub const MAX_PAGE_SIZE: u32 = 500;
pub const DEFAULT_PAGE_SIZE: u32 = MAX_PAGE_SIZE;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaidEnvironment {
    Sandbox,
    Development,
    Production,
}

impl PlaidEnvironment {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Some(Self::Sandbox),
            "development" => Some(Self::Development),
            "production" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => "https://sandbox.plaid.com",
            Self::Development => "https://development.plaid.com",
            Self::Production => "https://production.plaid.com",
        }
    }
}

#[derive(Clone)]
pub struct PlaidConfig {
    pub base_url: String,
    pub client_id: String,
    pub secret: String,
    /// Records requested per page, within `1..=MAX_PAGE_SIZE`.
    pub page_size: u32,
    pub timeout: Duration,
}

// Keeps the secret out of logs.
impl fmt::Debug for PlaidConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaidConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("secret", &"<redacted>")
            .field("page_size", &self.page_size)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(key: &'static str) -> Result<String, PlaidSetupError> {
    env_value(key).ok_or(PlaidSetupError::MissingVar(key))
}

impl PlaidConfig {
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            secret: secret.into(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads `PLAID_CLIENT_ID`, `PLAID_SECRET` and either `PLAID_BASE_URL` or
    /// `PLAID_ENV` (default sandbox). `PLAID_PAGE_SIZE` and
    /// `PLAID_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Result<Self, PlaidSetupError> {
        let base_url = match env_value("PLAID_BASE_URL") {
            Some(url) => url,
            None => {
                let name = env_value("PLAID_ENV").unwrap_or_else(|| "sandbox".to_string());
                PlaidEnvironment::parse(&name)
                    .ok_or(PlaidSetupError::UnknownEnvironment(name))?
                    .base_url()
                    .to_string()
            }
        };

        let mut config = Self::new(base_url, required("PLAID_CLIENT_ID")?, required("PLAID_SECRET")?);

        if let Some(raw) = env_value("PLAID_PAGE_SIZE") {
            match raw.parse::<u32>() {
                Ok(size) => config = config.with_page_size(size),
                Err(_) => warn!("[PlaidConfig] Ignoring invalid PLAID_PAGE_SIZE '{}'", raw),
            }
        }
        if let Some(raw) = env_value("PLAID_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config = config.with_timeout(Duration::from_secs(secs)),
                _ => warn!("[PlaidConfig] Ignoring invalid PLAID_TIMEOUT_SECS '{}'", raw),
            }
        }

        Ok(config)
    }
}
