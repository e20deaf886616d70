//! Errors raised while configuring the Plaid client.
//!
//! Request-time failures never surface here; they are mapped to
//! `ProviderError` at the client edge.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaidSetupError {
    /// Required environment variable is unset or empty
    #[error("Missing required environment variable {0}")]
    MissingVar(&'static str),

    /// `PLAID_ENV` names an environment we don't know
    #[error("Unknown Plaid environment '{0}'")]
    UnknownEnvironment(String),

    /// HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
