use thiserror::Error;

use crate::sync::SyncRetryClass;

/// Typed provider failure. Classification for retries comes from the variant,
/// never from the message text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Request timed out or the connection dropped
    #[error("Provider request timed out: {0}")]
    Timeout(String),

    /// Provider throttled the caller
    #[error("Provider rate limit exceeded: {0}")]
    RateLimited(String),

    /// Provider or upstream institution is temporarily unavailable
    #[error("Provider temporarily unavailable: {0}")]
    Unavailable(String),

    /// Credential revoked or requires the user to re-link
    #[error("Provider credential rejected: {0}")]
    InvalidCredential(String),

    /// Any other error response
    #[error("Provider rejected request ({code}): {message}")]
    Rejected { code: String, message: String },

    /// Response could not be decoded or broke the paging protocol
    #[error("Provider response malformed: {0}")]
    Malformed(String),
}

impl ProviderError {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn invalid_credential(message: impl Into<String>) -> Self {
        Self::InvalidCredential(message.into())
    }

    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Classify error for retry policy.
    pub fn retry_class(&self) -> SyncRetryClass {
        match self {
            Self::Timeout(_) | Self::RateLimited(_) | Self::Unavailable(_) => {
                SyncRetryClass::Retryable
            }
            Self::InvalidCredential(_) => SyncRetryClass::ReauthRequired,
            Self::Rejected { .. } | Self::Malformed(_) => SyncRetryClass::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.retry_class() == SyncRetryClass::Retryable
    }
}
