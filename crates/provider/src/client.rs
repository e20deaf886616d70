//! HTTP client for the Plaid transactions API.
//!
//! Paging uses `/transactions/get` offsets; the opaque cursor handed back to
//! the sync engine is the decimal offset of the next page.

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;

use ledgerlink_core::provider::{
    ProviderError, ProviderTransaction, TransactionPage, TransactionProviderTrait,
};
use ledgerlink_core::sync::{classify_http_status, SyncRetryClass};

use crate::config::PlaidConfig;
use crate::error::PlaidSetupError;
use crate::types::{
    PlaidErrorBody, TransactionsGetOptions, TransactionsGetRequest, TransactionsGetResponse,
};

const MAX_LOG_BODY_CHARS: usize = 512;

fn log_response(status: reqwest::StatusCode, body: &str) {
    if status.is_success() {
        debug!("[PlaidClient] Response status: {}", status);
        return;
    }

    let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
    if body.chars().count() > MAX_LOG_BODY_CHARS {
        preview.push_str("...");
    }
    debug!("[PlaidClient] Response error ({}): {}", status, preview);
}

fn map_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() || err.is_connect() {
        ProviderError::timeout(err.to_string())
    } else {
        ProviderError::unavailable(err.to_string())
    }
}

/// Maps a non-2xx response onto the provider error taxonomy. The Plaid error
/// envelope wins over the HTTP status when it names a known condition.
pub(crate) fn map_api_error(status: u16, body: Option<&PlaidErrorBody>) -> ProviderError {
    if let Some(body) = body {
        let message = if body.error_message.is_empty() {
            body.error_code.clone()
        } else {
            format!("{}: {}", body.error_code, body.error_message)
        };
        match (body.error_type.as_str(), body.error_code.as_str()) {
            ("RATE_LIMIT_EXCEEDED", _) | (_, "RATE_LIMIT_EXCEEDED") => {
                return ProviderError::rate_limited(message)
            }
            (_, "ITEM_LOGIN_REQUIRED") | (_, "INVALID_ACCESS_TOKEN") => {
                return ProviderError::invalid_credential(message)
            }
            ("API_ERROR", _) | ("INSTITUTION_ERROR", _) | (_, "PRODUCT_NOT_READY") => {
                return ProviderError::unavailable(message)
            }
            _ => {}
        }
        if !body.error_code.is_empty() {
            return match classify_http_status(status) {
                SyncRetryClass::ReauthRequired => ProviderError::invalid_credential(message),
                SyncRetryClass::Retryable if status == 429 => ProviderError::rate_limited(message),
                SyncRetryClass::Retryable => ProviderError::unavailable(message),
                SyncRetryClass::Permanent => {
                    ProviderError::rejected(body.error_code.clone(), body.error_message.clone())
                }
            };
        }
    }

    let message = format!("HTTP {}", status);
    match classify_http_status(status) {
        SyncRetryClass::ReauthRequired => ProviderError::invalid_credential(message),
        SyncRetryClass::Retryable if status == 429 => ProviderError::rate_limited(message),
        SyncRetryClass::Retryable => ProviderError::unavailable(message),
        SyncRetryClass::Permanent => ProviderError::rejected(status.to_string(), message),
    }
}

fn parse_cursor(cursor: Option<&str>) -> Result<u32, ProviderError> {
    match cursor {
        None => Ok(0),
        Some(raw) => raw.parse::<u32>().map_err(|_| {
            ProviderError::rejected("INVALID_CURSOR", format!("Cursor '{}' is not an offset", raw))
        }),
    }
}

/// Client for Plaid's `/transactions/get`.
#[derive(Debug, Clone)]
pub struct PlaidClient {
    client: reqwest::Client,
    config: PlaidConfig,
}

impl PlaidClient {
    pub fn new(config: PlaidConfig) -> Result<Self, PlaidSetupError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &PlaidConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn post_transactions_get(
        &self,
        request: &TransactionsGetRequest<'_>,
    ) -> Result<TransactionsGetResponse, ProviderError> {
        let url = self.url("/transactions/get");
        debug!(
            "[PlaidClient] POST {} (offset={}, count={})",
            url, request.options.offset, request.options.count
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;
        log_response(status, &body);

        if !status.is_success() {
            let envelope = serde_json::from_str::<PlaidErrorBody>(&body).ok();
            return Err(map_api_error(status.as_u16(), envelope.as_ref()));
        }

        serde_json::from_str::<TransactionsGetResponse>(&body)
            .map_err(|e| ProviderError::malformed(format!("Invalid /transactions/get body: {}", e)))
    }
}

#[async_trait]
impl TransactionProviderTrait for PlaidClient {
    async fn get_transactions(
        &self,
        credential: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        cursor: Option<&str>,
    ) -> Result<TransactionPage, ProviderError> {
        let offset = parse_cursor(cursor)?;
        let request = TransactionsGetRequest {
            client_id: &self.config.client_id,
            secret: &self.config.secret,
            access_token: credential,
            start_date,
            end_date,
            options: TransactionsGetOptions {
                count: self.config.page_size,
                offset,
            },
        };

        let response = self.post_transactions_get(&request).await?;
        let received = response.transactions.len() as u32;
        let next_offset = offset.saturating_add(received);
        let transactions: Vec<ProviderTransaction> = response
            .transactions
            .into_iter()
            .map(ProviderTransaction::from)
            .collect();

        if next_offset < response.total_transactions {
            Ok(TransactionPage::with_cursor(
                transactions,
                next_offset.to_string(),
            ))
        } else {
            Ok(TransactionPage::last(transactions))
        }
    }
}
