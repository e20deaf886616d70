//! Wire types for `/transactions/get`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ledgerlink_core::provider::ProviderTransaction;

#[derive(Debug, Clone, Serialize)]
pub struct TransactionsGetRequest<'a> {
    pub client_id: &'a str,
    pub secret: &'a str,
    pub access_token: &'a str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub options: TransactionsGetOptions,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TransactionsGetOptions {
    pub count: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionsGetResponse {
    pub transactions: Vec<PlaidTransaction>,
    pub total_transactions: u32,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaidTransaction {
    pub transaction_id: String,
    pub account_id: String,
    #[serde(default)]
    pub merchant_name: Option<String>,
    pub name: String,
    pub amount: Decimal,
    #[serde(default)]
    pub iso_currency_code: Option<String>,
    #[serde(default)]
    pub unofficial_currency_code: Option<String>,
    #[serde(default)]
    pub original_amount: Option<Decimal>,
    #[serde(default)]
    pub original_currency_code: Option<String>,
    /// Plaid sends `null` for uncategorized records.
    #[serde(default)]
    pub category: Option<Vec<String>>,
    pub date: NaiveDate,
    #[serde(default)]
    pub authorized_date: Option<NaiveDate>,
    #[serde(default)]
    pub pending: bool,
}

impl From<PlaidTransaction> for ProviderTransaction {
    fn from(wire: PlaidTransaction) -> Self {
        Self {
            transaction_id: wire.transaction_id,
            account_id: wire.account_id,
            merchant_name: wire.merchant_name,
            name: wire.name,
            amount: wire.amount,
            iso_currency_code: wire.iso_currency_code,
            unofficial_currency_code: wire.unofficial_currency_code,
            original_amount: wire.original_amount,
            original_currency_code: wire.original_currency_code,
            category: wire.category.unwrap_or_default(),
            date: wire.date,
            authorized_date: wire.authorized_date,
            pending: wire.pending,
        }
    }
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaidErrorBody {
    #[serde(default)]
    pub error_type: String,
    #[serde(default)]
    pub error_code: String,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub request_id: Option<String>,
}
