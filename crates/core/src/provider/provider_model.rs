use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raw transaction as reported by the provider, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderTransaction {
    pub transaction_id: String,
    pub account_id: String,
    pub merchant_name: Option<String>,
    pub name: String,
    pub amount: Decimal,
    pub iso_currency_code: Option<String>,
    pub unofficial_currency_code: Option<String>,
    pub original_amount: Option<Decimal>,
    pub original_currency_code: Option<String>,
    #[serde(default)]
    pub category: Vec<String>,
    pub date: NaiveDate,
    pub authorized_date: Option<NaiveDate>,
    pub pending: bool,
}

/// One page of a paginated fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPage {
    pub transactions: Vec<ProviderTransaction>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

impl TransactionPage {
    pub fn last(transactions: Vec<ProviderTransaction>) -> Self {
        Self {
            transactions,
            has_more: false,
            next_cursor: None,
        }
    }

    pub fn with_cursor(transactions: Vec<ProviderTransaction>, next_cursor: impl Into<String>) -> Self {
        Self {
            transactions,
            has_more: true,
            next_cursor: Some(next_cursor.into()),
        }
    }
}
