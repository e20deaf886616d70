use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Posted,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Posted => "posted",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "posted" => Some(Self::Posted),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Normalized ledger entry. `external_transaction_id` is unique store-wide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub connection_id: String,
    pub external_transaction_id: String,
    pub account_id: String,
    pub merchant_name: Option<String>,
    pub name: String,
    pub amount: Decimal,
    pub currency_code: String,
    pub original_amount: Option<Decimal>,
    pub original_currency_code: Option<String>,
    pub category: Vec<String>,
    pub date: NaiveDate,
    pub authorized_date: Option<NaiveDate>,
    pub status: TransactionStatus,
    pub pending: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub id: String,
    pub user_id: String,
    pub connection_id: String,
    pub external_transaction_id: String,
    pub account_id: String,
    pub merchant_name: Option<String>,
    pub name: String,
    pub amount: Decimal,
    pub currency_code: String,
    pub original_amount: Option<Decimal>,
    pub original_currency_code: Option<String>,
    pub category: Vec<String>,
    pub date: NaiveDate,
    pub authorized_date: Option<NaiveDate>,
    pub status: Option<TransactionStatus>,
    pub pending: bool,
}

impl Transaction {
    /// Builds a transaction, keeping the original amount/currency pair only when
    /// it names a currency other than the settlement currency.
    pub fn new(params: NewTransaction) -> Self {
        let is_foreign = params
            .original_currency_code
            .as_deref()
            .is_some_and(|original| !original.is_empty() && original != params.currency_code);
        let (original_amount, original_currency_code) = if is_foreign {
            (params.original_amount, params.original_currency_code)
        } else {
            (None, None)
        };
        let now = Utc::now();

        Self {
            id: params.id,
            user_id: params.user_id,
            connection_id: params.connection_id,
            external_transaction_id: params.external_transaction_id,
            account_id: params.account_id,
            merchant_name: params.merchant_name,
            name: params.name,
            amount: params.amount,
            currency_code: params.currency_code,
            original_amount,
            original_currency_code,
            category: params.category,
            date: params.date,
            authorized_date: params.authorized_date,
            status: params.status.unwrap_or(if params.pending {
                TransactionStatus::Pending
            } else {
                TransactionStatus::Posted
            }),
            pending: params.pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_foreign_currency(&self) -> bool {
        self.original_currency_code.is_some()
    }

    pub fn summary(&self) -> TransactionSummary {
        TransactionSummary::from(self)
    }
}

/// Outcome of a deduplicating bulk insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkInsertResult {
    pub inserted: usize,
    pub duplicates_skipped: usize,
    /// Internal ids of the rows actually written, in input order.
    pub transaction_ids: Vec<String>,
}

impl BulkInsertResult {
    pub fn record_inserted(&mut self, transaction_id: String) {
        self.inserted += 1;
        self.transaction_ids.push(transaction_id);
    }

    pub fn record_duplicate(&mut self) {
        self.duplicates_skipped += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub id: String,
    pub merchant_name: Option<String>,
    pub name: String,
    pub amount: Decimal,
    pub currency_code: String,
    pub original_amount: Option<Decimal>,
    pub original_currency_code: Option<String>,
    pub category: Vec<String>,
    pub date: NaiveDate,
    pub pending: bool,
}

impl From<&Transaction> for TransactionSummary {
    fn from(txn: &Transaction) -> Self {
        Self {
            id: txn.id.clone(),
            merchant_name: txn.merchant_name.clone(),
            name: txn.name.clone(),
            amount: txn.amount,
            currency_code: txn.currency_code.clone(),
            original_amount: txn.original_amount,
            original_currency_code: txn.original_currency_code.clone(),
            category: txn.category.clone(),
            date: txn.date,
            pending: txn.pending,
        }
    }
}
