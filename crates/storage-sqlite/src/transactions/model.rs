//! Database model for ledger transactions.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ledgerlink_core::transactions::{Transaction, TransactionStatus};

use crate::errors::StorageError;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct TransactionDB {
    pub id: String,
    pub user_id: String,
    pub connection_id: String,
    pub external_transaction_id: String,
    pub account_id: String,
    pub merchant_name: Option<String>,
    pub name: String,
    pub amount: String,
    pub currency_code: String,
    pub original_amount: Option<String>,
    pub original_currency_code: Option<String>,
    /// JSON array of category labels.
    pub category: String,
    pub date: String,
    pub authorized_date: Option<String>,
    pub status: String,
    pub pending: bool,
    pub created_at: String,
    pub updated_at: String,
}

pub(crate) fn format_date(value: NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

fn parse_date(column: &'static str, value: &str) -> Result<NaiveDate, StorageError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| StorageError::invalid_data(column, value))
}

fn parse_decimal(column: &'static str, value: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(value).map_err(|_| StorageError::invalid_data(column, value))
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl TryFrom<TransactionDB> for Transaction {
    type Error = StorageError;

    fn try_from(db: TransactionDB) -> Result<Self, Self::Error> {
        let status = TransactionStatus::parse(&db.status)
            .ok_or_else(|| StorageError::invalid_data("status", db.status.clone()))?;
        let category: Vec<String> = serde_json::from_str(&db.category)
            .map_err(|_| StorageError::invalid_data("category", db.category.clone()))?;

        Ok(Self {
            amount: parse_decimal("amount", &db.amount)?,
            original_amount: db
                .original_amount
                .as_deref()
                .map(|v| parse_decimal("original_amount", v))
                .transpose()?,
            date: parse_date("date", &db.date)?,
            authorized_date: db
                .authorized_date
                .as_deref()
                .map(|v| parse_date("authorized_date", v))
                .transpose()?,
            created_at: parse_timestamp(&db.created_at),
            updated_at: parse_timestamp(&db.updated_at),
            id: db.id,
            user_id: db.user_id,
            connection_id: db.connection_id,
            external_transaction_id: db.external_transaction_id,
            account_id: db.account_id,
            merchant_name: db.merchant_name,
            name: db.name,
            currency_code: db.currency_code,
            original_currency_code: db.original_currency_code,
            category,
            status,
            pending: db.pending,
        })
    }
}

impl From<Transaction> for TransactionDB {
    fn from(domain: Transaction) -> Self {
        Self {
            id: domain.id,
            user_id: domain.user_id,
            connection_id: domain.connection_id,
            external_transaction_id: domain.external_transaction_id,
            account_id: domain.account_id,
            merchant_name: domain.merchant_name,
            name: domain.name,
            amount: domain.amount.to_string(),
            currency_code: domain.currency_code,
            original_amount: domain.original_amount.map(|v| v.to_string()),
            original_currency_code: domain.original_currency_code,
            category: serde_json::to_string(&domain.category).unwrap_or_else(|_| "[]".to_string()),
            date: format_date(domain.date),
            authorized_date: domain.authorized_date.map(format_date),
            status: domain.status.as_str().to_string(),
            pending: domain.pending,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }
}

/// Decodes a batch of rows, failing on the first undecodable one.
pub(crate) fn into_domain(rows: Vec<TransactionDB>) -> Result<Vec<Transaction>, StorageError> {
    rows.into_iter().map(Transaction::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> Transaction {
        let now = Utc::now();
        Transaction {
            id: "t-1".to_string(),
            user_id: "u-1".to_string(),
            connection_id: "c-1".to_string(),
            external_transaction_id: "ext-1".to_string(),
            account_id: "acc-1".to_string(),
            merchant_name: None,
            name: "Coffee".to_string(),
            amount: dec!(4.50),
            currency_code: "EUR".to_string(),
            original_amount: Some(dec!(5.10)),
            original_currency_code: Some("USD".to_string()),
            category: vec!["Food and Drink".to_string(), "Coffee Shop".to_string()],
            date: NaiveDate::from_ymd_opt(2026, 3, 7).unwrap(),
            authorized_date: None,
            status: TransactionStatus::Posted,
            pending: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn columns_use_text_encodings() {
        let db = TransactionDB::from(sample());
        assert_eq!(db.amount, "4.50");
        assert_eq!(db.original_amount.as_deref(), Some("5.10"));
        assert_eq!(db.date, "2026-03-07");
        assert_eq!(db.category, r#"["Food and Drink","Coffee Shop"]"#);
        assert_eq!(db.status, "posted");
    }

    #[test]
    fn bad_amount_is_reported_with_column() {
        let mut db = TransactionDB::from(sample());
        db.amount = "twelve".to_string();
        let err = Transaction::try_from(db).unwrap_err();
        assert_eq!(err.to_string(), "Invalid stored value in amount: twelve");
    }
}
