//! Provider record → ledger transaction.

use uuid::Uuid;

use crate::connections::Connection;
use crate::provider::ProviderTransaction;
use crate::transactions::{NewTransaction, Transaction};

/// Settlement currency: ISO code, then the provider's unofficial code, then the
/// configured fallback.
pub fn settlement_currency(raw: &ProviderTransaction, default_currency: &str) -> String {
    declared(&raw.iso_currency_code)
        .or_else(|| declared(&raw.unofficial_currency_code))
        .unwrap_or(default_currency)
        .to_string()
}

fn declared(code: &Option<String>) -> Option<&str> {
    code.as_deref().filter(|code| !code.is_empty())
}

/// Normalizes one provider record for `connection` under a fresh internal id.
pub fn convert_provider_transaction(
    raw: ProviderTransaction,
    connection: &Connection,
    default_currency: &str,
) -> Transaction {
    let currency_code = settlement_currency(&raw, default_currency);
    Transaction::new(NewTransaction {
        id: Uuid::new_v4().to_string(),
        user_id: connection.user_id.clone(),
        connection_id: connection.id.clone(),
        external_transaction_id: raw.transaction_id,
        account_id: raw.account_id,
        merchant_name: raw.merchant_name,
        name: raw.name,
        amount: raw.amount,
        currency_code,
        original_amount: raw.original_amount,
        original_currency_code: raw.original_currency_code,
        category: raw.category,
        date: raw.date,
        authorized_date: raw.authorized_date,
        status: None,
        pending: raw.pending,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections::NewConnection;
    use crate::transactions::TransactionStatus;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn connection() -> Connection {
        Connection::new(NewConnection {
            id: "conn-1".to_string(),
            user_id: "user-1".to_string(),
            provider_credential: "access-sandbox".to_string(),
            institution_id: "ins_3".to_string(),
            institution_name: "Chase".to_string(),
            status: None,
        })
    }

    fn raw() -> ProviderTransaction {
        ProviderTransaction {
            transaction_id: "plaid-txn-1".to_string(),
            account_id: "acc-1".to_string(),
            merchant_name: None,
            name: "Uber 063015 SF**POOL**".to_string(),
            amount: dec!(5.40),
            iso_currency_code: Some("USD".to_string()),
            unofficial_currency_code: None,
            original_amount: Some(dec!(5.40)),
            original_currency_code: Some("USD".to_string()),
            category: vec!["Travel".to_string(), "Taxi".to_string()],
            date: NaiveDate::from_ymd_opt(2026, 4, 2).unwrap(),
            authorized_date: NaiveDate::from_ymd_opt(2026, 4, 1),
            pending: true,
        }
    }

    #[test]
    fn echoed_original_amount_is_not_treated_as_foreign() {
        let txn = convert_provider_transaction(raw(), &connection(), "USD");
        assert_eq!(txn.currency_code, "USD");
        assert!(txn.original_amount.is_none());
        assert!(txn.original_currency_code.is_none());
    }

    #[test]
    fn differing_original_currency_is_kept_verbatim() {
        let mut record = raw();
        record.original_amount = Some(dec!(4.95));
        record.original_currency_code = Some("EUR".to_string());
        let txn = convert_provider_transaction(record, &connection(), "USD");
        assert_eq!(txn.original_amount, Some(dec!(4.95)));
        assert_eq!(txn.original_currency_code.as_deref(), Some("EUR"));
    }

    #[test]
    fn currency_falls_back_to_unofficial_then_default() {
        let mut record = raw();
        record.iso_currency_code = None;
        record.unofficial_currency_code = Some("BTC".to_string());
        assert_eq!(settlement_currency(&record, "USD"), "BTC");

        record.iso_currency_code = Some(String::new());
        assert_eq!(settlement_currency(&record, "USD"), "BTC");

        record.unofficial_currency_code = None;
        assert_eq!(settlement_currency(&record, "CAD"), "CAD");

        record.unofficial_currency_code = Some(String::new());
        assert_eq!(settlement_currency(&record, "CAD"), "CAD");
    }

    #[test]
    fn pending_flag_drives_status_and_ownership_comes_from_connection() {
        let txn = convert_provider_transaction(raw(), &connection(), "USD");
        assert_eq!(txn.status, TransactionStatus::Pending);
        assert!(txn.pending);
        assert_eq!(txn.user_id, "user-1");
        assert_eq!(txn.connection_id, "conn-1");
        assert_eq!(txn.external_transaction_id, "plaid-txn-1");
        assert!(Uuid::parse_str(&txn.id).is_ok());
    }
}
