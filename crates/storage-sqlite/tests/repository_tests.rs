use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;
use tempfile::TempDir;

use ledgerlink_core::connections::{
    Connection, ConnectionRepositoryTrait, ConnectionStatus, NewConnection,
};
use ledgerlink_core::transactions::{
    NewTransaction, Transaction, TransactionRepositoryTrait, TransactionStatus,
};
use ledgerlink_core::Error;
use ledgerlink_storage_sqlite::{init, ConnectionRepository, TransactionRepository, WriteHandle};

struct TestDb {
    _dir: TempDir,
    connections: ConnectionRepository,
    transactions: TransactionRepository,
}

fn setup() -> TestDb {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ledger.db");
    let pool = init(path.to_str().expect("utf-8 path")).expect("init db");
    let writer = WriteHandle::spawn(Arc::clone(&pool)).expect("writer");
    TestDb {
        _dir: dir,
        connections: ConnectionRepository::new(Arc::clone(&pool), writer.clone()),
        transactions: TransactionRepository::new(pool, writer),
    }
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_connection(id: &str, user_id: &str) -> Connection {
    Connection::new(NewConnection {
        id: id.to_string(),
        user_id: user_id.to_string(),
        provider_credential: format!("access-sandbox-{}", id),
        institution_id: "ins_3".to_string(),
        institution_name: "Chase".to_string(),
        status: None,
    })
}

fn txn(connection: &Connection, external_id: &str, date: NaiveDate) -> Transaction {
    Transaction::new(NewTransaction {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: connection.user_id.clone(),
        connection_id: connection.id.clone(),
        external_transaction_id: external_id.to_string(),
        account_id: "acc-1".to_string(),
        merchant_name: Some("Uber".to_string()),
        name: "Uber 063015 SF**POOL**".to_string(),
        amount: dec!(5.40),
        currency_code: "USD".to_string(),
        original_amount: None,
        original_currency_code: None,
        category: vec!["Travel".to_string(), "Taxi".to_string()],
        date,
        authorized_date: Some(date),
        status: None,
        pending: false,
    })
}

#[tokio::test]
async fn connection_lifecycle_round_trips_through_sqlite() {
    let db = setup();
    let created = db
        .connections
        .create(new_connection("conn-1", "user-1"))
        .await
        .expect("create");
    assert_eq!(created.status, ConnectionStatus::Active);

    let mut loaded = db
        .connections
        .find_by_id("conn-1")
        .expect("query")
        .expect("row");
    assert_eq!(loaded.provider_credential, "access-sandbox-conn-1");
    assert!(loaded.last_sync_at.is_none());

    loaded.mark_failed("ITEM_LOGIN_REQUIRED", Utc::now());
    let updated = db.connections.update(loaded).await.expect("update");
    assert_eq!(updated.status, ConnectionStatus::Failed);
    assert_eq!(updated.last_sync_error.as_deref(), Some("ITEM_LOGIN_REQUIRED"));

    let mut recovered = updated;
    recovered.mark_synced(Utc::now());
    let recovered = db.connections.update(recovered).await.expect("update");
    assert_eq!(recovered.status, ConnectionStatus::Active);
    assert!(recovered.last_sync_error.is_none());
    assert!(recovered.last_sync_at.is_some());

    assert_eq!(db.connections.find_active_connections().unwrap().len(), 1);
    assert!(db
        .connections
        .find_by_status(ConnectionStatus::Failed)
        .unwrap()
        .is_empty());

    assert_eq!(db.connections.delete("conn-1").await.unwrap(), 1);
    assert!(db.connections.find_by_id("conn-1").unwrap().is_none());
}

#[tokio::test]
async fn updating_missing_connection_is_not_found() {
    let db = setup();
    let err = db
        .connections
        .update(new_connection("ghost", "user-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ConnectionNotFound { .. }));
}

#[tokio::test]
async fn connections_are_listed_per_user() {
    let db = setup();
    db.connections
        .create(new_connection("a", "user-1"))
        .await
        .unwrap();
    db.connections
        .create(new_connection("b", "user-1"))
        .await
        .unwrap();
    db.connections
        .create(new_connection("c", "user-2"))
        .await
        .unwrap();

    let mine = db.connections.find_by_user_id("user-1").unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|c| c.user_id == "user-1"));
}

#[tokio::test]
async fn bulk_insert_skips_stored_and_in_batch_duplicates() {
    let db = setup();
    let conn = db
        .connections
        .create(new_connection("conn-1", "user-1"))
        .await
        .unwrap();

    let first = db
        .transactions
        .bulk_insert(vec![
            txn(&conn, "ext-1", day(2026, 5, 1)),
            txn(&conn, "ext-2", day(2026, 5, 2)),
        ])
        .await
        .expect("first batch");
    assert_eq!(first.inserted, 2);
    assert_eq!(first.duplicates_skipped, 0);

    let second = db
        .transactions
        .bulk_insert(vec![
            txn(&conn, "ext-2", day(2026, 5, 2)),
            txn(&conn, "ext-3", day(2026, 5, 3)),
            txn(&conn, "ext-3", day(2026, 5, 3)),
        ])
        .await
        .expect("second batch");
    assert_eq!(second.inserted, 1);
    assert_eq!(second.duplicates_skipped, 2);
    assert_eq!(second.transaction_ids.len(), 1);

    let stored = db
        .transactions
        .find_by_id(&second.transaction_ids[0])
        .unwrap()
        .expect("inserted row");
    assert_eq!(stored.external_transaction_id, "ext-3");
    assert_eq!(stored.amount, dec!(5.40));
    assert_eq!(stored.category, vec!["Travel", "Taxi"]);
    assert_eq!(stored.status, TransactionStatus::Posted);

    assert_eq!(db.transactions.count_by_user_id("user-1").unwrap(), 3);
}

#[tokio::test]
async fn empty_bulk_insert_is_a_no_op() {
    let db = setup();
    let result = db.transactions.bulk_insert(Vec::new()).await.unwrap();
    assert_eq!(result.inserted, 0);
    assert_eq!(result.duplicates_skipped, 0);
}

#[tokio::test]
async fn save_rejects_external_id_owned_by_another_row() {
    let db = setup();
    let conn = db
        .connections
        .create(new_connection("conn-1", "user-1"))
        .await
        .unwrap();

    let original = db
        .transactions
        .save(txn(&conn, "ext-1", day(2026, 5, 1)))
        .await
        .expect("save");

    let err = db
        .transactions
        .save(txn(&conn, "ext-1", day(2026, 5, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateTransaction { .. }));

    let mut edited = original.clone();
    edited.merchant_name = None;
    edited.status = TransactionStatus::Cancelled;
    let saved = db.transactions.save(edited).await.expect("resave");
    assert_eq!(saved.id, original.id);
    assert!(saved.merchant_name.is_none());
    assert_eq!(saved.status, TransactionStatus::Cancelled);
}

#[tokio::test]
async fn queries_order_and_filter_by_date() {
    let db = setup();
    let conn = db
        .connections
        .create(new_connection("conn-1", "user-1"))
        .await
        .unwrap();
    let other = db
        .connections
        .create(new_connection("conn-2", "user-1"))
        .await
        .unwrap();

    db.transactions
        .bulk_insert(vec![
            txn(&conn, "jan", day(2026, 1, 15)),
            txn(&conn, "mar", day(2026, 3, 10)),
            txn(&conn, "feb", day(2026, 2, 20)),
            txn(&other, "apr", day(2026, 4, 1)),
        ])
        .await
        .unwrap();

    assert_eq!(
        db.transactions
            .get_latest_transaction_date("conn-1")
            .unwrap(),
        Some(day(2026, 3, 10))
    );
    assert_eq!(
        db.transactions.get_latest_transaction_date("nope").unwrap(),
        None
    );

    let newest_first: Vec<_> = db
        .transactions
        .find_by_connection_id("conn-1")
        .unwrap()
        .into_iter()
        .map(|t| t.external_transaction_id)
        .collect();
    assert_eq!(newest_first, vec!["mar", "feb", "jan"]);

    let in_range: Vec<_> = db
        .transactions
        .get_transactions_in_range("conn-1", day(2026, 2, 1), day(2026, 3, 10))
        .unwrap()
        .into_iter()
        .map(|t| t.external_transaction_id)
        .collect();
    assert_eq!(in_range, vec!["feb", "mar"]);

    let page: Vec<_> = db
        .transactions
        .find_by_user_id("user-1", Some(2), Some(1))
        .unwrap()
        .into_iter()
        .map(|t| t.external_transaction_id)
        .collect();
    assert_eq!(page, vec!["mar", "feb"]);

    let by_external = db
        .transactions
        .find_by_external_ids(&["jan".to_string(), "apr".to_string(), "zzz".to_string()])
        .unwrap();
    assert_eq!(by_external.len(), 2);
    assert!(db.transactions.find_by_external_id("feb").unwrap().is_some());
}

#[tokio::test]
async fn deletes_scope_to_owner() {
    let db = setup();
    let conn = db
        .connections
        .create(new_connection("conn-1", "user-1"))
        .await
        .unwrap();
    let other = db
        .connections
        .create(new_connection("conn-2", "user-2"))
        .await
        .unwrap();
    db.transactions
        .bulk_insert(vec![
            txn(&conn, "a", day(2026, 1, 1)),
            txn(&conn, "b", day(2026, 1, 2)),
            txn(&other, "c", day(2026, 1, 3)),
        ])
        .await
        .unwrap();

    assert_eq!(
        db.transactions.delete_by_connection_id("conn-1").await.unwrap(),
        2
    );
    assert_eq!(db.transactions.count_by_user_id("user-2").unwrap(), 1);
    assert_eq!(db.transactions.delete_by_user_id("user-2").await.unwrap(), 1);
    assert_eq!(db.transactions.count_by_user_id("user-2").unwrap(), 0);
}

#[tokio::test]
async fn deleting_connection_cascades_to_transactions() {
    let db = setup();
    let conn = db
        .connections
        .create(new_connection("conn-1", "user-1"))
        .await
        .unwrap();
    db.transactions
        .bulk_insert(vec![txn(&conn, "a", day(2026, 1, 1))])
        .await
        .unwrap();

    db.connections.delete("conn-1").await.unwrap();

    assert!(db.transactions.find_by_external_id("a").unwrap().is_none());
}
