use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::dsl::{count_star, max};
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::debug;

use ledgerlink_core::transactions::{BulkInsertResult, Transaction, TransactionRepositoryTrait};
use ledgerlink_core::{Error, Result};

use super::model::{format_date, into_domain, TransactionDB, DATE_FORMAT};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::transactions;
use crate::schema::transactions::dsl::*;

pub struct TransactionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl TransactionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        TransactionRepository { pool, writer }
    }
}

#[async_trait]
impl TransactionRepositoryTrait for TransactionRepository {
    async fn save(&self, transaction: Transaction) -> Result<Transaction> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Transaction> {
                let row: TransactionDB = transaction.into();

                let clash = transactions
                    .filter(external_transaction_id.eq(&row.external_transaction_id))
                    .filter(id.ne(&row.id))
                    .select(id)
                    .first::<String>(conn)
                    .optional()
                    .map_err(StorageError::from)?;
                if clash.is_some() {
                    return Err(Error::duplicate_transaction(row.external_transaction_id));
                }

                let stored = diesel::insert_into(transactions::table)
                    .values(&row)
                    .on_conflict(id)
                    .do_update()
                    .set(&row)
                    .returning(TransactionDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Transaction::try_from(stored)?)
            })
            .await
    }

    async fn bulk_insert(&self, batch: Vec<Transaction>) -> Result<BulkInsertResult> {
        if batch.is_empty() {
            return Ok(BulkInsertResult::default());
        }

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<BulkInsertResult> {
                let mut result = BulkInsertResult::default();
                for txn in batch {
                    let row: TransactionDB = txn.into();
                    let affected = diesel::insert_into(transactions::table)
                        .values(&row)
                        .on_conflict(external_transaction_id)
                        .do_nothing()
                        .execute(conn)
                        .map_err(StorageError::from)?;
                    if affected == 0 {
                        debug!(
                            "[Storage] Skipping duplicate transaction {}",
                            row.external_transaction_id
                        );
                        result.record_duplicate();
                    } else {
                        result.record_inserted(row.id);
                    }
                }
                Ok(result)
            })
            .await
    }

    fn find_by_id(&self, transaction_id: &str) -> Result<Option<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let row = transactions
            .find(transaction_id)
            .first::<TransactionDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Transaction::try_from).transpose()?)
    }

    fn find_by_user_id(
        &self,
        owner_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = transactions
            .filter(user_id.eq(owner_id))
            .order((date.desc(), created_at.desc(), id.asc()))
            .into_boxed();
        if let Some(limit) = limit {
            query = query.limit(limit.max(0));
        }
        if let Some(offset) = offset {
            query = query.offset(offset.max(0));
        }
        let rows = query
            .load::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(into_domain(rows)?)
    }

    fn count_by_user_id(&self, owner_id: &str) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        let total = transactions
            .filter(user_id.eq(owner_id))
            .select(count_star())
            .first::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(total)
    }

    fn find_by_connection_id(&self, owner_connection_id: &str) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = transactions
            .filter(connection_id.eq(owner_connection_id))
            .order((date.desc(), created_at.desc(), id.asc()))
            .load::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(into_domain(rows)?)
    }

    fn find_by_external_id(&self, external_id: &str) -> Result<Option<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let row = transactions
            .filter(external_transaction_id.eq(external_id))
            .first::<TransactionDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Transaction::try_from).transpose()?)
    }

    fn find_by_external_ids(&self, external_ids: &[String]) -> Result<Vec<Transaction>> {
        if external_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = get_connection(&self.pool)?;
        let mut rows = Vec::with_capacity(external_ids.len());
        // Stay well under SQLite's bound-parameter limit.
        for chunk in external_ids.chunks(500) {
            rows.extend(
                transactions
                    .filter(external_transaction_id.eq_any(chunk))
                    .load::<TransactionDB>(&mut conn)
                    .map_err(StorageError::from)?,
            );
        }
        Ok(into_domain(rows)?)
    }

    fn get_transactions_in_range(
        &self,
        owner_connection_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = transactions
            .filter(connection_id.eq(owner_connection_id))
            .filter(date.ge(format_date(start_date)))
            .filter(date.le(format_date(end_date)))
            .order((date.asc(), created_at.asc(), id.asc()))
            .load::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(into_domain(rows)?)
    }

    fn get_latest_transaction_date(&self, owner_connection_id: &str) -> Result<Option<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;
        let latest = transactions
            .filter(connection_id.eq(owner_connection_id))
            .select(max(date))
            .first::<Option<String>>(&mut conn)
            .map_err(StorageError::from)?;

        latest
            .map(|value| {
                NaiveDate::parse_from_str(&value, DATE_FORMAT)
                    .map_err(|_| Error::from(StorageError::invalid_data("date", value)))
            })
            .transpose()
    }

    async fn delete_by_user_id(&self, owner_id: &str) -> Result<usize> {
        let owner_id = owner_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let affected = diesel::delete(transactions.filter(user_id.eq(owner_id)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(affected)
            })
            .await
    }

    async fn delete_by_connection_id(&self, owner_connection_id: &str) -> Result<usize> {
        let owner_connection_id = owner_connection_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let affected =
                    diesel::delete(transactions.filter(connection_id.eq(owner_connection_id)))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                Ok(affected)
            })
            .await
    }
}
