//! Implements a SQLite backed transaction store.
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, params_from_iter, types::Value};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{Counterparty, DatabaseID, Transaction, TransactionDraft, TransactionKind, UserID},
    stores::{
        TransactionStore,
        transaction::{CategoryTotal, DateRange, KindTotals, MonthlyTotal, SummaryQuery, TransactionQuery},
    },
};

/// Stores transactions in a SQLite database.
///
/// Note that because a transaction references its owning
/// [User](crate::models::User), the user table must be set up in the database.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

const COLUMNS: &str = "id, kind, amount, category, counterparty, date, note, media_url, owner_id, created_at";

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn push_date_range(
        date_range: &DateRange,
        where_clause_parts: &mut Vec<String>,
        query_parameters: &mut Vec<Value>,
    ) {
        if let Some(start) = date_range.start {
            where_clause_parts.push(format!("date >= ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(start.to_string()));
        }

        if let Some(end) = date_range.end {
            where_clause_parts.push(format!("date <= ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(end.to_string()));
        }
    }

    fn summary_where_clause(query: &SummaryQuery) -> (String, Vec<Value>) {
        let mut where_clause_parts = vec!["owner_id = ?1".to_string()];
        let mut query_parameters = vec![Value::Integer(query.owner.as_i64())];

        if let Some(ref category) = query.category {
            where_clause_parts.push(format!("category = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(category.clone()));
        }

        Self::push_date_range(&query.date_range, &mut where_clause_parts, &mut query_parameters);

        (where_clause_parts.join(" AND "), query_parameters)
    }
}

impl TransactionStore for SQLiteTransactionStore {
    /// Create a new transaction in the database.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an unexpected SQL error.
    fn create(&mut self, draft: TransactionDraft) -> Result<Transaction, Error> {
        let connection = self.connection.lock().unwrap();

        let transaction = connection
            .prepare(&format!(
                "INSERT INTO \"transaction\" (kind, amount, category, counterparty, date, note, media_url, owner_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 RETURNING {COLUMNS}"
            ))?
            .query_row(
                (
                    draft.counterparty.kind().as_str(),
                    draft.amount,
                    &draft.category,
                    draft.counterparty.name(),
                    draft.date,
                    &draft.note,
                    &draft.media_url,
                    draft.owner_id.as_i64(),
                    time::OffsetDateTime::now_utc(),
                ),
                Self::map_row,
            )?;

        Ok(transaction)
    }

    /// Create many transactions in a single database transaction.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an unexpected SQL error. No
    /// rows are persisted in that case.
    fn import(&mut self, drafts: Vec<TransactionDraft>) -> Result<Vec<Transaction>, Error> {
        let connection = self.connection.lock().unwrap();

        let tx = connection.unchecked_transaction()?;
        let mut imported_transactions = Vec::with_capacity(drafts.len());

        // Prepare the insert statement once for reuse
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO \"transaction\" (kind, amount, category, counterparty, date, note, media_url, owner_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {COLUMNS}"
        ))?;

        for draft in drafts {
            let transaction = stmt.query_row(
                (
                    draft.counterparty.kind().as_str(),
                    draft.amount,
                    &draft.category,
                    draft.counterparty.name(),
                    draft.date,
                    &draft.note,
                    &draft.media_url,
                    draft.owner_id.as_i64(),
                    time::OffsetDateTime::now_utc(),
                ),
                Self::map_row,
            )?;

            imported_transactions.push(transaction);
        }

        drop(stmt);

        tx.commit()?;
        Ok(imported_transactions)
    }

    /// Retrieve a transaction in the database by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid transaction,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get(&self, id: DatabaseID) -> Result<Transaction, Error> {
        let transaction = self
            .connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT {COLUMNS} FROM \"transaction\" WHERE id = :id"
            ))?
            .query_row(&[(":id", &id)], Self::map_row)?;

        Ok(transaction)
    }

    /// Query for transactions in the database, most recent date first.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] if there is a SQL error.
    fn get_query(&self, filter: &TransactionQuery) -> Result<Vec<Transaction>, Error> {
        let mut where_clause_parts = vec![];
        let mut query_parameters: Vec<Value> = vec![];

        if let Some(owner) = filter.owner {
            where_clause_parts.push(format!("owner_id = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Integer(owner.as_i64()));
        }

        if let Some(kind) = filter.kind {
            where_clause_parts.push(format!("kind = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(kind.as_str().to_owned()));
        }

        if let Some(ref category) = filter.category {
            where_clause_parts.push(format!("category = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(category.clone()));
        }

        Self::push_date_range(&filter.date_range, &mut where_clause_parts, &mut query_parameters);

        if let Some(ref search) = filter.search {
            let pattern = format!("%{search}%");
            where_clause_parts.push(format!(
                "(category LIKE ?{0} OR counterparty LIKE ?{1} OR note LIKE ?{2})",
                query_parameters.len() + 1,
                query_parameters.len() + 2,
                query_parameters.len() + 3,
            ));
            query_parameters.push(Value::Text(pattern.clone()));
            query_parameters.push(Value::Text(pattern.clone()));
            query_parameters.push(Value::Text(pattern));
        }

        let mut query_string = format!("SELECT {COLUMNS} FROM \"transaction\"");

        if !where_clause_parts.is_empty() {
            query_string.push_str(" WHERE ");
            query_string.push_str(&where_clause_parts.join(" AND "));
        }

        query_string.push_str(" ORDER BY date DESC, id DESC");

        let params = params_from_iter(query_parameters.iter());

        self.connection
            .lock()
            .unwrap()
            .prepare(&query_string)?
            .query_map(params, Self::map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
            .collect()
    }

    /// Overwrite the stored row that has the same ID as `transaction`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::UpdateMissingTransaction] if the transaction is not in the database,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn replace(&mut self, transaction: &Transaction) -> Result<(), Error> {
        let rows_affected = self.connection.lock().unwrap().execute(
            "UPDATE \"transaction\"
             SET kind = ?1, amount = ?2, category = ?3, counterparty = ?4, date = ?5, note = ?6, media_url = ?7
             WHERE id = ?8",
            (
                transaction.kind().as_str(),
                transaction.amount(),
                transaction.category(),
                transaction.counterparty().name(),
                transaction.date(),
                transaction.note(),
                transaction.media_url(),
                transaction.id(),
            ),
        )?;

        if rows_affected == 0 {
            Err(Error::UpdateMissingTransaction)
        } else {
            Ok(())
        }
    }

    /// Remove a transaction from the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DeleteMissingTransaction] if the transaction is not in the database,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn delete(&mut self, id: DatabaseID) -> Result<(), Error> {
        let rows_affected = self
            .connection
            .lock()
            .unwrap()
            .execute("DELETE FROM \"transaction\" WHERE id = ?1", (id,))?;

        if rows_affected == 0 {
            Err(Error::DeleteMissingTransaction)
        } else {
            Ok(())
        }
    }

    /// Sum the amounts of matching transactions, split by kind.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] if there is a SQL error.
    fn kind_totals(&self, query: &SummaryQuery) -> Result<KindTotals, Error> {
        let (where_clause, query_parameters) = Self::summary_where_clause(query);
        let query_string = format!(
            "SELECT kind, SUM(amount) FROM \"transaction\" WHERE {where_clause} GROUP BY kind"
        );
        let params = params_from_iter(query_parameters.iter());

        let connection = self.connection.lock().unwrap();
        let mut stmt = connection.prepare(&query_string)?;
        let rows = stmt.query_map(params, |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;

        let mut totals = KindTotals::default();

        for row in rows {
            let (kind, total) = row?;

            match TransactionKind::from_str(&kind) {
                Some(TransactionKind::Income) => totals.income = total,
                Some(TransactionKind::Expense) => totals.expenses = total,
                None => {}
            }
        }

        Ok(totals)
    }

    /// Sum the amounts of matching transactions per kind and category.
    ///
    /// Income categories come before expense categories, and within each kind
    /// the largest totals come first.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] if there is a SQL error.
    fn category_totals(&self, query: &SummaryQuery) -> Result<Vec<CategoryTotal>, Error> {
        let (where_clause, query_parameters) = Self::summary_where_clause(query);
        let query_string = format!(
            "SELECT kind, category, SUM(amount) AS total FROM \"transaction\"
             WHERE {where_clause}
             GROUP BY kind, category
             ORDER BY kind DESC, total DESC"
        );
        let params = params_from_iter(query_parameters.iter());

        self.connection
            .lock()
            .unwrap()
            .prepare(&query_string)?
            .query_map(params, |row| {
                let kind: String = row.get(0)?;
                let kind = TransactionKind::from_str(&kind).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        format!("unknown transaction kind {kind}").into(),
                    )
                })?;

                Ok(CategoryTotal {
                    kind,
                    category: row.get(1)?,
                    total: row.get(2)?,
                })
            })?
            .map(|maybe_total| maybe_total.map_err(Error::SqlError))
            .collect()
    }

    /// Sum the amounts of matching transactions per kind and calendar month.
    ///
    /// The date column holds ISO dates, so the first seven characters are the
    /// `YYYY-MM` month key.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] if there is a SQL error.
    fn monthly_totals(&self, query: &SummaryQuery) -> Result<Vec<MonthlyTotal>, Error> {
        let (where_clause, query_parameters) = Self::summary_where_clause(query);
        let query_string = format!(
            "SELECT substr(date, 1, 7) AS month, kind, SUM(amount) FROM \"transaction\"
             WHERE {where_clause}
             GROUP BY month, kind
             ORDER BY month ASC"
        );
        let params = params_from_iter(query_parameters.iter());

        self.connection
            .lock()
            .unwrap()
            .prepare(&query_string)?
            .query_map(params, |row| {
                let kind: String = row.get(1)?;
                let kind = TransactionKind::from_str(&kind).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        format!("unknown transaction kind {kind}").into(),
                    )
                })?;

                Ok(MonthlyTotal {
                    month: row.get(0)?,
                    kind,
                    total: row.get(2)?,
                })
            })?
            .map(|maybe_total| maybe_total.map_err(Error::SqlError))
            .collect()
    }
}

impl CreateTable for SQLiteTransactionStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS \"transaction\" (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    kind TEXT NOT NULL,
                    amount REAL NOT NULL,
                    category TEXT NOT NULL,
                    counterparty TEXT NOT NULL,
                    date TEXT NOT NULL,
                    note TEXT NOT NULL,
                    media_url TEXT NOT NULL,
                    owner_id INTEGER NOT NULL,
                    created_at TEXT NOT NULL,
                    FOREIGN KEY(owner_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                    )",
            (),
        )?;

        // Ensure the sequence starts at 1
        connection.execute(
            "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteTransactionStore {
    type ReturnType = Transaction;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id = row.get(offset)?;
        let kind: String = row.get(offset + 1)?;
        let amount = row.get(offset + 2)?;
        let category = row.get(offset + 3)?;
        let counterparty_name: String = row.get(offset + 4)?;
        let date = row.get(offset + 5)?;
        let note = row.get(offset + 6)?;
        let media_url = row.get(offset + 7)?;
        let owner_id: i64 = row.get(offset + 8)?;
        let created_at = row.get(offset + 9)?;

        let kind = TransactionKind::from_str(&kind).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                offset + 1,
                rusqlite::types::Type::Text,
                format!("unknown transaction kind {kind}").into(),
            )
        })?;
        let counterparty = Counterparty::new(kind, counterparty_name);

        Ok(Transaction::new(
            id,
            amount,
            category,
            counterparty,
            date,
            note,
            media_url,
            UserID::new(owner_id),
            created_at,
        ))
    }
}
