//! Contains convenience type alias and function for [AppState] that uses
//! the SQLite backend.

pub mod transaction;
pub mod user;

pub use transaction::SQLiteTransactionStore;
pub use user::SQLiteUserStore;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{AppState, Error, db::CreateTable, state::JwtKeys};

/// An alias for an [AppState] that uses SQLite for the backend.
pub type SqlAppState = AppState<SQLiteTransactionStore, SQLiteUserStore>;

/// Create the tables for the domain models in the database.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    SQLiteUserStore::create_table(connection)?;
    SQLiteTransactionStore::create_table(connection)?;

    Ok(())
}

/// Creates an [AppState] instance that uses SQLite for the backend.
///
/// This function will modify the database by adding the tables for the domain
/// models to the database.
pub fn create_app_state(db_connection: Connection, jwt_secret: &str) -> Result<SqlAppState, Error> {
    initialize(&db_connection)?;

    let connection = Arc::new(Mutex::new(db_connection));
    let transaction_store = SQLiteTransactionStore::new(connection.clone());
    let user_store = SQLiteUserStore::new(connection);

    Ok(AppState {
        jwt_keys: JwtKeys::new(jwt_secret),
        transaction_store,
        user_store,
    })
}
