//! Small traits shared by the SQLite store implementations.

use rusqlite::{Connection, Row};

/// A store that can initialize its table(s) in a SQLite database.
pub trait CreateTable {
    /// Create the table(s) for the store in the database.
    ///
    /// # Errors
    /// Returns an error if there is an SQL error.
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error>;
}

/// A store that can convert a SQLite row into its model type.
pub trait MapRow {
    /// The model type produced from a row.
    type ReturnType;

    /// Convert `row` into `Self::ReturnType`, reading columns starting at
    /// index zero.
    ///
    /// # Errors
    /// Returns an error if a column is missing or has an incompatible type.
    fn map_row(row: &Row) -> Result<Self::ReturnType, rusqlite::Error> {
        Self::map_row_with_offset(row, 0)
    }

    /// Convert `row` into `Self::ReturnType`, reading columns starting at
    /// `offset`. Useful when the row comes from a JOIN.
    ///
    /// # Errors
    /// Returns an error if a column is missing or has an incompatible type.
    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error>;
}
