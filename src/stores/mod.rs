//! The store traits that abstract over persistence, and their SQLite
//! implementations.

pub mod sqlite;
pub mod transaction;
pub mod user;

pub use transaction::TransactionStore;
pub use user::UserStore;
