//! The domain models of the application.

mod password;
mod transaction;
mod user;

pub use password::{PasswordHash, ValidatedPassword};
pub use transaction::{
    Counterparty, NewTransaction, Transaction, TransactionDraft, TransactionKind, TransactionPatch,
};
pub use user::{Role, User, UserID};

/// An alias for the integer type used for database row IDs.
pub type DatabaseID = i64;
