//! A single decision point for what each role may do with a transaction.
//!
//! Every route handler that touches a transaction calls [authorize] instead of
//! branching on roles inline, so the access rules live in one place.

use crate::{Error, models::Role};

/// The kind of access a handler wants to perform on a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Viewing a transaction or an aggregate derived from transactions.
    Read,
    /// Creating, updating, deleting or importing transactions.
    Write,
}

/// Decide whether a user with `role` may perform `action` on a transaction,
/// given whether they own it.
///
/// Admins may act on any transaction. Editors may act on their own. Viewers
/// may only read.
///
/// # Errors
///
/// Returns [Error::Forbidden] when the role itself rules the action out, and
/// [Error::NotFound] when the action is allowed for the role but the
/// transaction belongs to someone else. Reporting not-found rather than
/// forbidden avoids confirming that the transaction exists.
pub fn authorize(role: Role, action: Action, is_owner: bool) -> Result<(), Error> {
    if action == Action::Write && role == Role::Viewer {
        return Err(Error::Forbidden(
            "Not authorized to modify transactions".to_owned(),
        ));
    }

    if role == Role::Admin || is_owner {
        return Ok(());
    }

    Err(Error::NotFound)
}
