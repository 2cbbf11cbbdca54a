//! Per-row validation for CSV imports.
//!
//! Each raw row is checked against a fixed sequence of rules and either turned
//! into a [NewTransaction] or rejected with a human readable reason. Rows are
//! independent, one bad row never affects its neighbours.

use serde::Deserialize;
use time::{Date, macros::format_description};

use crate::models::{Counterparty, NewTransaction, TransactionKind};

/// One row of an uploaded CSV file, before validation.
///
/// Every field deserializes as a string defaulting to empty, so rows with
/// missing columns still parse and fail validation with a useful message
/// instead of a deserialization error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRow {
    /// The transaction type, "income" or "expense".
    #[serde(rename = "type", default)]
    pub kind: String,
    /// The amount as written in the file.
    #[serde(default)]
    pub amount: String,
    /// The transaction category.
    #[serde(default)]
    pub category: String,
    /// Who the money came from, for income rows.
    #[serde(default)]
    pub from: String,
    /// Who the money went to, for expense rows.
    #[serde(default)]
    pub to: String,
    /// The transaction date as written in the file.
    #[serde(default)]
    pub date: String,
    /// A free-form note.
    #[serde(default)]
    pub note: String,
    /// An opaque reference to an attached receipt.
    #[serde(rename = "mediaUrl", default)]
    pub media_url: String,
}

/// Validate a raw CSV row into the payload for a new transaction.
///
/// The checks run in a fixed order and the first failure wins, so a row that
/// is broken in several ways gets one stable message.
///
/// # Errors
///
/// Returns the rejection reason for the row.
pub fn validate_row(row: &RawRow) -> Result<NewTransaction, String> {
    if row.kind.is_empty() || row.amount.is_empty() || row.category.is_empty() || row.date.is_empty()
    {
        return Err("Missing required fields".to_owned());
    }

    let Some(kind) = TransactionKind::from_str(&row.kind) else {
        return Err("Invalid transaction type. Must be 'income' or 'expense'".to_owned());
    };

    let amount = row.amount.parse::<f64>().unwrap_or(f64::NAN);
    if !amount.is_finite() || amount <= 0.0 {
        return Err("Invalid amount. Must be a positive number".to_owned());
    }

    let format = format_description!("[year]-[month]-[day]");
    let Ok(date) = Date::parse(&row.date, &format) else {
        return Err("Invalid date format. Use YYYY-MM-DD format".to_owned());
    };

    let counterparty = match kind {
        TransactionKind::Income => {
            if row.from.is_empty() {
                return Err("From field is required for income transactions".to_owned());
            }

            Counterparty::Income {
                from: row.from.clone(),
            }
        }
        TransactionKind::Expense => {
            if row.to.is_empty() {
                return Err("To field is required for expense transactions".to_owned());
            }

            Counterparty::Expense { to: row.to.clone() }
        }
    };

    Ok(NewTransaction {
        amount,
        category: row.category.clone(),
        counterparty,
        date,
        note: row.note.clone(),
        media_url: row.media_url.clone(),
    })
}
