//! This file defines the type `Transaction`, the core domain type of the
//! application, along with the payload types used to create and update one.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    models::{DatabaseID, UserID},
};

/// Whether a transaction brings money in or sends money out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money received from a counterparty.
    Income,
    /// Money paid to a counterparty.
    Expense,
}

impl TransactionKind {
    /// The kind as stored in the database and used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// Parse a kind from its database representation.
    ///
    /// Returns `None` for unrecognised values.
    pub fn from_str(kind: &str) -> Option<Self> {
        match kind {
            "income" => Some(TransactionKind::Income),
            "expense" => Some(TransactionKind::Expense),
            _ => None,
        }
    }
}

/// The other party of a transaction, selected by the transaction type.
///
/// An income transaction records who the money came *from*, an expense records
/// who it went *to*. Encoding this as a tagged union makes it impossible to
/// store a transaction with the wrong counterparty field populated.
///
/// On the wire this flattens into the owning transaction as
/// `{"type": "income", "from": "..."}` or `{"type": "expense", "to": "..."}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Counterparty {
    /// The source of an income transaction.
    Income {
        /// Who the money came from.
        from: String,
    },
    /// The recipient of an expense transaction.
    Expense {
        /// Who the money went to.
        to: String,
    },
}

impl Counterparty {
    /// Build a counterparty for `kind` with the given `name`.
    pub fn new(kind: TransactionKind, name: String) -> Self {
        match kind {
            TransactionKind::Income => Counterparty::Income { from: name },
            TransactionKind::Expense => Counterparty::Expense { to: name },
        }
    }

    /// The transaction kind this counterparty belongs to.
    pub fn kind(&self) -> TransactionKind {
        match self {
            Counterparty::Income { .. } => TransactionKind::Income,
            Counterparty::Expense { .. } => TransactionKind::Expense,
        }
    }

    /// The name of the counterparty, whichever side it is on.
    pub fn name(&self) -> &str {
        match self {
            Counterparty::Income { from } => from,
            Counterparty::Expense { to } => to,
        }
    }
}

/// An income or expense record owned by a user.
///
/// To create a new `Transaction`, build a [TransactionDraft] and pass it to
/// [TransactionStore::create](crate::stores::TransactionStore::create).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    id: DatabaseID,
    amount: f64,
    category: String,
    #[serde(flatten)]
    counterparty: Counterparty,
    date: Date,
    note: String,
    media_url: String,
    owner_id: UserID,
    created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a transaction object from its parts.
    ///
    /// This is intended for stores mapping database rows back into the domain
    /// type. It performs no validation, the store is trusted to only hold rows
    /// that were validated on the way in.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: DatabaseID,
        amount: f64,
        category: String,
        counterparty: Counterparty,
        date: Date,
        note: String,
        media_url: String,
        owner_id: UserID,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            amount,
            category,
            counterparty,
            date,
            note,
            media_url,
            owner_id,
            created_at,
        }
    }

    /// The ID of the transaction, assigned by the store on creation.
    pub fn id(&self) -> DatabaseID {
        self.id
    }

    /// The amount of money received or spent. Always positive, the direction
    /// is captured by [Transaction::kind].
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// A free-form category describing the type of the transaction.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Whether this transaction is an income or an expense.
    pub fn kind(&self) -> TransactionKind {
        self.counterparty.kind()
    }

    /// The other party of the transaction.
    pub fn counterparty(&self) -> &Counterparty {
        &self.counterparty
    }

    /// When the transaction happened.
    pub fn date(&self) -> Date {
        self.date
    }

    /// A free-form note attached to the transaction, may be empty.
    pub fn note(&self) -> &str {
        &self.note
    }

    /// An opaque reference to an attached receipt or document, may be empty.
    pub fn media_url(&self) -> &str {
        &self.media_url
    }

    /// The ID of the user that owns this transaction.
    pub fn owner_id(&self) -> UserID {
        self.owner_id
    }

    /// When the transaction record was created. Set once, never mutated.
    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// Apply a partial update, overwriting only the fields present in `patch`.
    ///
    /// Changing the transaction type requires the counterparty field of the
    /// new type to be present in the same patch, since the old counterparty
    /// belongs to the other side of the ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the patched amount is not positive, the patched
    /// category is empty, or the type changes without its counterparty field.
    pub fn apply(self, patch: TransactionPatch) -> Result<Self, Error> {
        let amount = match patch.amount {
            Some(amount) if amount <= 0.0 || !amount.is_finite() => {
                return Err(Error::NonPositiveAmount);
            }
            Some(amount) => amount,
            None => self.amount,
        };

        let category = match patch.category {
            Some(category) if category.is_empty() => return Err(Error::EmptyCategory),
            Some(category) => category,
            None => self.category,
        };

        let kind = patch.kind.unwrap_or_else(|| self.counterparty.kind());
        let counterparty = match (kind, self.counterparty, patch.from, patch.to) {
            (TransactionKind::Income, Counterparty::Income { from }, patched_from, _) => {
                Counterparty::Income {
                    from: patched_from.unwrap_or(from),
                }
            }
            (TransactionKind::Expense, Counterparty::Expense { to }, _, patched_to) => {
                Counterparty::Expense {
                    to: patched_to.unwrap_or(to),
                }
            }
            // The type flipped, so the old counterparty cannot carry over.
            (TransactionKind::Income, _, Some(from), _) => Counterparty::Income { from },
            (TransactionKind::Expense, _, _, Some(to)) => Counterparty::Expense { to },
            (TransactionKind::Income, _, None, _) => return Err(Error::MissingFrom),
            (TransactionKind::Expense, _, _, None) => return Err(Error::MissingTo),
        };

        Ok(Self {
            id: self.id,
            amount,
            category,
            counterparty,
            date: patch.date.unwrap_or(self.date),
            note: patch.note.unwrap_or(self.note),
            media_url: patch.media_url.unwrap_or(self.media_url),
            owner_id: self.owner_id,
            created_at: self.created_at,
        })
    }
}

/// The client-supplied fields for creating a transaction.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    /// The amount of money received or spent.
    pub amount: f64,
    /// A free-form category describing the type of the transaction.
    pub category: String,
    /// The other party, which also carries the transaction type.
    #[serde(flatten)]
    pub counterparty: Counterparty,
    /// When the transaction happened.
    pub date: Date,
    /// A free-form note, defaults to empty.
    #[serde(default)]
    pub note: String,
    /// An opaque reference to an attached receipt, defaults to empty.
    #[serde(default)]
    pub media_url: String,
}

/// A validated transaction that has not been persisted yet.
///
/// Drafts are produced by [TransactionDraft::new] for manual entry and by the
/// CSV import pipeline for bulk entry, and consumed by
/// [TransactionStore::create](crate::stores::TransactionStore::create) and
/// [TransactionStore::import](crate::stores::TransactionStore::import).
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionDraft {
    /// The amount of money received or spent. Positive.
    pub amount: f64,
    /// A free-form category. Non-empty.
    pub category: String,
    /// The other party, which also carries the transaction type.
    pub counterparty: Counterparty,
    /// When the transaction happened.
    pub date: Date,
    /// A free-form note, may be empty.
    pub note: String,
    /// An opaque reference to an attached receipt, may be empty.
    pub media_url: String,
    /// The user the transaction belongs to.
    pub owner_id: UserID,
}

impl TransactionDraft {
    /// Validate the client-supplied `data` into a draft owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not a positive finite number or the
    /// category is empty.
    pub fn new(data: NewTransaction, owner_id: UserID) -> Result<Self, Error> {
        if data.amount <= 0.0 || !data.amount.is_finite() {
            return Err(Error::NonPositiveAmount);
        }

        if data.category.is_empty() {
            return Err(Error::EmptyCategory);
        }

        Ok(Self {
            amount: data.amount,
            category: data.category,
            counterparty: data.counterparty,
            date: data.date,
            note: data.note,
            media_url: data.media_url,
            owner_id,
        })
    }
}

/// A partial update to a transaction. Only fields that are present overwrite
/// the stored record, see [Transaction::apply].
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    /// Change the transaction type. Requires the matching counterparty field.
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    /// Change the amount.
    pub amount: Option<f64>,
    /// Change the category.
    pub category: Option<String>,
    /// Change who the money came from (income transactions).
    pub from: Option<String>,
    /// Change who the money went to (expense transactions).
    pub to: Option<String>,
    /// Change the transaction date.
    pub date: Option<Date>,
    /// Change the note.
    pub note: Option<String>,
    /// Change the receipt reference.
    pub media_url: Option<String>,
}
