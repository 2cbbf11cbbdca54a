//! Defines the transaction store trait and the query types it accepts.

use time::{Date, Month};

use crate::{
    Error,
    models::{DatabaseID, Transaction, TransactionDraft, TransactionKind, UserID},
};

/// An inclusive date window used to filter transactions.
///
/// Either bound may be open. The default range matches every date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateRange {
    /// The earliest date to include, or no lower bound.
    pub start: Option<Date>,
    /// The latest date to include, or no upper bound.
    pub end: Option<Date>,
}

impl DateRange {
    /// Build a date range from the filter parameters a client may send.
    ///
    /// Explicit `date_from`/`date_to` bounds win over `month` and `year`.
    /// A `month` on its own is combined with `year`, defaulting to the year of
    /// `today`. A `year` on its own selects the whole calendar year.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidFilter] when `month` is outside 1-12 or the
    /// combination does not form valid dates.
    pub fn resolve(
        date_from: Option<Date>,
        date_to: Option<Date>,
        month: Option<u8>,
        year: Option<i32>,
        today: Date,
    ) -> Result<Self, Error> {
        if date_from.is_some() || date_to.is_some() {
            return Ok(Self {
                start: date_from,
                end: date_to,
            });
        }

        if let Some(month_number) = month {
            let year = year.unwrap_or_else(|| today.year());
            let month = Month::try_from(month_number)
                .map_err(|_| Error::InvalidFilter(format!("invalid month {month_number}")))?;

            let start = Date::from_calendar_date(year, month, 1)
                .map_err(|error| Error::InvalidFilter(error.to_string()))?;
            let end = Date::from_calendar_date(year, month, month.length(year))
                .map_err(|error| Error::InvalidFilter(error.to_string()))?;

            return Ok(Self {
                start: Some(start),
                end: Some(end),
            });
        }

        if let Some(year) = year {
            let start = Date::from_calendar_date(year, Month::January, 1)
                .map_err(|error| Error::InvalidFilter(error.to_string()))?;
            let end = Date::from_calendar_date(year, Month::December, 31)
                .map_err(|error| Error::InvalidFilter(error.to_string()))?;

            return Ok(Self {
                start: Some(start),
                end: Some(end),
            });
        }

        Ok(Self::default())
    }

    /// Whether the range places no restriction on dates.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Defines how transactions should be fetched from [TransactionStore::get_query].
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    /// Restrict transactions to those created by this user. None returns
    /// transactions for all users.
    pub owner: Option<UserID>,
    /// Restrict transactions to income or expenses.
    pub kind: Option<TransactionKind>,
    /// Restrict transactions to an exact category.
    pub category: Option<String>,
    /// Include transactions whose date falls inside this range (inclusive).
    pub date_range: DateRange,
    /// Include transactions whose category, counterparty or note contains
    /// this text (case-insensitive).
    pub search: Option<String>,
}

/// Defines which transactions contribute to a summary.
#[derive(Debug, Clone)]
pub struct SummaryQuery {
    /// The user whose transactions are summarized.
    pub owner: UserID,
    /// Restrict the summary to an exact category.
    pub category: Option<String>,
    /// Include transactions whose date falls inside this range (inclusive).
    pub date_range: DateRange,
}

/// The sum of amounts for each transaction kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KindTotals {
    /// The sum of all income amounts.
    pub income: f64,
    /// The sum of all expense amounts.
    pub expenses: f64,
}

/// The sum of amounts for one category of one transaction kind.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    /// Whether the total is for income or expenses.
    pub kind: TransactionKind,
    /// The category the amounts were summed over.
    pub category: String,
    /// The sum of the amounts.
    pub total: f64,
}

/// The sum of amounts for one transaction kind within one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTotal {
    /// The month in `YYYY-MM` form.
    pub month: String,
    /// Whether the total is for income or expenses.
    pub kind: TransactionKind,
    /// The sum of the amounts.
    pub total: f64,
}

/// Handles the creation and retrieval of transactions.
pub trait TransactionStore {
    /// Create a new transaction in the store.
    fn create(&mut self, draft: TransactionDraft) -> Result<Transaction, Error>;

    /// Create many transactions in a single database transaction.
    ///
    /// Either every draft is persisted or none are.
    fn import(&mut self, drafts: Vec<TransactionDraft>) -> Result<Vec<Transaction>, Error>;

    /// Retrieve a transaction from the store.
    fn get(&self, id: DatabaseID) -> Result<Transaction, Error>;

    /// Retrieve transactions matching `query`, most recent date first.
    fn get_query(&self, query: &TransactionQuery) -> Result<Vec<Transaction>, Error>;

    /// Overwrite the stored transaction that has the same ID as `transaction`.
    fn replace(&mut self, transaction: &Transaction) -> Result<(), Error>;

    /// Remove a transaction from the store.
    fn delete(&mut self, id: DatabaseID) -> Result<(), Error>;

    /// Sum the amounts of matching transactions, split by kind.
    fn kind_totals(&self, query: &SummaryQuery) -> Result<KindTotals, Error>;

    /// Sum the amounts of matching transactions per kind and category,
    /// largest totals first within each kind.
    fn category_totals(&self, query: &SummaryQuery) -> Result<Vec<CategoryTotal>, Error>;

    /// Sum the amounts of matching transactions per kind and calendar month,
    /// in chronological order.
    fn monthly_totals(&self, query: &SummaryQuery) -> Result<Vec<MonthlyTotal>, Error>;
}
