//! Route handlers for creating, listing, updating and deleting transactions.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    auth::Claims,
    models::{DatabaseID, NewTransaction, Transaction, TransactionDraft, TransactionKind, TransactionPatch},
    policy::{Action, authorize},
    state::TransactionState,
    stores::{
        TransactionStore,
        transaction::{DateRange, TransactionQuery},
    },
};

/// The query parameters accepted by the transaction list endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Restrict the list to income or expenses.
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    /// Restrict the list to an exact category.
    pub category: Option<String>,
    /// The start of an explicit date window (inclusive).
    pub date_from: Option<Date>,
    /// The end of an explicit date window (inclusive).
    pub date_to: Option<Date>,
    /// A calendar month, 1-12. Combined with `year`, defaulting to the
    /// current year.
    pub month: Option<u8>,
    /// A calendar year.
    pub year: Option<i32>,
    /// Match transactions whose category, counterparty or note contains this
    /// text.
    pub search: Option<String>,
}

/// Route handler for listing the caller's transactions, most recent first.
///
/// # Errors
///
/// This function will return an error when the filter parameters are invalid
/// or there is an unexpected database error.
pub async fn list_transactions<T>(
    claims: Claims,
    State(state): State<TransactionState<T>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Transaction>>, Error>
where
    T: TransactionStore + Send + Sync,
{
    authorize(claims.role, Action::Read, true)?;

    let today = OffsetDateTime::now_utc().date();
    let date_range = DateRange::resolve(
        params.date_from,
        params.date_to,
        params.month,
        params.year,
        today,
    )?;

    let query = TransactionQuery {
        owner: Some(claims.user_id()),
        kind: params.kind,
        category: params.category,
        date_range,
        search: params.search,
    };

    let transactions = state.transaction_store.get_query(&query)?;

    Ok(Json(transactions))
}

/// Route handler for fetching a single transaction by its ID.
///
/// # Errors
///
/// This function will return a [Error::NotFound] if the transaction does not
/// exist or belongs to another user and the caller is not an admin.
pub async fn get_transaction<T>(
    claims: Claims,
    State(state): State<TransactionState<T>>,
    Path(transaction_id): Path<DatabaseID>,
) -> Result<Json<Transaction>, Error>
where
    T: TransactionStore + Send + Sync,
{
    let transaction = state.transaction_store.get(transaction_id)?;

    let is_owner = transaction.owner_id() == claims.user_id();
    authorize(claims.role, Action::Read, is_owner)?;

    Ok(Json(transaction))
}

/// Route handler for creating a transaction owned by the caller.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The caller's role does not permit creating transactions.
/// - The amount is not a positive number or the category is empty.
/// - There was an unexpected database error.
pub async fn create_transaction<T>(
    claims: Claims,
    State(state): State<TransactionState<T>>,
    Json(data): Json<NewTransaction>,
) -> Result<(StatusCode, Json<Transaction>), Error>
where
    T: TransactionStore + Send + Sync,
{
    authorize(claims.role, Action::Write, true)?;

    let draft = TransactionDraft::new(data, claims.user_id())?;

    let mut store = state.transaction_store;
    let transaction = store.create(draft)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Route handler for partially updating a transaction.
///
/// Only the fields present in the request body are changed. Changing the
/// transaction type requires the counterparty field of the new type.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The caller's role does not permit updating transactions.
/// - The transaction does not exist or belongs to another user and the caller
///   is not an admin.
/// - A patched field fails validation.
/// - There was an unexpected database error.
pub async fn update_transaction<T>(
    claims: Claims,
    State(state): State<TransactionState<T>>,
    Path(transaction_id): Path<DatabaseID>,
    Json(patch): Json<TransactionPatch>,
) -> Result<Json<Transaction>, Error>
where
    T: TransactionStore + Send + Sync,
{
    // Check the role before looking anything up, so viewers get a forbidden
    // error even for transactions that do not exist.
    authorize(claims.role, Action::Write, true)?;

    let transaction = state.transaction_store.get(transaction_id)?;

    let is_owner = transaction.owner_id() == claims.user_id();
    authorize(claims.role, Action::Write, is_owner)?;

    let updated = transaction.apply(patch)?;

    let mut store = state.transaction_store;
    store.replace(&updated)?;

    Ok(Json(updated))
}

/// Route handler for deleting a transaction.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The caller's role does not permit deleting transactions.
/// - The transaction does not exist or belongs to another user and the caller
///   is not an admin.
/// - There was an unexpected database error.
pub async fn delete_transaction<T>(
    claims: Claims,
    State(state): State<TransactionState<T>>,
    Path(transaction_id): Path<DatabaseID>,
) -> Result<Json<Value>, Error>
where
    T: TransactionStore + Send + Sync,
{
    authorize(claims.role, Action::Write, true)?;

    let transaction = state.transaction_store.get(transaction_id)?;

    let is_owner = transaction.owner_id() == claims.user_id();
    authorize(claims.role, Action::Write, is_owner)?;

    let mut store = state.transaction_store;
    store.delete(transaction_id)?;

    Ok(Json(json!({"message": "Transaction deleted"})))
}
