//! Defines the app level error type and its conversion to JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::import::RowError;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The email used to register already belongs to another user.
    #[error("the email address is already in use")]
    DuplicateEmail,

    /// A transaction was given an amount of zero or less.
    #[error("Invalid amount. Must be a positive number")]
    NonPositiveAmount,

    /// A transaction was given an empty category.
    #[error("Category must not be empty")]
    EmptyCategory,

    /// An income transaction is missing its source.
    #[error("From field is required for income transactions")]
    MissingFrom,

    /// An expense transaction is missing its recipient.
    #[error("To field is required for expense transactions")]
    MissingTo,

    /// A filter parameter could not be turned into a date range, e.g. a month
    /// outside 1-12.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// The caller's role does not permit the attempted action.
    #[error("{0}")]
    Forbidden(String),

    /// The multipart form could not be parsed as a CSV file upload.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The import request did not contain a file.
    #[error("Please upload a CSV file")]
    MissingUpload,

    /// The uploaded file is not a CSV file.
    #[error("File is not a CSV")]
    NotCSV,

    /// Every row of an imported CSV file was rejected, so nothing was
    /// persisted. Carries the per-row rejection reasons.
    #[error("No valid transactions found in the CSV file")]
    NoValidRows(Vec<RowError>),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status_code, body) = match self {
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                json!({"error": "The requested resource could not be found"}),
            ),
            Error::UpdateMissingTransaction | Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                json!({"error": "Transaction not found"}),
            ),
            Error::Forbidden(message) => (StatusCode::FORBIDDEN, json!({"error": message})),
            Error::NoValidRows(rejected_rows) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "No valid transactions found in the CSV file",
                    "rejectedRows": rejected_rows,
                }),
            ),
            error @ (Error::TooWeak(_)
            | Error::DuplicateEmail
            | Error::NonPositiveAmount
            | Error::EmptyCategory
            | Error::MissingFrom
            | Error::MissingTo
            | Error::InvalidFilter(_)
            | Error::MultipartError(_)
            | Error::MissingUpload
            | Error::NotCSV) => (StatusCode::BAD_REQUEST, json!({"error": error.to_string()})),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": "Internal server error"}),
                )
            }
        };

        (status_code, Json(body)).into_response()
    }
}
