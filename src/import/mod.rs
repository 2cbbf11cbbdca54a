//! Bulk import of transactions from an uploaded CSV file.
//!
//! Rows are validated one by one: good rows become transactions, bad rows are
//! reported back with their row number and reason. Persistence is
//! all-or-nothing across the accepted rows, so a database failure never leaves
//! a partial import behind.

mod validate;

pub use validate::{RawRow, validate_row};

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use csv::Trim;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::Claims,
    models::{Transaction, TransactionDraft, UserID},
    policy::{Action, authorize},
    state::TransactionState,
    stores::TransactionStore,
};

/// A rejected CSV row: its position in the file and why it was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    /// The 1-based data row number, not counting the header row.
    pub row: usize,
    /// The reason the row was rejected.
    pub error: String,
}

/// The response body for a successful import.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    /// A human readable summary of the import.
    pub message: String,
    /// How many rows were persisted.
    pub imported_count: usize,
    /// The persisted transactions, with their assigned IDs.
    pub imported_records: Vec<Transaction>,
    /// The rejected rows, omitted when every row was accepted.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected_rows: Vec<RowError>,
}

/// Split the rows of `csv_text` into validated drafts owned by `owner` and
/// rejected rows.
///
/// Rows that fail CSV parsing (for example a wrong column count) are rejected
/// with a processing error rather than aborting the whole file.
pub fn collect_rows(csv_text: &str, owner: UserID) -> (Vec<TransactionDraft>, Vec<RowError>) {
    let mut reader = csv::ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(csv_text.as_bytes());

    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for result in reader.deserialize::<RawRow>() {
        let row = accepted.len() + rejected.len() + 1;

        let raw_row = match result {
            Ok(raw_row) => raw_row,
            Err(error) => {
                rejected.push(RowError {
                    row,
                    error: format!("Processing error: {error}"),
                });
                continue;
            }
        };

        match validate_row(&raw_row).map(|data| TransactionDraft::new(data, owner)) {
            Ok(Ok(draft)) => accepted.push(draft),
            Ok(Err(error)) => rejected.push(RowError {
                row,
                error: error.to_string(),
            }),
            Err(error) => rejected.push(RowError { row, error }),
        }
    }

    (accepted, rejected)
}

/// Route handler for importing transactions from an uploaded CSV file.
///
/// Responds with the persisted transactions, the import count and any
/// rejected rows. When no row passes validation nothing is persisted and the
/// rejected rows are returned with an error.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The caller's role does not permit creating transactions.
/// - The request does not contain a file upload.
/// - The uploaded file is not a CSV file.
/// - Every row of the file was rejected.
/// - There was an unexpected database error.
pub async fn import_transactions<T>(
    claims: Claims,
    State(state): State<TransactionState<T>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImportOutcome>), Error>
where
    T: TransactionStore + Send + Sync,
{
    authorize(claims.role, Action::Write, true)?;

    let field = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))?
        .ok_or(Error::MissingUpload)?;

    let is_csv = field
        .file_name()
        .map(|file_name| file_name.to_lowercase().ends_with(".csv"))
        .unwrap_or(false)
        || field.content_type() == Some("text/csv");

    if !is_csv {
        return Err(Error::NotCSV);
    }

    let csv_text = field
        .text()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))?;

    let (accepted, rejected) = collect_rows(&csv_text, claims.user_id());

    if accepted.is_empty() {
        return Err(Error::NoValidRows(rejected));
    }

    let mut store = state.transaction_store;
    let imported_records = store.import(accepted)?;

    let outcome = ImportOutcome {
        message: format!(
            "Successfully imported {} transactions",
            imported_records.len()
        ),
        imported_count: imported_records.len(),
        imported_records,
        rejected_rows: rejected,
    };

    Ok((StatusCode::CREATED, Json(outcome)))
}


#[cfg(test)]
mod import_endpoint_tests {
    use std::str::FromStr;

    use axum_test::{
        TestServer,
        multipart::{MultipartForm, Part},
    };
    use email_address::EmailAddress;
    use rusqlite::Connection;
    use serde_json::Value;

    use crate::{
        auth::encode_jwt,
        build_router, endpoints,
        models::{PasswordHash, Role, ValidatedPassword},
        stores::{UserStore, sqlite::create_app_state},
    };

    fn get_test_server_and_token(role: Role) -> (TestServer, String) {
        let connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        let mut state = create_app_state(connection, "foobar").expect("Could not create app state.");

        let password = ValidatedPassword::new_unchecked("averysafeandsecurepassword");
        let password_hash = PasswordHash::new(password, 4).expect("Could not hash password");
        let user = state
            .user_store
            .create(
                EmailAddress::from_str("foo@bar.baz").unwrap(),
                password_hash,
                role,
            )
            .expect("Could not create user");

        let token = encode_jwt(user.id(), user.role(), &state.jwt_keys.encoding)
            .expect("Could not encode JWT");

        let server = TestServer::try_new(build_router(state)).expect("Could not create test server.");

        (server, token)
    }

    fn csv_form(csv_text: &'static str) -> MultipartForm {
        MultipartForm::new().add_part(
            "file",
            Part::bytes(csv_text.as_bytes())
                .file_name("transactions.csv")
                .mime_type("text/csv"),
        )
    }

    #[tokio::test]
    async fn import_reports_accepted_and_rejected_rows() {
        let (server, token) = get_test_server_and_token(Role::Editor);
        let csv_text = "type,amount,category,from,to,date\n\
            income,5000,Salary,Acme Corp,,2025-04-01\n\
            expense,150,Groceries,,Countdown,2025-04-05\n\
            expense,abc,Groceries,,Countdown,2025-04-06\n\
            income,200,Refund,,,2025-04-07\n\
            expense,25,Transport,,Metro,2025-04-08\n\
            expense,60,Dining,,Cafe Moka,2025-04-09\n\
            income,80,Interest,Bank,,2025-04-10\n";

        let response = server
            .post(endpoints::IMPORT)
            .authorization_bearer(token)
            .multipart(csv_form(csv_text))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);

        let body = response.json::<Value>();
        assert_eq!(body["message"], "Successfully imported 5 transactions");
        assert_eq!(body["importedCount"], 5);
        assert_eq!(body["importedRecords"].as_array().unwrap().len(), 5);

        let rejected = body["rejectedRows"].as_array().unwrap();
        assert_eq!(rejected.len(), 2);
        assert_eq!(rejected[0]["row"], 3);
        assert_eq!(
            rejected[0]["error"],
            "Invalid amount. Must be a positive number"
        );
        assert_eq!(rejected[1]["row"], 4);
        assert_eq!(
            rejected[1]["error"],
            "From field is required for income transactions"
        );
    }

    #[tokio::test]
    async fn import_omits_rejected_rows_when_all_rows_pass() {
        let (server, token) = get_test_server_and_token(Role::Editor);
        let csv_text = "type,amount,category,from,to,date\n\
            expense,25,Transport,,Metro,2025-04-08\n";

        let response = server
            .post(endpoints::IMPORT)
            .authorization_bearer(token)
            .multipart(csv_form(csv_text))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);

        let body = response.json::<Value>();
        assert_eq!(body["importedCount"], 1);
        assert!(body.get("rejectedRows").is_none());
    }

    #[tokio::test]
    async fn import_with_no_valid_rows_persists_nothing() {
        let (server, token) = get_test_server_and_token(Role::Editor);
        let csv_text = "type,amount,category,from,to,date\n\
            bogus,1,A,,X,2025-01-01\n\
            expense,-1,A,,X,2025-01-02\n";

        let response = server
            .post(endpoints::IMPORT)
            .authorization_bearer(token.clone())
            .multipart(csv_form(csv_text))
            .await;

        response.assert_status(axum::http::StatusCode::BAD_REQUEST);

        let body = response.json::<Value>();
        assert_eq!(body["error"], "No valid transactions found in the CSV file");
        assert_eq!(body["rejectedRows"].as_array().unwrap().len(), 2);

        // Nothing should have been stored.
        let transactions = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(token)
            .await
            .json::<Vec<Value>>();

        assert!(transactions.is_empty());
    }

    #[tokio::test]
    async fn imported_records_match_manually_created_ones() {
        let (server, token) = get_test_server_and_token(Role::Editor);

        let created = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(token.clone())
            .json(&serde_json::json!({
                "type": "expense",
                "amount": 25.0,
                "category": "Transport",
                "to": "Metro",
                "date": "2025-04-08",
                "note": "bus fare",
            }))
            .await
            .json::<Value>();

        let csv_text = "type,amount,category,from,to,date,note\n\
            expense,25,Transport,,Metro,2025-04-08,bus fare\n";

        let response = server
            .post(endpoints::IMPORT)
            .authorization_bearer(token)
            .multipart(csv_form(csv_text))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);

        let imported = &response.json::<Value>()["importedRecords"][0];

        // Identical input data gives identical records, apart from the
        // store-assigned fields.
        for field in ["type", "amount", "category", "to", "date", "note"] {
            assert_eq!(imported[field], created[field], "field {field} differs");
        }
        assert_ne!(imported["id"], created["id"]);
    }

    #[tokio::test]
    async fn import_rejects_non_csv_file() {
        let (server, token) = get_test_server_and_token(Role::Editor);

        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes("not a csv".as_bytes())
                .file_name("notes.txt")
                .mime_type("text/plain"),
        );

        let response = server
            .post(endpoints::IMPORT)
            .authorization_bearer(token)
            .multipart(form)
            .await;

        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "File is not a CSV");
    }

    #[tokio::test]
    async fn import_is_forbidden_for_viewers() {
        let (server, token) = get_test_server_and_token(Role::Viewer);
        let csv_text = "type,amount,category,from,to,date\n\
            expense,25,Transport,,Metro,2025-04-08\n";

        let response = server
            .post(endpoints::IMPORT)
            .authorization_bearer(token)
            .multipart(csv_form(csv_text))
            .await;

        response.assert_status(axum::http::StatusCode::FORBIDDEN);
    }
}
