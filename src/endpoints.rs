//! The API endpoint URIs.

/// The route for registering a new user.
pub const USERS: &str = "/api/users";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/log_in";
/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to get, update or delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route for the financial summary.
pub const SUMMARY: &str = "/api/summary";
/// The route for importing transactions from a CSV file.
pub const IMPORT: &str = "/api/import";
