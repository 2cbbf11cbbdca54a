//! Spendlog is a multi-user personal finance tracker served as a JSON REST
//! API.
//!
//! Users register with an email and password and receive a bearer token on
//! sign-in. Each user records income and expense transactions, imports them in
//! bulk from CSV files, and gets an on-demand summary of totals, category
//! breakdowns and monthly trends. What a user may do is decided by their role:
//! viewers read, editors write their own data, admins write anyone's.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

pub mod auth;
mod db;
mod endpoints;
mod error;
pub mod import;
mod logging;
pub mod models;
mod money;
pub mod policy;
mod register;
mod routing;
mod state;
pub mod stores;
pub mod summary;
mod transactions;

pub use error::Error;
pub use logging::logging_middleware;
pub use money::{Money, format_currency};
pub use routing::build_router;
pub use state::{AppState, AuthState, JwtKeys, TransactionState};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
