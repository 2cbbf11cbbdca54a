//! Application router configuration.

use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    AppState,
    auth::sign_in,
    endpoints,
    import::import_transactions,
    register::register_user,
    stores::{TransactionStore, UserStore},
    summary::get_summary,
    transactions::{
        create_transaction, delete_transaction, get_transaction, list_transactions,
        update_transaction,
    },
};

/// Return a router with all the app's routes.
///
/// Registration and sign-in are open, every other route requires a bearer
/// token issued by the sign-in endpoint.
pub fn build_router<T, U>(state: AppState<T, U>) -> Router
where
    T: TransactionStore + Clone + Send + Sync + 'static,
    U: UserStore + Clone + Send + Sync + 'static,
{
    Router::new()
        .route(endpoints::USERS, post(register_user::<U>))
        .route(endpoints::LOG_IN, post(sign_in::<U>))
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions::<T>).post(create_transaction::<T>),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction::<T>)
                .put(update_transaction::<T>)
                .delete(delete_transaction::<T>),
        )
        .route(endpoints::SUMMARY, get(get_summary::<T>))
        .route(endpoints::IMPORT, post(import_transactions::<T>))
        .with_state(state)
}
