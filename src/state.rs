//! Implements a struct that holds the state of the REST server.

use std::marker::{Send, Sync};

use axum::extract::FromRef;
use jsonwebtoken::{DecodingKey, EncodingKey};

use crate::stores::{TransactionStore, UserStore};

/// The keys used for signing and verifying JSON Web Tokens.
#[derive(Clone)]
pub struct JwtKeys {
    /// The key used to sign new tokens.
    pub encoding: EncodingKey,
    /// The key used to verify incoming tokens.
    pub decoding: DecodingKey,
}

impl JwtKeys {
    /// Derive the signing and verification keys from a `secret` string.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState<T, U>
where
    T: TransactionStore + Send + Sync,
    U: UserStore + Send + Sync,
{
    /// The keys for signing and verifying auth tokens.
    pub jwt_keys: JwtKeys,
    /// The store for managing user [transactions](crate::models::Transaction).
    pub transaction_store: T,
    /// The store for managing registered [users](crate::models::User).
    pub user_store: U,
}

// this impl tells the `Claims` extractor how to access the keys from our state
impl<T, U> FromRef<AppState<T, U>> for JwtKeys
where
    T: TransactionStore + Send + Sync,
    U: UserStore + Send + Sync,
{
    fn from_ref(state: &AppState<T, U>) -> Self {
        state.jwt_keys.clone()
    }
}

/// The state needed for sign-in and registration.
#[derive(Clone)]
pub struct AuthState<U>
where
    U: UserStore + Send + Sync,
{
    /// The keys for signing and verifying auth tokens.
    pub jwt_keys: JwtKeys,
    /// The store for managing registered [users](crate::models::User).
    pub user_store: U,
}

impl<T, U> FromRef<AppState<T, U>> for AuthState<U>
where
    T: TransactionStore + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    fn from_ref(state: &AppState<T, U>) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
            user_store: state.user_store.clone(),
        }
    }
}

impl<U> FromRef<AuthState<U>> for JwtKeys
where
    U: UserStore + Send + Sync,
{
    fn from_ref(state: &AuthState<U>) -> Self {
        state.jwt_keys.clone()
    }
}

/// The state needed to get, create or modify transactions.
#[derive(Clone)]
pub struct TransactionState<T>
where
    T: TransactionStore + Send + Sync,
{
    /// The store for managing user [transactions](crate::models::Transaction).
    pub transaction_store: T,
}

impl<T, U> FromRef<AppState<T, U>> for TransactionState<T>
where
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Send + Sync,
{
    fn from_ref(state: &AppState<T, U>) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
        }
    }
}
