//! JSON Web Token based authentication: the sign-in handler, the token
//! claims and the extractor that guards protected routes.

use axum::{
    Json, RequestPartsExt,
    extract::{FromRef, FromRequestParts, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use email_address::EmailAddress;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    models::{Role, UserID},
    state::{AuthState, JwtKeys},
    stores::UserStore,
};

/// How long a token stays valid after sign-in.
const TOKEN_DURATION: Duration = Duration::hours(24);

/// The contents of a JSON Web Token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub sub: i64,
    /// The role the user had when the token was issued.
    pub role: Role,
    /// The expiry time of the token.
    pub exp: usize,
    /// The time the token was issued.
    pub iat: usize,
}

impl Claims {
    /// The ID of the user the token was issued to.
    pub fn user_id(&self) -> UserID {
        UserID::new(self.sub)
    }
}

impl<S> FromRequestParts<S> for Claims
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::InvalidToken)?;

        let jwt_keys = JwtKeys::from_ref(state);

        let token_data = decode_jwt(bearer.token(), &jwt_keys.decoding)?;

        Ok(token_data.claims)
    }
}

/// The payload of a sign-in request.
#[derive(Deserialize)]
pub struct Credentials {
    /// Email entered during sign-in.
    pub email: EmailAddress,
    /// Password entered during sign-in.
    pub password: String,
}

/// The ways authentication can fail.
#[derive(Debug)]
pub enum AuthError {
    /// The email or password did not match a registered user.
    WrongCredentials,
    /// Signing the token failed.
    TokenCreation,
    /// The request did not carry a valid bearer token.
    InvalidToken,
    /// An unexpected error occurred while verifying the credentials.
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::WrongCredentials => (StatusCode::UNAUTHORIZED, "Wrong credentials"),
            AuthError::TokenCreation => (StatusCode::INTERNAL_SERVER_ERROR, "Token creation error"),
            AuthError::InvalidToken => (StatusCode::BAD_REQUEST, "Invalid token"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Handler for sign-in requests.
///
/// Responds with the signed token as a JSON string.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email does not belong to a registered user.
/// - The password is not correct.
/// - An internal error occurred when verifying the password.
pub async fn sign_in<U>(
    State(state): State<AuthState<U>>,
    Json(user_data): Json<Credentials>,
) -> Result<Json<String>, AuthError>
where
    U: UserStore + Send + Sync,
{
    let user = state
        .user_store
        .get_by_email(&user_data.email)
        .map_err(|error| match error {
            Error::NotFound => AuthError::WrongCredentials,
            error => {
                tracing::error!("Error matching user: {error:?}");
                AuthError::InternalError
            }
        })?;

    let password_is_correct = user
        .password_hash()
        .verify(&user_data.password)
        .map_err(|error| {
            tracing::error!("Error verifying password: {error}");
            AuthError::InternalError
        })?;

    if password_is_correct {
        let token = encode_jwt(user.id(), user.role(), &state.jwt_keys.encoding)?;

        Ok(Json(token))
    } else {
        Err(AuthError::WrongCredentials)
    }
}

/// Sign a token holding the user's ID and role.
pub(crate) fn encode_jwt(
    user_id: UserID,
    role: Role,
    encoding_key: &EncodingKey,
) -> Result<String, AuthError> {
    let now = OffsetDateTime::now_utc();
    let exp = (now + TOKEN_DURATION).unix_timestamp() as usize;
    let iat = now.unix_timestamp() as usize;
    let claims = Claims {
        sub: user_id.as_i64(),
        role,
        exp,
        iat,
    };

    encode(&Header::default(), &claims, encoding_key).map_err(|_| AuthError::TokenCreation)
}

fn decode_jwt(jwt_token: &str, decoding_key: &DecodingKey) -> Result<TokenData<Claims>, AuthError> {
    decode(jwt_token, decoding_key, &Validation::default()).map_err(|_| AuthError::InvalidToken)
}

#[cfg(test)]
mod auth_tests {
    use std::str::FromStr;

    use axum::{
        Json, Router,
        http::StatusCode,
        routing::{get, post},
    };
    use axum_test::TestServer;
    use email_address::EmailAddress;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        models::{PasswordHash, Role, User, UserID, ValidatedPassword},
        state::AuthState,
        stores::{
            UserStore,
            sqlite::{SQLiteUserStore, create_app_state},
        },
    };

    use super::{Claims, decode_jwt, encode_jwt, sign_in};

    fn get_auth_state() -> AuthState<SQLiteUserStore> {
        let connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        let state = create_app_state(connection, "foobar").expect("Could not create app state.");

        AuthState {
            jwt_keys: state.jwt_keys,
            user_store: state.user_store,
        }
    }

    fn create_test_user(state: &mut AuthState<SQLiteUserStore>) -> User {
        let password = ValidatedPassword::new_unchecked("averysafeandsecurepassword");
        let password_hash = PasswordHash::new(password, 4).expect("Could not hash password");

        state
            .user_store
            .create(
                EmailAddress::from_str("foo@bar.baz").unwrap(),
                password_hash,
                Role::Editor,
            )
            .expect("Could not create user")
    }

    #[test]
    fn decode_jwt_round_trips_claims() {
        let state = get_auth_state();
        let jwt = encode_jwt(UserID::new(42), Role::Admin, &state.jwt_keys.encoding)
            .expect("Could not encode JWT");

        let claims = decode_jwt(&jwt, &state.jwt_keys.decoding)
            .expect("Could not decode JWT")
            .claims;

        assert_eq!(claims.user_id(), UserID::new(42));
        assert_eq!(claims.role, Role::Admin);
    }

    #[tokio::test]
    async fn sign_in_succeeds_with_valid_credentials() {
        let mut state = get_auth_state();
        let test_user = create_test_user(&mut state);

        let app = Router::new()
            .route("/sign_in", post(sign_in::<SQLiteUserStore>))
            .with_state(state);

        let server = TestServer::try_new(app).expect("Could not create test server.");

        server
            .post("/sign_in")
            .content_type("application/json")
            .json(&json!({
                "email": test_user.email(),
                "password": "averysafeandsecurepassword",
            }))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn sign_in_fails_with_invalid_credentials() {
        let app = Router::new()
            .route("/sign_in", post(sign_in::<SQLiteUserStore>))
            .with_state(get_auth_state());

        let server = TestServer::try_new(app).expect("Could not create test server.");

        server
            .post("/sign_in")
            .content_type("application/json")
            .json(&json!({
                "email": "wrongemail@gmail.com",
                "password": "definitelyNotTheCorrectPassword",
            }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sign_in_fails_with_wrong_password() {
        let mut state = get_auth_state();
        let test_user = create_test_user(&mut state);

        let app = Router::new()
            .route("/sign_in", post(sign_in::<SQLiteUserStore>))
            .with_state(state);

        let server = TestServer::try_new(app).expect("Could not create test server.");

        server
            .post("/sign_in")
            .content_type("application/json")
            .json(&json!({
                "email": test_user.email(),
                "password": "notthepassword",
            }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    async fn handler_with_auth(claims: Claims) -> Json<i64> {
        Json(claims.sub)
    }

    #[tokio::test]
    async fn protected_route_accepts_valid_token() {
        let mut state = get_auth_state();
        let test_user = create_test_user(&mut state);

        let app = Router::new()
            .route("/sign_in", post(sign_in::<SQLiteUserStore>))
            .route("/protected", get(handler_with_auth))
            .with_state(state);

        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server
            .post("/sign_in")
            .content_type("application/json")
            .json(&json!({
                "email": test_user.email(),
                "password": "averysafeandsecurepassword",
            }))
            .await;

        response.assert_status_ok();

        let token = response.json::<String>();

        server
            .get("/protected")
            .authorization_bearer(token)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn protected_route_rejects_missing_header() {
        let app = Router::new()
            .route("/protected", get(handler_with_auth))
            .with_state(get_auth_state());

        let server = TestServer::try_new(app).expect("Could not create test server.");

        server
            .get("/protected")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn protected_route_rejects_garbage_token() {
        let app = Router::new()
            .route("/protected", get(handler_with_auth))
            .with_state(get_auth_state());

        let server = TestServer::try_new(app).expect("Could not create test server.");

        server
            .get("/protected")
            .authorization_bearer("not.a.token")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
