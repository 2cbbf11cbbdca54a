//! Route handler for registering new users.

use axum::{Json, extract::State, http::StatusCode};
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    models::{PasswordHash, Role, UserID, ValidatedPassword},
    state::AuthState,
    stores::UserStore,
};

/// The payload of a registration request.
#[derive(Deserialize)]
pub struct RegisterData {
    /// The email address to register with.
    pub email: EmailAddress,
    /// The password to register with.
    pub password: String,
    /// The requested role, defaults to [Role::Editor].
    pub role: Option<Role>,
}

/// The public view of a registered user. Never includes the password hash.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    /// The ID of the user.
    pub id: UserID,
    /// The email address the user registered with.
    pub email: EmailAddress,
    /// The user's access tier.
    pub role: Role,
}

/// Route handler for registering a new user.
///
/// New users may choose the viewer or editor role. The admin role can not be
/// self-assigned.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The requested role is admin.
/// - The password is too weak.
/// - The email already belongs to another user.
/// - There was an unexpected database error.
pub async fn register_user<U>(
    State(mut state): State<AuthState<U>>,
    Json(data): Json<RegisterData>,
) -> Result<(StatusCode, Json<UserProfile>), Error>
where
    U: UserStore + Send + Sync,
{
    let role = data.role.unwrap_or(Role::Editor);

    if role == Role::Admin {
        return Err(Error::Forbidden(
            "Cannot register as an admin".to_owned(),
        ));
    }

    let password = ValidatedPassword::new(&data.password)?;
    let password_hash = PasswordHash::new(password, PasswordHash::DEFAULT_COST)?;

    let user = state.user_store.create(data.email, password_hash, role)?;

    let profile = UserProfile {
        id: user.id(),
        email: user.email().clone(),
        role: user.role(),
    };

    Ok((StatusCode::CREATED, Json(profile)))
}

#[cfg(test)]
mod register_endpoint_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{build_router, endpoints, stores::sqlite::create_app_state};

    fn get_test_server() -> TestServer {
        let connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        let state = create_app_state(connection, "foobar").expect("Could not create app state.");

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn register_defaults_to_editor_role() {
        let server = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .json(&json!({
                "email": "foo@bar.baz",
                "password": "averysafeandsecurepassword",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);

        let body = response.json::<Value>();
        assert_eq!(body["email"], "foo@bar.baz");
        assert_eq!(body["role"], "Editor");
        assert!(body.get("password").is_none());
    }

    #[tokio::test]
    async fn register_accepts_viewer_role() {
        let server = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .json(&json!({
                "email": "foo@bar.baz",
                "password": "averysafeandsecurepassword",
                "role": "Viewer",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.json::<Value>()["role"], "Viewer");
    }

    #[tokio::test]
    async fn register_rejects_admin_role() {
        let server = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .json(&json!({
                "email": "foo@bar.baz",
                "password": "averysafeandsecurepassword",
                "role": "Admin",
            }))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn register_rejects_weak_password() {
        let server = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .json(&json!({
                "email": "foo@bar.baz",
                "password": "hunter2",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let server = get_test_server();
        let body = json!({
            "email": "foo@bar.baz",
            "password": "averysafeandsecurepassword",
        });

        server
            .post(endpoints::USERS)
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.post(endpoints::USERS).json(&body).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["error"],
            "the email address is already in use"
        );
    }
}
