//! Defines the user store trait.

use email_address::EmailAddress;

use crate::{
    Error,
    models::{PasswordHash, Role, User, UserID},
};

/// Handles the creation and retrieval of registered users.
pub trait UserStore {
    /// Create a new user in the store.
    fn create(
        &mut self,
        email: EmailAddress,
        password_hash: PasswordHash,
        role: Role,
    ) -> Result<User, Error>;

    /// Retrieve a user from the store by ID.
    fn get(&self, id: UserID) -> Result<User, Error>;

    /// Retrieve a user from the store by email address.
    fn get_by_email(&self, email: &EmailAddress) -> Result<User, Error>;
}
