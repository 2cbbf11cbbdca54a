//! This file defines a user of the application and its supporting types.

use std::fmt::Display;

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};

use crate::models::PasswordHash;

/// A newtype wrapper for integer user IDs.
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserID(i64);

impl UserID {
    /// Create a user ID from a raw integer.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw integer value of the user ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The access tier of a user.
///
/// Roles are stored on the user record and embedded in auth tokens, so a role
/// change takes effect the next time the user signs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// May read their own data but not create, update or delete anything.
    Viewer,
    /// May read and write their own data.
    Editor,
    /// May read and write any user's data.
    Admin,
}

impl Role {
    /// The role name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "Viewer",
            Role::Editor => "Editor",
            Role::Admin => "Admin",
        }
    }

    /// Parse a role from its database representation.
    ///
    /// Returns `None` for unrecognised role names.
    pub fn from_str(role: &str) -> Option<Self> {
        match role {
            "Viewer" => Some(Role::Viewer),
            "Editor" => Some(Role::Editor),
            "Admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user of the application.
///
/// Each user owns their own set of transactions. The user's role decides what
/// they may do with them (see [crate::policy]).
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    id: UserID,
    email: EmailAddress,
    password_hash: PasswordHash,
    role: Role,
}

impl User {
    /// Create a user object from its parts.
    ///
    /// This does not insert the user into any store, see
    /// [UserStore::create](crate::stores::UserStore::create) for that.
    pub fn new(id: UserID, email: EmailAddress, password_hash: PasswordHash, role: Role) -> Self {
        Self {
            id,
            email,
            password_hash,
            role,
        }
    }

    /// The ID of the user.
    pub fn id(&self) -> UserID {
        self.id
    }

    /// The email address the user registered with.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// The user's salted and hashed password.
    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    /// The user's access tier.
    pub fn role(&self) -> Role {
        self.role
    }
}
