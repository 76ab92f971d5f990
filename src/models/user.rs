use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Privilege level of a user.
/// Corresponds to the `user_role` SQL enum. The set is closed: any other value
/// fails deserialization instead of being stored.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular account, restricted to its own tasks.
    #[default]
    User,
    /// Can list all users and read or modify every task.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// A registered account.
///
/// `password_hash` is loaded from storage for credential checks but is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A user row that has not been inserted yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}
