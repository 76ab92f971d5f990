pub mod credentials;
pub mod extractors;
pub mod guard;
pub mod middleware;
pub mod password;
pub mod revocation;
pub mod token;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Role, User};

// Re-export necessary items
pub use credentials::CredentialStore;
pub use guard::{authenticate, require_owner_or_admin, require_role, Identity};
pub use middleware::AuthMiddleware;
pub use revocation::{InMemoryRevocationStore, RedisRevocationStore, RevocationStore};
pub use token::{Claims, IssuedToken, TokenService};

lazy_static! {
    // Regex for username validation: alphanumeric, dots, underscores, hyphens
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_.-]+$").unwrap();
}

/// Represents the payload for a new user registration request.
///
/// The credential fields are optional at the type level so an omitted field is
/// reported as "Missing required fields" instead of a deserialization failure.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username for the new account.
    /// Between 1 and 80 characters: letters, digits, dots, underscores or hyphens.
    #[validate(
        required(message = "Missing required fields"),
        length(min = 1, max = 80, message = "Username must be between 1 and 80 characters"),
        regex(
            path = "USERNAME_REGEX",
            message = "Username may only contain letters, digits, dots, underscores or hyphens"
        )
    )]
    pub username: Option<String>,
    /// Email address for the new account.
    #[validate(
        required(message = "Missing required fields"),
        email(message = "Email must be a valid address"),
        length(max = 120, message = "Email must be at most 120 characters")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "Missing required fields"),
        length(min = 1, message = "Password is required")
    )]
    pub password: Option<String>,
    /// Requested role; defaults to `user`. Unknown roles fail deserialization.
    #[serde(default)]
    pub role: Option<Role>,
}

/// Represents the payload for a user login request.
/// Omitted fields deserialize as empty and fail validation.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Username and password required"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Username and password required"))]
    pub password: String,
}

/// Response structure after a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// The JWT to send as `Authorization: Bearer <token>`.
    pub access_token: String,
    pub user: User,
}
