//! Authorization guard.
//!
//! Access checks are always two explicit steps: `authenticate` answers "who are
//! you" and fails with 401, then `require_role` or `require_owner_or_admin`
//! answers "may you do this" and fails with 403.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::{web, HttpMessage, HttpRequest};

use super::token::Claims;
use crate::error::AppError;
use crate::models::{Role, User};
use crate::state::AppState;

/// The authenticated caller: their current user record and the token they presented.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: User,
    pub claims: Claims,
}

impl Identity {
    pub fn id(&self) -> i32 {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub(crate) fn app_state(req: &HttpRequest) -> Result<web::Data<AppState>, AppError> {
    req.app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| AppError::InternalServerError("Application state not configured".into()))
}

/// Resolves the caller's identity.
///
/// Reuses the claims `AuthMiddleware` stored in the request extensions when
/// present, otherwise validates the bearer token itself. Fails with
/// `Unauthorized` when the token is missing or invalid, or when its subject no
/// longer exists.
pub async fn authenticate(req: &HttpRequest) -> Result<Identity, AppError> {
    let state = app_state(req)?;

    let verified = req.extensions().get::<Claims>().cloned();
    let claims = match verified {
        Some(claims) => claims,
        None => {
            let token = bearer_token(req.headers())
                .ok_or_else(|| AppError::Unauthorized("Missing token".into()))?
                .to_string();
            state.tokens.validate(&token).await?
        }
    };

    let user = state
        .credentials
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    Ok(Identity { user, claims })
}

/// Passes only when the caller holds exactly `role`.
pub fn require_role(identity: &Identity, role: Role) -> Result<(), AppError> {
    if identity.role() != role {
        log::warn!(
            "User {} with role {} denied access requiring {}",
            identity.id(),
            identity.role().as_str(),
            role.as_str()
        );
        let message = match role {
            Role::Admin => "Admin access required",
            Role::User => "Access denied",
        };
        return Err(AppError::Forbidden(message.into()));
    }
    Ok(())
}

/// Passes when the caller is an admin or owns the resource.
pub fn require_owner_or_admin(identity: &Identity, resource_owner_id: i32) -> Result<(), AppError> {
    if identity.is_admin() || identity.id() == resource_owner_id {
        return Ok(());
    }
    log::warn!(
        "User {} denied access to a resource owned by {}",
        identity.id(),
        resource_owner_id
    );
    Err(AppError::Forbidden("Access denied".into()))
}
