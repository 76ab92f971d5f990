//! Token issuance, validation and revocation.
//!
//! Tokens are HS256 JWTs carrying the user id (`sub`), a unique identifier (`jti`)
//! and an expiry (`exp`). A token is valid only while its signature checks out,
//! `exp` lies in the future and its `jti` is absent from the revocation registry.
//! Expired and revoked are terminal.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::revocation::RevocationStore;
use crate::error::AppError;

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 60 * 60 * 24;

/// Represents the claims encoded within a JWT.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the user's id.
    pub sub: i32,
    /// Unique token identifier, the handle used for revocation.
    pub jti: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// Instant after which the token can no longer pass validation.
    ///
    /// Expiry is checked as `exp < now` in whole seconds, so the token is still
    /// accepted throughout second `exp`.
    pub fn valid_until(&self) -> DateTime<Utc> {
        self.expires_at() + Duration::seconds(1)
    }
}

/// A freshly signed token and the claims inside it.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Signs and verifies tokens and consults the revocation registry.
///
/// Constructed once at startup and shared by reference with every handler.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    revocations: Arc<dyn RevocationStore>,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration, revocations: Arc<dyn RevocationStore>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
            revocations,
        }
    }

    /// Issues a token for `user_id` that expires after the configured TTL.
    pub fn issue(&self, user_id: i32) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::InternalServerError("Token expiry overflow".into()))?;

        let claims = Claims {
            sub: user_id,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };
        let token = self.sign(&claims)?;
        Ok(IssuedToken { token, claims })
    }

    fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies signature and expiry, then rejects revoked tokens.
    pub async fn validate(&self, token: &str) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims;

        if self.revocations.is_revoked(&claims.jti).await? {
            log::debug!("Rejected revoked token {}", claims.jti);
            return Err(AppError::Unauthorized("Token has been revoked".into()));
        }
        Ok(claims)
    }

    /// Revokes the token described by `claims` for the rest of its lifetime.
    pub async fn revoke(&self, claims: &Claims) -> Result<(), AppError> {
        self.revocations
            .revoke(&claims.jti, claims.valid_until())
            .await?;
        log::info!("Revoked token {} of user {}", claims.jti, claims.sub);
        Ok(())
    }
}
