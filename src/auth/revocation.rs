//! Revocation registry for issued tokens.
//!
//! A revoked token identifier only has to be remembered until the token would have
//! expired anyway, so every backend stores entries with that expiry attached.
//!
//! `InMemoryRevocationStore` is process-local: a restart forgets every revocation
//! and previously revoked, still unexpired tokens become valid again. Deployments
//! that need logout to survive restarts, or that run more than one instance, must
//! set `REDIS_URL` so `RedisRevocationStore` is used instead.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::AppError;

/// Key-existence store with per-key expiry.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Marks `token_id` as revoked until `expires_at`. Idempotent.
    async fn revoke(&self, token_id: &str, expires_at: DateTime<Utc>) -> Result<(), AppError>;

    /// Whether `token_id` has been revoked and the revocation has not lapsed.
    async fn is_revoked(&self, token_id: &str) -> Result<bool, AppError>;
}

/// Process-local revocation set. Lapsed entries are purged on every write.
#[derive(Default)]
pub struct InMemoryRevocationStore {
    entries: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of revocations currently held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn revoke(&self, token_id: &str, expires_at: DateTime<Utc>) -> Result<(), AppError> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, expiry| *expiry > now);
        if expires_at > now {
            entries.insert(token_id.to_string(), expires_at);
        }
        Ok(())
    }

    async fn is_revoked(&self, token_id: &str) -> Result<bool, AppError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(token_id)
            .map_or(false, |expiry| *expiry > Utc::now()))
    }
}

/// Redis-backed revocation set shared by every instance.
///
/// **Key format**: `token:revoked:{jti}`
/// **TTL**: seconds until the token expires
#[derive(Clone)]
pub struct RedisRevocationStore {
    redis: ConnectionManager,
}

impl RedisRevocationStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self::new(manager))
    }

    fn key(token_id: &str) -> String {
        format!("token:revoked:{}", token_id)
    }
}

/// Whole seconds until `expires_at`, rounded up so a key never lapses early.
/// `None` when the instant has already passed.
fn expiry_seconds(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<u64> {
    let millis = (expires_at - now).num_milliseconds();
    if millis <= 0 {
        return None;
    }
    Some(((millis + 999) / 1000) as u64)
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn revoke(&self, token_id: &str, expires_at: DateTime<Utc>) -> Result<(), AppError> {
        let ttl = match expiry_seconds(expires_at, Utc::now()) {
            Some(ttl) => ttl,
            None => return Ok(()),
        };

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(Self::key(token_id), "revoked", ttl)
            .await?;
        Ok(())
    }

    async fn is_revoked(&self, token_id: &str) -> Result<bool, AppError> {
        let mut conn = self.redis.clone();
        let exists: bool = conn.exists(Self::key(token_id)).await?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[actix_rt::test]
    async fn test_revoke_is_idempotent() {
        let store = InMemoryRevocationStore::new();
        let expiry = Utc::now() + Duration::hours(1);

        assert!(!store.is_revoked("jti-1").await.unwrap());
        store.revoke("jti-1", expiry).await.unwrap();
        store.revoke("jti-1", expiry).await.unwrap();

        assert!(store.is_revoked("jti-1").await.unwrap());
        assert!(!store.is_revoked("jti-2").await.unwrap());
        assert_eq!(store.len().await, 1);
    }

    #[actix_rt::test]
    async fn test_lapsed_entries_are_purged() {
        let store = InMemoryRevocationStore::new();
        store
            .revoke("old", Utc::now() + Duration::milliseconds(20))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(40)).await;

        assert!(!store.is_revoked("old").await.unwrap());
        store
            .revoke("new", Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[actix_rt::test]
    async fn test_already_expired_token_is_not_stored() {
        let store = InMemoryRevocationStore::new();
        store
            .revoke("expired", Utc::now() - Duration::minutes(1))
            .await
            .unwrap();
        assert!(store.is_empty().await);
    }

    #[test]
    fn test_expiry_seconds_rounds_up() {
        let now = Utc::now();
        assert_eq!(expiry_seconds(now + Duration::milliseconds(1_300), now), Some(2));
        assert_eq!(expiry_seconds(now + Duration::seconds(5), now), Some(5));
        assert_eq!(expiry_seconds(now + Duration::milliseconds(1), now), Some(1));
        assert_eq!(expiry_seconds(now, now), None);
        assert_eq!(expiry_seconds(now - Duration::seconds(1), now), None);
    }

    #[test]
    fn test_redis_key_format() {
        assert_eq!(RedisRevocationStore::key("abc"), "token:revoked:abc");
    }
}
