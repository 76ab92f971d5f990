use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;

use crate::auth::revocation::{InMemoryRevocationStore, RevocationStore};
use crate::auth::{CredentialStore, TokenService};
use crate::db::{InMemoryTaskRepository, InMemoryUserRepository, TaskRepository, UserRepository};

/// Names of the storage backends in use, reported by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Backends {
    pub storage: &'static str,
    pub revocation: &'static str,
}

impl Default for Backends {
    fn default() -> Self {
        Self {
            storage: "memory",
            revocation: "memory",
        }
    }
}

/// Everything a handler needs, built once at startup and shared through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub credentials: CredentialStore,
    pub tasks: Arc<dyn TaskRepository>,
    pub tokens: TokenService,
    pub backends: Backends,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tasks: Arc<dyn TaskRepository>,
        tokens: TokenService,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            credentials: CredentialStore::new(users, bcrypt_cost),
            tasks,
            tokens,
            backends: Backends::default(),
        }
    }

    pub fn with_backends(mut self, backends: Backends) -> Self {
        self.backends = backends;
        self
    }

    /// State backed entirely by in-process stores.
    pub fn in_memory(jwt_secret: &str, token_ttl: Duration, bcrypt_cost: u32) -> Self {
        let revocations: Arc<dyn RevocationStore> = Arc::new(InMemoryRevocationStore::new());
        Self::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryTaskRepository::new()),
            TokenService::new(jwt_secret, token_ttl, revocations),
            bcrypt_cost,
        )
    }
}
