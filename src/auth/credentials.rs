use std::sync::Arc;

use super::password::{hash_password_with_cost, verify_password};
use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::{NewUser, Role, User};

/// Registration and credential checks on top of a `UserRepository`.
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserRepository>,
    bcrypt_cost: u32,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserRepository>, bcrypt_cost: u32) -> Self {
        Self { users, bcrypt_cost }
    }

    /// Creates a user with a freshly computed password hash.
    ///
    /// The hash is computed before anything is written, so a failure leaves no row behind.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let password_hash = hash_password_with_cost(password, self.bcrypt_cost)?;
        let user = self
            .users
            .insert(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                role,
            })
            .await?;
        log::info!("Registered user {} ({}) as {}", user.id, user.username, user.role.as_str());
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.users.find_by_username(username).await
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        self.users.find_by_id(id).await
    }

    /// Returns the user when `username` exists and `password` matches its hash.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, AppError> {
        let user = self.users.find_by_username(username).await?;
        Ok(user.filter(|u| verify_password(password, &u.password_hash)))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.users.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryUserRepository;

    fn store() -> CredentialStore {
        CredentialStore::new(Arc::new(InMemoryUserRepository::new()), 4)
    }

    #[actix_rt::test]
    async fn test_register_hashes_password() {
        let store = store();
        let user = store
            .register("alice", "a@x.com", "pw", Role::User)
            .await
            .unwrap();
        assert_ne!(user.password_hash, "pw");
        assert!(user.password_hash.starts_with("$2"));
        assert_eq!(user.role, Role::User);
    }

    #[actix_rt::test]
    async fn test_duplicate_username_with_different_email_conflicts() {
        let store = store();
        store
            .register("alice", "a@x.com", "pw", Role::User)
            .await
            .unwrap();
        let result = store
            .register("alice", "different@x.com", "pw", Role::User)
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[actix_rt::test]
    async fn test_verify_credentials() {
        let store = store();
        let alice = store
            .register("alice", "a@x.com", "pw", Role::User)
            .await
            .unwrap();

        let found = store.verify_credentials("alice", "pw").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(alice.id));
        assert!(store.verify_credentials("alice", "nope").await.unwrap().is_none());
        assert!(store.verify_credentials("nobody", "pw").await.unwrap().is_none());
    }
}
