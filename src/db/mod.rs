//! Persistence boundary.
//!
//! Handlers never talk to a database driver directly; they go through the
//! `UserRepository` and `TaskRepository` traits. `postgres` implements them over a
//! pooled `sqlx::PgPool`, `memory` implements them over in-process maps for tests
//! and for running without a database.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::error::AppError;
use crate::models::{NewTask, NewUser, Page, PageRequest, Task, TaskFilter, TaskUpdate, User};

pub use memory::{InMemoryTaskRepository, InMemoryUserRepository};
pub use postgres::{PgTaskRepository, PgUserRepository};

/// Storage of user accounts. Username and email are unique.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user atomically. Fails with `AppError::Conflict` when the
    /// username or email is already taken; nothing is written in that case.
    async fn insert(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError>;

    /// All users ordered by id.
    async fn list(&self) -> Result<Vec<User>, AppError>;
}

/// Storage of tasks. Ownership scoping is the caller's job.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: NewTask) -> Result<Task, AppError>;

    /// Fails with `AppError::NotFound` if the task does not exist.
    async fn get(&self, id: i32) -> Result<Task, AppError>;

    /// Newest first, offset pagination. `total` counts every row matching `filter`.
    async fn list(&self, filter: TaskFilter, page: PageRequest) -> Result<Page<Task>, AppError>;

    /// Overwrites only the fields present in `changes`, in one atomic step.
    /// Fails with `AppError::NotFound` if the task no longer exists.
    async fn update(&self, id: i32, changes: TaskUpdate) -> Result<Task, AppError>;

    /// Hard delete. A second delete of the same id is `AppError::NotFound`.
    async fn delete(&self, id: i32) -> Result<(), AppError>;
}

/// Builds the connection pool. Connections are checked out per query and
/// returned when the query finishes.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(database_url)
        .await
}

/// Applies the SQL migrations under `./migrations`.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
