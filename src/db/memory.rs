//! In-process repositories.
//!
//! Used by the test-suite and when the server starts without `DATABASE_URL`.
//! Each operation holds the lock for its whole read-modify-write, which gives the
//! same atomicity the SQL statements provide. Nothing survives a restart.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{TaskRepository, UserRepository};
use crate::error::AppError;
use crate::models::{NewTask, NewUser, Page, PageRequest, Task, TaskFilter, TaskUpdate, User};

struct Table<T> {
    rows: BTreeMap<i32, T>,
    last_id: i32,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    table: RwLock<Table<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        let mut table = self.table.write().await;

        if table.rows.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("Username exists".into()));
        }
        if table.rows.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email exists".into()));
        }

        let id = table.next_id();
        let created = User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
        };
        table.rows.insert(id, created.clone());
        Ok(created)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryTaskRepository {
    table: RwLock<Table<Task>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, task: NewTask) -> Result<Task, AppError> {
        let mut table = self.table.write().await;
        let id = table.next_id();
        let created = Task {
            id,
            title: task.title,
            description: task.description,
            completed: task.completed,
            owner_id: task.owner_id,
            created_at: Utc::now(),
        };
        table.rows.insert(id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: i32) -> Result<Task, AppError> {
        self.table
            .read()
            .await
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Task not found".into()))
    }

    async fn list(&self, filter: TaskFilter, page: PageRequest) -> Result<Page<Task>, AppError> {
        let table = self.table.read().await;

        let mut matching: Vec<&Task> = table
            .rows
            .values()
            .filter(|t| filter.owner_id.map_or(true, |owner| t.owner_id == owner))
            .filter(|t| filter.completed.map_or(true, |done| t.completed == done))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect();

        Ok(Page {
            items,
            total,
            request: page,
        })
    }

    async fn update(&self, id: i32, changes: TaskUpdate) -> Result<Task, AppError> {
        let mut table = self.table.write().await;
        let task = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

        if let Some(title) = changes.title {
            task.title = title;
        }
        if let Some(description) = changes.description {
            task.description = description;
        }
        if let Some(completed) = changes.completed {
            task.completed = completed;
        }
        Ok(task.clone())
    }

    async fn delete(&self, id: i32) -> Result<(), AppError> {
        self.table
            .write()
            .await
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Task not found".into()))
    }
}
