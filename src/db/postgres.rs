use async_trait::async_trait;
use sqlx::PgPool;

use super::{TaskRepository, UserRepository};
use crate::error::AppError;
use crate::models::{NewTask, NewUser, Page, PageRequest, Task, TaskFilter, TaskUpdate, User};

const USER_COLUMNS: &str = "id, username, email, password_hash, role";
const TASK_COLUMNS: &str = "id, title, description, completed, owner_id, created_at";

/// `UserRepository` backed by the `users` table.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        // Dropping `tx` on any early return rolls the transaction back.
        let mut tx = self.pool.begin().await?;

        let username_taken = sqlx::query_as::<_, (i32,)>("SELECT id FROM users WHERE username = $1")
            .bind(&user.username)
            .fetch_optional(&mut *tx)
            .await?;
        if username_taken.is_some() {
            return Err(AppError::Conflict("Username exists".into()));
        }

        let email_taken = sqlx::query_as::<_, (i32,)>("SELECT id FROM users WHERE email = $1")
            .bind(&user.email)
            .fetch_optional(&mut *tx)
            .await?;
        if email_taken.is_some() {
            return Err(AppError::Conflict("Email exists".into()));
        }

        // A concurrent insert can still win the race; the unique constraints turn
        // that into a unique violation, which converts to `AppError::Conflict`.
        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, password_hash, role) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let users =
            sqlx::query_as::<_, User>(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))
                .fetch_all(&self.pool)
                .await?;
        Ok(users)
    }
}

/// `TaskRepository` backed by the `tasks` table.
#[derive(Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Builds the `WHERE` clause for a filter. Placeholders are numbered from `$1`
/// in the order owner_id, completed; returns the next free placeholder index.
fn where_clause(filter: &TaskFilter) -> (String, usize) {
    let mut conditions: Vec<String> = Vec::new();
    let mut param_count = 1;

    if filter.owner_id.is_some() {
        conditions.push(format!("owner_id = ${}", param_count));
        param_count += 1;
    }
    if filter.completed.is_some() {
        conditions.push(format!("completed = ${}", param_count));
        param_count += 1;
    }

    if conditions.is_empty() {
        (String::new(), param_count)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), param_count)
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn create(&self, task: NewTask) -> Result<Task, AppError> {
        let created = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (title, description, completed, owner_id) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.completed)
        .bind(task.owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get(&self, id: i32) -> Result<Task, AppError> {
        sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".into()))
    }

    async fn list(&self, filter: TaskFilter, page: PageRequest) -> Result<Page<Task>, AppError> {
        let (where_sql, next_param) = where_clause(&filter);

        let count_sql = format!("SELECT COUNT(*) FROM tasks{}", where_sql);
        let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
        if let Some(owner_id) = filter.owner_id {
            count_query = count_query.bind(owner_id);
        }
        if let Some(completed) = filter.completed {
            count_query = count_query.bind(completed);
        }
        let (total,) = count_query.fetch_one(&self.pool).await?;

        // `id` breaks ties between tasks created in the same instant.
        let items_sql = format!(
            "SELECT {} FROM tasks{} ORDER BY created_at DESC, id DESC LIMIT ${} OFFSET ${}",
            TASK_COLUMNS,
            where_sql,
            next_param,
            next_param + 1
        );
        let mut items_query = sqlx::query_as::<_, Task>(&items_sql);
        if let Some(owner_id) = filter.owner_id {
            items_query = items_query.bind(owner_id);
        }
        if let Some(completed) = filter.completed {
            items_query = items_query.bind(completed);
        }
        let items = items_query
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items,
            total,
            request: page,
        })
    }

    async fn update(&self, id: i32, changes: TaskUpdate) -> Result<Task, AppError> {
        // Single statement: a concurrent delete makes this return no row, and two
        // concurrent updates resolve as last-write-wins per column.
        sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET \
                 title = COALESCE($1, title), \
                 description = COALESCE($2, description), \
                 completed = COALESCE($3, completed) \
             WHERE id = $4 RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.completed)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))
    }

    async fn delete(&self, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Task not found".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_clause_without_filters() {
        assert_eq!(where_clause(&TaskFilter::default()), (String::new(), 1));
    }

    #[test]
    fn test_where_clause_numbers_placeholders_in_order() {
        let filter = TaskFilter {
            owner_id: Some(4),
            completed: Some(true),
        };
        assert_eq!(
            where_clause(&filter),
            (" WHERE owner_id = $1 AND completed = $2".to_string(), 3)
        );

        let filter = TaskFilter {
            owner_id: None,
            completed: Some(false),
        };
        assert_eq!(where_clause(&filter), (" WHERE completed = $1".to_string(), 2));
    }
}
