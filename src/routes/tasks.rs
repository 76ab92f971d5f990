use crate::{
    auth::{require_owner_or_admin, Identity},
    error::AppError,
    models::{NewTask, TaskFilter, TaskInput, TaskQuery, TaskUpdate},
    state::AppState,
    validation::validate_task_input,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;

/// Lists tasks visible to the caller.
///
/// Admins see every task; everyone else sees only their own. Tasks are ordered
/// by creation date, newest first.
///
/// ## Query Parameters:
/// - `page` (optional, default 1): 1-based page number.
/// - `per_page` (optional, default 10): page size, clamped to at most 100.
/// - `completed` (optional): `true`, `1` or `yes` select completed tasks; any other value selects open ones.
///
/// ## Responses:
/// - `200 OK`: `{"tasks": [...], "pagination": {page, pages, per_page, total, has_next, has_prev}}`.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
#[get("/tasks")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    query_params: web::Query<TaskQuery>,
    identity: Identity,
) -> Result<impl Responder, AppError> {
    let filter = TaskFilter {
        owner_id: if identity.is_admin() {
            None
        } else {
            Some(identity.id())
        },
        completed: query_params.completed_filter(),
    };

    let page = state
        .tasks
        .list(filter, query_params.page_request())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "tasks": page.items,
        "pagination": page.info()
    })))
}

/// Retrieves a specific task by its ID.
///
/// ## Responses:
/// - `200 OK`: `{"task": {...}}`.
/// - `403 Forbidden`: the caller is neither the owner nor an admin.
/// - `404 Not Found`: no task with this id.
#[get("/tasks/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    task_id: web::Path<i32>,
    identity: Identity,
) -> Result<impl Responder, AppError> {
    let task = state.tasks.get(task_id.into_inner()).await?;
    require_owner_or_admin(&identity, task.owner_id)?;

    Ok(HttpResponse::Ok().json(json!({ "task": task })))
}

/// Creates a new task owned by the caller.
///
/// ## Request Body:
/// - `title`: required, at most 200 characters.
/// - `description` (optional): defaults to an empty string.
/// - `completed` (optional): defaults to `false`.
///
/// ## Responses:
/// - `201 Created`: `{"message": "Task created", "task": {...}}`.
/// - `400 Bad Request`: `{"errors": [...]}` listing every validation failure.
#[post("/tasks")]
pub async fn create_task(
    state: web::Data<AppState>,
    task_data: web::Json<TaskInput>,
    identity: Identity,
) -> Result<impl Responder, AppError> {
    let errors = validate_task_input(&*task_data);
    if !errors.is_empty() {
        return Err(AppError::ValidationError(errors));
    }

    let task = state
        .tasks
        .create(NewTask::from_input(task_data.into_inner(), identity.id()))
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Task created",
        "task": task
    })))
}

/// Partially updates a task.
///
/// Only fields present in the body are changed. The ownership check runs before
/// validation so that callers cannot probe other users' tasks.
///
/// ## Responses:
/// - `200 OK`: `{"message": "Task updated", "task": {...}}`.
/// - `400 Bad Request`: `{"errors": [...]}`.
/// - `403 Forbidden` / `404 Not Found`: as for `get_task`.
#[put("/tasks/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    task_id: web::Path<i32>,
    task_data: web::Json<TaskUpdate>,
    identity: Identity,
) -> Result<impl Responder, AppError> {
    let task_id = task_id.into_inner();
    let existing = state.tasks.get(task_id).await?;
    require_owner_or_admin(&identity, existing.owner_id)?;

    let errors = validate_task_input(&*task_data);
    if !errors.is_empty() {
        return Err(AppError::ValidationError(errors));
    }

    // Owner is immutable, so the check above still holds; a concurrent delete
    // surfaces here as NotFound.
    let task = state.tasks.update(task_id, task_data.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Task updated",
        "task": task
    })))
}

/// Deletes a task permanently.
///
/// ## Responses:
/// - `200 OK`: `{"message": "Task deleted"}`.
/// - `403 Forbidden` / `404 Not Found`: as for `get_task`; deleting twice yields 404.
#[delete("/tasks/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    task_id: web::Path<i32>,
    identity: Identity,
) -> Result<impl Responder, AppError> {
    let task_id = task_id.into_inner();
    let existing = state.tasks.get(task_id).await?;
    require_owner_or_admin(&identity, existing.owner_id)?;

    state.tasks.delete(task_id).await?;
    log::info!("User {} deleted task {}", identity.id(), task_id);

    Ok(HttpResponse::Ok().json(json!({ "message": "Task deleted" })))
}
