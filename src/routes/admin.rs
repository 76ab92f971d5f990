use crate::{
    auth::{require_role, Identity},
    error::AppError,
    models::Role,
    state::AppState,
};
use actix_web::{get, web, HttpResponse, Responder};
use serde_json::json;

/// List all users
///
/// Admin only. Users are ordered by id; password hashes are never serialized.
///
/// ## Responses:
/// - `200 OK`: `{"users": [...]}`.
/// - `403 Forbidden`: `{"error": "Admin access required"}`.
#[get("/users")]
pub async fn list_users(
    state: web::Data<AppState>,
    identity: Identity,
) -> Result<impl Responder, AppError> {
    require_role(&identity, Role::Admin)?;

    let users = state.credentials.list_users().await?;

    Ok(HttpResponse::Ok().json(json!({ "users": users })))
}
