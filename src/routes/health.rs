use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::state::AppState;

/// Health check endpoint
///
/// Returns the current status of the API, the timestamp and which storage
/// backends the process runs on. No authentication required.
#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "backends": state.backends
    }))
}
