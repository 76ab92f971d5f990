pub mod admin;
pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::{error, web, HttpRequest, ResponseError};

use crate::auth::AuthMiddleware;
use crate::error::AppError;

/// Registers every API scope.
///
/// `/auth/register` and `/auth/login` are public. `/auth/logout` authenticates
/// through the `Identity` extractor; `/tasks` and `/admin` are additionally
/// guarded by `AuthMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .app_data(query_config())
        .service(
            web::scope("/auth")
                .service(auth::register)
                .service(auth::login)
                .service(auth::logout),
        )
        .service(
            web::scope("/tasks")
                .wrap(AuthMiddleware)
                .service(tasks::get_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        )
        .service(
            web::scope("/admin")
                .wrap(AuthMiddleware)
                .service(admin::list_users),
        );
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        log::debug!("Rejected JSON body: {}", err);
        let message = match &err {
            error::JsonPayloadError::ContentType => "Content type must be application/json".to_string(),
            other => format!("Invalid JSON body: {}", other),
        };
        error::InternalError::from_response(err, AppError::BadRequest(message).error_response()).into()
    })
}

/// A path segment that does not parse (e.g. a non-numeric id) names no resource.
fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, req: &HttpRequest| {
        log::debug!("Unmatched path parameter in {}: {}", req.path(), err);
        let response = AppError::NotFound("Resource not found".into()).error_response();
        error::InternalError::from_response(err, response).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
        let response = AppError::BadRequest(format!("Invalid query string: {}", err)).error_response();
        error::InternalError::from_response(err, response).into()
    })
}
