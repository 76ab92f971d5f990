use crate::{
    auth::{Identity, LoginRequest, LoginResponse, RegisterRequest},
    error::AppError,
    state::AppState,
};
use actix_web::{post, web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// Register a new user
///
/// Creates a new account with a freshly hashed password. The optional `role`
/// defaults to `user`.
///
/// ## Responses:
/// - `201 Created`: `{"message": "User created", "user": {...}}`.
/// - `400 Bad Request`: `{"errors": ["Missing required fields"]}`, invalid input, or duplicate username/email.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;
    let data = register_data.into_inner();
    // Presence was checked by `validate`.
    let (username, email, password) = match (data.username, data.email, data.password) {
        (Some(username), Some(email), Some(password)) => (username, email, password),
        _ => return Err(AppError::ValidationError(vec!["Missing required fields".into()])),
    };

    let user = state
        .credentials
        .register(&username, &email, &password, data.role.unwrap_or_default())
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "User created",
        "user": user
    })))
}

/// Login user
///
/// Checks the credentials and issues a bearer token.
///
/// ## Responses:
/// - `200 OK`: `{"access_token": "...", "user": {...}}`.
/// - `400 Bad Request`: username or password missing.
/// - `401 Unauthorized`: unknown username or wrong password (indistinguishable).
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = match state
        .credentials
        .verify_credentials(&login_data.username, &login_data.password)
        .await?
    {
        Some(user) => user,
        None => {
            log::warn!("Failed login attempt for username {:?}", login_data.username);
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        }
    };

    let issued = state.tokens.issue(user.id)?;
    log::info!("User {} logged in", user.id);

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token: issued.token,
        user,
    }))
}

/// Logout user
///
/// Revokes the token used for this request. Other tokens of the same user stay valid.
///
/// ## Responses:
/// - `200 OK`: `{"message": "Logged out"}`.
/// - `401 Unauthorized`: missing, invalid, expired or already revoked token.
#[post("/logout")]
pub async fn logout(
    state: web::Data<AppState>,
    identity: Identity,
) -> Result<impl Responder, AppError> {
    state.tokens.revoke(&identity.claims).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Logged out"
    })))
}
