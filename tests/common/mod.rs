#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use chrono::Duration;
use serde_json::{json, Value};
use taskgate::routes::{self, health};
use taskgate::state::AppState;

pub const TEST_SECRET: &str = "integration-test-secret";

/// In-memory state with the cheapest bcrypt cost.
pub fn test_state() -> AppState {
    AppState::in_memory(TEST_SECRET, Duration::hours(1), 4)
}

pub async fn init_app(
    state: AppState,
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
{
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .wrap(actix_web::middleware::Logger::default())
            .service(health::health)
            .configure(routes::config),
    )
    .await
}

// Helper struct to hold auth details
pub struct TestUser {
    pub id: i64,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {}", self.token))
    }
}

pub async fn send(
    app: &impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    req: actix_http::Request,
) -> (StatusCode, Value) {
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            panic!("Non-JSON body with status {}: {}", status, String::from_utf8_lossy(&body))
        })
    };
    (status, json)
}

pub async fn register(
    app: &impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    username: &str,
    email: &str,
    role: Option<&str>,
) -> (StatusCode, Value) {
    let mut payload = json!({
        "username": username,
        "email": email,
        "password": "Password123!"
    });
    if let Some(role) = role {
        payload["role"] = json!(role);
    }
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(&payload)
        .to_request();
    send(app, req).await
}

pub async fn login(
    app: &impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    username: &str,
    password: &str,
) -> (StatusCode, Value) {
    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(&json!({ "username": username, "password": password }))
        .to_request();
    send(app, req).await
}

pub async fn register_and_login(
    app: &impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    username: &str,
    role: Option<&str>,
) -> TestUser {
    let email = format!("{}@example.com", username);
    let (status, body) = register(app, username, &email, role).await;
    assert_eq!(status, StatusCode::CREATED, "Registration failed: {}", body);

    let (status, body) = login(app, username, "Password123!").await;
    assert_eq!(status, StatusCode::OK, "Login failed: {}", body);

    TestUser {
        id: body["user"]["id"].as_i64().expect("user id in login response"),
        token: body["access_token"]
            .as_str()
            .expect("access_token in login response")
            .to_string(),
    }
}

pub async fn create_task(
    app: &impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    user: &TestUser,
    payload: Value,
) -> (StatusCode, Value) {
    let req = test::TestRequest::post()
        .uri("/tasks/tasks")
        .insert_header(user.bearer())
        .set_json(&payload)
        .to_request();
    send(app, req).await
}
