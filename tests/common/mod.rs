#![allow(dead_code)]

use actix_http::Request;
use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::{header, StatusCode},
    middleware::Logger,
    test, web, App,
};
use serde_json::{json, Value};
use std::sync::Arc;
use taskgate::{
    auth::{AccessMode, AccessPolicy, AuthResponse, PasswordHasher, TokenMiddleware, TokenService},
    routes,
    store::InMemoryStore,
    AppState,
};

pub const TEST_SECRET: &str = "integration-test-secret";

/// Application state over a fresh in-memory store. bcrypt runs at its minimum
/// cost to keep the suite fast.
pub fn test_state(mode: AccessMode, enforce_ownership: bool) -> web::Data<AppState> {
    web::Data::new(AppState::new(
        Arc::new(InMemoryStore::new()),
        TokenService::new(TEST_SECRET, Some(chrono::Duration::hours(1))),
        PasswordHasher::new(4),
        AccessPolicy::new(mode, enforce_ownership),
    ))
}

pub async fn spawn_app(
    state: web::Data<AppState>,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(state)
            .wrap(TokenMiddleware)
            .wrap(Logger::default())
            .configure(routes::config),
    )
    .await
}

/// Sends `req` and returns the status with the body parsed as JSON
/// (`Value::Null` for an empty body).
pub async fn send<S, B>(app: &S, req: test::TestRequest) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };
    (status, json)
}

pub fn bearer(req: test::TestRequest, token: &str) -> test::TestRequest {
    req.insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
}

pub async fn register<S, B>(app: &S, username: &str, password: &str, is_admin: bool) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post().uri("/register").set_json(json!({
        "username": username,
        "password": password,
        "is_admin": is_admin
    }));
    let (status, body) = send(app, req).await;
    assert_eq!(
        status,
        StatusCode::CREATED,
        "Registration of {} failed. Body: {}",
        username,
        body
    );
    body
}

pub async fn login<S, B>(app: &S, username: &str, password: &str) -> AuthResponse
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post().uri("/login").set_json(json!({
        "username": username,
        "password": password
    }));
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK, "Login of {} failed. Body: {}", username, body);
    serde_json::from_value(body).expect("Failed to parse login response JSON")
}

/// A registered and logged-in account.
pub struct TestUser {
    pub id: i64,
    pub token: String,
}

pub async fn register_and_login<S, B>(
    app: &S,
    username: &str,
    password: &str,
    is_admin: bool,
) -> TestUser
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let profile = register(app, username, password, is_admin).await;
    let auth = login(app, username, password).await;
    TestUser {
        id: profile["id"].as_i64().expect("registration returned no id"),
        token: auth.token,
    }
}

pub async fn create_task<S, B>(app: &S, token: Option<&str>, body: Value) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post().uri("/tasks").set_json(body);
    let req = match token {
        Some(token) => bearer(req, token),
        None => req,
    };
    send(app, req).await
}

pub async fn list_tasks<S, B>(app: &S, uri: &str, token: Option<&str>) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::get().uri(uri);
    let req = match token {
        Some(token) => bearer(req, token),
        None => req,
    };
    send(app, req).await
}

/// Inserts an administrator straight into the store. With ownership enforced
/// only an admin may register another admin, so the first one is seeded.
pub async fn seed_admin(state: &web::Data<AppState>, username: &str, password: &str) {
    let hash = state
        .passwords
        .hash(password)
        .expect("Failed to hash admin password");
    state
        .users
        .create_user(username, &hash, true)
        .await
        .expect("Failed to seed admin");
}

/// Ids of the tasks in a JSON array body.
pub fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .expect("expected a JSON array")
        .iter()
        .map(|task| task["id"].as_i64().expect("task without id"))
        .collect()
}
