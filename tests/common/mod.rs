#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate};
use serde_json::Value;
use std::sync::{Arc, Once};
use tower::ServiceExt;

use gym_crm::api::{create_routes, AppState};
use gym_crm::auth::{PasswordHasher, UserSession, MIN_COST};
use gym_crm::config::ensure_admin;
use gym_crm::models::{
    Role, TraineeRegisterRequest, TrainerRegisterRequest, TrainingType,
};
use gym_crm::repository::{InMemoryStore, Store};

pub const JWT_SECRET: &str = "test_secret_key_for_testing_only";
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "Adm1n!secret";

static INIT: Once = Once::new();

/// Initialize test logging
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("gym_crm=debug")
            .with_test_writer()
            .try_init();
    });
}

/// Services wired to a fresh in-memory store with a bootstrapped admin.
pub struct TestApp {
    pub store: Arc<dyn Store>,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        init_test_logging();

        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let hasher = PasswordHasher::new(MIN_COST);
        ensure_admin(store.as_ref(), &hasher, ADMIN_USERNAME, Some(ADMIN_PASSWORD))
            .await
            .expect("admin bootstrap");

        let state = AppState::new(store.clone(), JWT_SECRET, Duration::minutes(15), hasher);
        Self { store, state }
    }

    pub fn router(&self) -> Router {
        create_routes(self.state.clone())
    }
}

pub fn admin() -> UserSession {
    UserSession {
        username: ADMIN_USERNAME.to_string(),
        role: Role::Admin,
        is_active: true,
    }
}

pub fn session(username: &str, role: Role) -> UserSession {
    UserSession {
        username: username.to_string(),
        role,
        is_active: true,
    }
}

pub fn trainee_request(first_name: &str, last_name: &str) -> TraineeRegisterRequest {
    TraineeRegisterRequest {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1992, 4, 12),
        address: Some("12 Elm Street".to_string()),
    }
}

pub fn trainer_request(
    first_name: &str,
    last_name: &str,
    specialization: TrainingType,
) -> TrainerRegisterRequest {
    TrainerRegisterRequest {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        specialization,
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Build a JSON request, with a bearer token when given.
pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
    builder.body(body).expect("request")
}

/// Send a request through the router and decode the JSON body (Null when empty).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");

    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Log in through the API and return the access token.
pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/api/v1/user/login",
            None,
            Some(serde_json::json!({ "username": username, "password": password })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);

    body["access_token"]
        .as_str()
        .expect("access_token")
        .to_string()
}
