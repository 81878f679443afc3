//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, Response, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::util::ServiceExt;

use account_service::api::{self, AppState};
use account_service::db;
use account_service::handlers::AccountNumberGenerator;
use account_service::store::MemoryStore;

/// Router over a fresh in-memory store; the store handle is returned for
/// inspection and fault injection
pub fn memory_app() -> (Router, MemoryStore) {
    let store = MemoryStore::new();
    let state = AppState::new(Arc::new(store.clone()), AccountNumberGenerator::default());
    (api::build_router(state), store)
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Send a request and decode the JSON response body
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response: Response<Body> = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Setup test database - apply the schema
///
/// Tables are left alone so tests can run in parallel; each test registers
/// its own identities via [`unique_identity`].
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    db::apply_schema(&pool).await.expect("Failed to apply schema");

    pool
}

/// A random (national ID, phone number) pair unlikely to be on file
pub fn unique_identity() -> (String, String) {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let id_number = format!("{:016}", rng.gen_range(1_000_000_000_000_000u64..10_000_000_000_000_000));
    let phone = format!("08{:010}", rng.gen_range(0u64..10_000_000_000));
    (id_number, phone)
}
