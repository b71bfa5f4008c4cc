#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use satorial_api::{config::AppConfig, db, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Helper harness for spinning up an application state backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        // A single connection keeps every request on the same in-memory database.
        Self::with_database("sqlite::memory:", 1).await
    }

    /// Construct a test application over `database_url` with a pool of
    /// `max_connections`, for tests that need real connection concurrency.
    pub async fn with_database(database_url: &str, max_connections: u32) -> Self {
        let mut cfg = AppConfig::new(
            database_url.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = max_connections;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = satorial_api::app_router(state.clone());

        Self { router, state }
    }

    /// Send a request against the router.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.send(request).await
    }

    /// Send a pre-built request, for tests that need custom headers or raw bodies.
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Response {
        self.request(Method::POST, uri, Some(body)).await
    }

    /// POSTs `body` and returns the id from a `201 Created` response.
    pub async fn create(&self, uri: &str, body: Value) -> i64 {
        let response = self.post(uri, body).await;
        let status = response.status();
        let payload = response_json(response).await;
        assert_eq!(status, StatusCode::CREATED, "POST {} failed: {}", uri, payload);
        payload["id"].as_i64().expect("created response carries an id")
    }

    /// Seeds the category and unit of measure most tests rely on.
    pub async fn seed_catalog(&self) {
        self.create("/categories", json!({ "code": "fabric" })).await;
        self.create("/categories", json!({ "code": "trim" })).await;
        self.create("/uoms", json!({ "code": "m" })).await;
        self.create("/uoms", json!({ "code": "pcs" })).await;
    }

    pub async fn seed_item(&self, sku: &str, name: &str) -> i64 {
        self.create(
            "/items",
            json!({
                "sku": sku,
                "name": name,
                "category": "fabric",
                "base_uom": "m",
            }),
        )
        .await
    }

    pub async fn seed_supplier(&self, name: &str) -> i64 {
        self.create("/suppliers", json!({ "name": name })).await
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is not valid json")
    }
}
