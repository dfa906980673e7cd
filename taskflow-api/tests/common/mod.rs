#![allow(dead_code)]

/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - A router over fresh in-memory storage (empty or seeded)
/// - Request helpers that drive the router without a socket
/// - JSON body decoding

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use taskflow_api::app::{api_routes, with_middleware, AppState};
use taskflow_api::config::Config;
use taskflow_shared::storage::Storage;
use tower::ServiceExt;

/// Test context containing the router and the storage behind it
pub struct TestContext {
    pub app: axum::Router,
    pub storage: Storage,
}

impl TestContext {
    /// Router over empty in-memory storage
    pub fn new() -> Self {
        Self::with_storage(Storage::memory())
    }

    /// Router over the demo users and tasks
    pub fn seeded() -> Self {
        Self::with_storage(Storage::memory_with_demo_data())
    }

    pub fn with_storage(storage: Storage) -> Self {
        Self::with_routes(storage, api_routes())
    }

    /// Full middleware stack around caller-supplied routes
    pub fn with_routes(storage: Storage, routes: axum::Router<AppState>) -> Self {
        let config = Config::from_lookup(|_| None).expect("default config is valid");
        let state = AppState::new(storage.clone(), config);
        Self {
            app: with_middleware(routes, state),
            storage,
        }
    }

    /// Sends a request and returns status plus decoded JSON body
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let raw = body.map(|b| b.to_string()).unwrap_or_default();
        self.send_raw(method, uri, &raw).await
    }

    /// Sends a request with a literal body string
    pub async fn send_raw(&self, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                panic!(
                    "{} {} returned non-JSON body ({}): {}",
                    method,
                    uri,
                    e,
                    String::from_utf8_lossy(&bytes)
                )
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("PUT", uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str) -> (StatusCode, Value) {
        self.send("PATCH", uri, None).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send("DELETE", uri, None).await
    }

    /// Creates a user and returns its id
    pub async fn create_user(&self, name: &str, email: &str) -> i64 {
        let (status, body) = self
            .post("/api/users", serde_json::json!({"nombre": name, "email": email}))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create user failed: {}", body);
        body["id"].as_i64().unwrap()
    }

    /// Creates a task and returns its id
    pub async fn create_task(&self, body: Value) -> i64 {
        let (status, body) = self.post("/api/tasks", body).await;
        assert_eq!(status, StatusCode::CREATED, "create task failed: {}", body);
        body["id"].as_i64().unwrap()
    }
}
