//! Common Test Utilities
//!
//! Builds the real router over an in-memory database and drives it with
//! `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use blaxgram_api::{AppState, AppStateInner};
use blaxgram_db::Database;

pub const TEST_SECRET: &str = "test-secret";

/// Test application builder
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().expect("in-memory database"),
            jwt_secret: TEST_SECRET.to_string(),
            token_ttl: chrono::Duration::days(30),
        });

        Self {
            router: blaxgram_api::router(state.clone()),
            state,
        }
    }

    /// Send a request and decode the JSON response body (`Null` if empty).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, Some(token)).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: &str) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body), Some(token)).await
    }

    pub async fn put(&self, uri: &str, body: Value, token: &str) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body), Some(token)).await
    }

    /// Register a user and return `(user_id, token)`.
    pub async fn register(&self, username: &str) -> (i64, String) {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/register",
                Some(json!({ "name": "Test", "lastName": "User", "username": username })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {username}: {body}");
        (
            body["user"]["id"].as_i64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
        )
    }
}
