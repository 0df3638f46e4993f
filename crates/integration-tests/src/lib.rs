//! Integration tests for Shopfloor.
//!
//! The tests drive the real router in process with `tower::ServiceExt::oneshot`,
//! backed by the in-memory catalog store and `tower_sessions::MemoryStore`. No
//! database or network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfloor-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use shopfloor_api::config::ApiConfig;
use shopfloor_api::db::MemoryStore;
use shopfloor_api::state::AppState;

/// A router over fresh in-memory stores.
#[derive(Clone)]
pub struct TestApp {
    router: Router,
}

/// Status, decoded body and session cookie of one response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub text: String,
    pub cookie: Option<String>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// Build the app with empty stores.
    ///
    /// # Panics
    ///
    /// Panics if the in-memory configuration fails to load.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn new() -> Self {
        let config = ApiConfig::from_lookup(|key| {
            (key == "SHOPFLOOR_STORE").then(|| "memory".to_owned())
        })
        .unwrap();
        let state = AppState::new(config, MemoryStore::new());
        Self {
            router: shopfloor_api::app(state, tower_sessions::MemoryStore::default()),
        }
    }

    /// Send one request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    #[allow(clippy::unwrap_used)]
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_owned);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            text,
            cookie,
        }
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> TestResponse {
        self.send(Method::GET, path, None, cookie).await
    }

    pub async fn post(&self, path: &str, body: &Value, cookie: Option<&str>) -> TestResponse {
        self.send(Method::POST, path, Some(body), cookie).await
    }

    pub async fn put(&self, path: &str, body: &Value, cookie: Option<&str>) -> TestResponse {
        self.send(Method::PUT, path, Some(body), cookie).await
    }

    pub async fn delete(&self, path: &str, cookie: Option<&str>) -> TestResponse {
        self.send(Method::DELETE, path, None, cookie).await
    }

    /// Sign up a user and return the logged-in session cookie.
    ///
    /// # Panics
    ///
    /// Panics if sign-up fails or sets no cookie.
    #[allow(clippy::unwrap_used)]
    pub async fn signup(&self, email: &str) -> String {
        let response = self
            .post(
                "/api/users",
                &serde_json::json!({ "email": email, "password": "correct-horse" }),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);
        response.cookie.unwrap()
    }

    /// Create a tag and return its id.
    ///
    /// # Panics
    ///
    /// Panics if the tag cannot be created.
    #[allow(clippy::unwrap_used)]
    pub async fn create_tag(&self, cookie: &str, name: &str) -> i64 {
        let response = self
            .post("/api/tags", &serde_json::json!({ "tag_name": name }), Some(cookie))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text);
        response.body["id"].as_i64().unwrap()
    }
}
