//! Server test utilities.

use super::store::TestStore;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use isoview_core::config::AppConfig;
use isoview_server::{AppState, create_router};
use isoview_store::TranscriptStore;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    pub store: TestStore,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a test server over a freshly seeded SQLite database.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let store = TestStore::new().await;
        let mut config = AppConfig::for_testing();
        modifier(&mut config);

        let state = AppState::new(config, store.store())
            .await
            .expect("Failed to build application state");
        let router = create_router(state.clone());

        Self {
            router,
            state,
            store,
        }
    }

    /// Create a test server over `wrapped`, which must front `store`.
    pub async fn wrapping(store: TestStore, wrapped: Arc<dyn TranscriptStore>) -> Self {
        let state = AppState::new(AppConfig::for_testing(), wrapped)
            .await
            .expect("Failed to build application state");
        let router = create_router(state.clone());

        Self {
            router,
            state,
            store,
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        json_request(&self.router, "GET", uri).await
    }

    pub async fn post(&self, uri: &str) -> (StatusCode, Value) {
        json_request(&self.router, "POST", uri).await
    }
}

/// Send a request without a body and decode the JSON response.
#[allow(dead_code)]
pub async fn json_request(router: &axum::Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// Send a request and return the raw body as text.
#[allow(dead_code)]
pub async fn text_request(router: &axum::Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8_lossy(&body_bytes).into_owned())
}
