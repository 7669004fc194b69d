//! Common test utilities for router-level testing with mocks.
//!
//! This module provides a test fixture that builds the in-process router
//! with a mock encoder and in-memory storage injected, so notifications can
//! be driven end to end without FFmpeg or an object store.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use hlsforge_core::{
    testing::{MockEncoder, MockStorage},
    Config, TranscodeOrchestrator, TriggerAdapter,
};
use hlsforge_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use hlsforge_core::testing::fixtures;

/// Test fixture with controllable mocks.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_notification() {
///     let fixture = TestFixture::new().await;
///     fixture.storage.insert("media", "a/clip.mp4", b"x".to_vec()).await;
///
///     let event = fixtures::object_created_event("media", "a/clip.mp4", 1);
///     let response = fixture.post("/api/v1/events", serde_json::to_value(&event).unwrap()).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock encoder - inspect tier order, inject failures
    pub encoder: Arc<MockEncoder>,
    /// In-memory bucket contents
    pub storage: Arc<MockStorage>,
    /// Scratch space for runs
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_encoder(MockEncoder::new()).await
    }

    /// Create a test fixture around a configured mock encoder.
    pub async fn with_encoder(encoder: MockEncoder) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.transcode.scratch_dir = temp_dir.path().join("scratch");
        let plan = Arc::new(config.rendition_plan().expect("default plan is valid"));

        let encoder = Arc::new(encoder);
        let storage = Arc::new(MockStorage::new());
        let orchestrator = Arc::new(TranscodeOrchestrator::new(
            encoder.clone(),
            storage.clone(),
            Arc::clone(&plan),
            config.transcode.clone(),
        ));
        let adapter = Arc::new(TriggerAdapter::new(orchestrator));

        let state = Arc::new(AppState::new(config, plan, adapter));
        let router = create_router(state);

        Self {
            router,
            encoder,
            storage,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.post_raw(path, &serde_json::to_string(&body).unwrap())
            .await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}
