//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock mapping server and a recording artifact sink, so the whole
//! workflow can be driven over HTTP without external infrastructure.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use rationalizer_core::{
    testing::{MockArtifactSink, MockBackend},
    ArtifactSink, BackendConfig, Config, DownloadConfig, MappingBackend, ServerConfig,
    WorkflowConfig, WorkflowOrchestrator, WorkflowUpdate, WorkflowUpdateCallback,
};
use rationalizer_server::api::WsBroadcaster;
use rationalizer_server::state::AppState;

/// Re-export fixtures for test convenience
pub use rationalizer_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test(start_paused = true)]
/// async fn test_select_industry() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/session/industry", json!({
///         "industry": "Retail"
///     })).await;
///
///     assert_eq!(response.status, StatusCode::ACCEPTED);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock mapping server, pre-loaded with fixture summaries
    pub backend: Arc<MockBackend>,
    /// Recording sink for downloaded reports
    pub sink: Arc<MockArtifactSink>,
    /// Broadcaster wired to the orchestrator's update callback
    pub ws_broadcaster: WsBroadcaster,
    /// Temporary directory holding inventory files
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default workflow timings.
    pub async fn new() -> Self {
        Self::with_workflow(WorkflowConfig::default()).await
    }

    /// Create a test fixture with custom workflow timings.
    pub async fn with_workflow(workflow: WorkflowConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let backend = Arc::new(MockBackend::new());
        backend.set_upload_summary(fixtures::upload_summary()).await;
        backend.set_taxonomy_summary(fixtures::taxonomy_summary()).await;
        backend.set_gartner_summary(fixtures::gartner_summary()).await;
        let sink = Arc::new(MockArtifactSink::new());

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
                ui_dir: None,
            },
            backend: BackendConfig {
                url: "http://mapping.invalid".to_string(),
                timeout_secs: None,
            },
            workflow: workflow.clone(),
            downloads: DownloadConfig {
                output_dir: temp_dir.path().join("downloads"),
                ..Default::default()
            },
        };

        let ws_broadcaster = WsBroadcaster::default();
        let broadcaster_for_callback = ws_broadcaster.clone();
        let callback: WorkflowUpdateCallback = Arc::new(move |update: WorkflowUpdate| {
            broadcaster_for_callback.workflow_update(update);
        });

        let orchestrator = WorkflowOrchestrator::new(
            workflow,
            Arc::clone(&backend) as Arc<dyn MappingBackend>,
            Arc::clone(&sink) as Arc<dyn ArtifactSink>,
        )
        .with_update_callback(callback);

        let state = Arc::new(AppState::new(
            config,
            Arc::new(orchestrator),
            ws_broadcaster.clone(),
        ));

        let router = rationalizer_server::api::create_router(state);

        Self {
            router,
            backend,
            sink,
            ws_broadcaster,
            temp_dir,
        }
    }

    /// Write an inventory file into the fixture's temp dir.
    pub fn inventory_file(&self, name: &str) -> PathBuf {
        fixtures::inventory_file(self.temp_dir.path(), name)
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a GET request and return the raw body as text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

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

        (status, String::from_utf8_lossy(&body_bytes).into_owned())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

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

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
