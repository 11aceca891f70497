//! Session API integration tests.
//!
//! Drive the workflow over HTTP against the mock mapping server on a paused
//! clock: upload -> industry -> taxonomy -> gartner -> downloads.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::TestFixture;
use rationalizer_core::testing::{MockOperation, RecordedCall};
use rationalizer_core::{ArtifactKind, Industry, StageKind, StagePhase};
use rationalizer_server::api::WsMessage;

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Select an inventory file and let its upload resolve.
async fn upload(fixture: &TestFixture) {
    let path = fixture.inventory_file("cmdb.xlsx");
    let response = fixture
        .post("/api/v1/session/file", json!({ "path": path }))
        .await;
    assert_status!(response, StatusCode::ACCEPTED);
    settle().await;
}

/// Upload, choose an industry and run taxonomy to completion.
async fn complete_taxonomy(fixture: &TestFixture) {
    upload(fixture).await;
    let response = fixture
        .post("/api/v1/session/industry", json!({ "industry": "Healthcare" }))
        .await;
    assert_status!(response, StatusCode::ACCEPTED);

    let response = fixture.post_empty("/api/v1/session/taxonomy").await;
    assert_status!(response, StatusCode::ACCEPTED);
    tokio::time::sleep(Duration::from_secs(41)).await;
}

fn messages(body: &Value) -> Vec<String> {
    body["entries"]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| e["message"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// Basic endpoints
// =============================================================================

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/health").await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "status", json!("ok"));
}

#[tokio::test]
async fn test_config_endpoint() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/config").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["backend"]["url"], "http://mapping.invalid");
    assert_eq!(response.body["workflow"]["taxonomy_duration_ms"], 40000);
    assert_eq!(response.body["workflow"]["gartner_duration_ms"], 25000);
}

#[tokio::test]
async fn test_industries() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/industries").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(
        response.body["industries"],
        json!(["Banking & FS", "Healthcare", "Retail", "Manufacturing"])
    );
}

#[tokio::test]
async fn test_initial_session() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/session").await;

    assert_status!(response, StatusCode::OK);
    let body = &response.body;
    assert!(body["session_id"].is_string());
    assert!(body["file"].is_null());
    assert!(body["industry"].is_null());
    assert_eq!(body["taxonomy"]["phase"], "idle");
    assert_eq!(body["taxonomy"]["progress"], 0);
    assert_eq!(body["gartner"]["completed"], false);
    assert_eq!(body["gates"]["can_run_taxonomy"], false);
    assert_eq!(body["status_log"], json!([]));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let (status, text) = fixture.get_text("/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("rationalizer_http_requests_total"));
}

// =============================================================================
// File and industry selection
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_select_file_uploads() {
    let fixture = TestFixture::new().await;
    upload(&fixture).await;

    let response = fixture.get("/api/v1/session").await;
    let body = &response.body;
    assert_eq!(body["file"]["name"], "cmdb.xlsx");
    assert_eq!(body["upload"]["in_flight"], false);
    assert_eq!(body["upload"]["revealed"], false);
    assert_eq!(
        fixture.backend.call_count(MockOperation::Upload).await,
        1
    );

    let status = fixture.get("/api/v1/session/status").await;
    assert_eq!(
        messages(&status.body),
        vec!["File selected: cmdb.xlsx", "File uploaded successfully"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_upload_table_appears_after_reveal_delay() {
    let fixture = TestFixture::new().await;
    upload(&fixture).await;

    let response = fixture.get("/api/v1/session/tables").await;
    assert_eq!(response.body["tables"], json!([]));

    tokio::time::sleep(Duration::from_secs(5)).await;

    let response = fixture.get("/api/v1/session/tables").await;
    let tables = response.body["tables"].as_array().unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0]["title"], "Upload summary");
    assert_eq!(
        tables[0]["headers"],
        json!(["Application Type", "Count", "Total Spend"])
    );
    assert_eq!(tables[0]["rows"][0], json!(["COTS", "42", "$1,250,000"]));
}

#[tokio::test(start_paused = true)]
async fn test_select_missing_file_keeps_previous() {
    let fixture = TestFixture::new().await;
    upload(&fixture).await;

    let response = fixture
        .post(
            "/api/v1/session/file",
            json!({ "path": fixture.temp_dir.path().join("missing.xlsx") }),
        )
        .await;
    assert_status!(response, StatusCode::ACCEPTED);

    let session = fixture.get("/api/v1/session").await;
    assert_eq!(session.body["file"]["name"], "cmdb.xlsx");
    let last = session.body["status_log"].as_array().unwrap().last().cloned();
    assert_eq!(last.unwrap()["severity"], "error");
}

#[tokio::test(start_paused = true)]
async fn test_clear_file() {
    let fixture = TestFixture::new().await;
    upload(&fixture).await;

    let response = fixture
        .post("/api/v1/session/file", json!({ "path": null }))
        .await;
    assert_status!(response, StatusCode::ACCEPTED);

    let session = fixture.get("/api/v1/session").await;
    assert!(session.body["file"].is_null());

    // Clearing again is a no-op.
    let response = fixture.post("/api/v1/session/file", json!({})).await;
    assert_status!(response, StatusCode::CONFLICT);
    assert_json_path!(response.body, "error", json!("nothing to change"));
}

#[tokio::test]
async fn test_select_industry() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/session/industry", json!({ "industry": "retail" }))
        .await;
    assert_status!(response, StatusCode::ACCEPTED);

    let session = fixture.get("/api/v1/session").await;
    assert_eq!(session.body["industry"], "Retail");

    let response = fixture
        .post("/api/v1/session/industry", json!({ "industry": "Retail" }))
        .await;
    assert_status!(response, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_select_unknown_industry() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/session/industry", json!({ "industry": "Aerospace" }))
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_json_path!(response.body, "error", json!("Unknown industry: Aerospace"));
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/session/industry", json!({ "industry": 42 }))
        .await;

    assert!(response.status.is_client_error());
}

// =============================================================================
// Stages
// =============================================================================

#[tokio::test]
async fn test_taxonomy_requires_file() {
    let fixture = TestFixture::new().await;

    let response = fixture.post_empty("/api/v1/session/taxonomy").await;

    assert_status!(response, StatusCode::CONFLICT);
    assert_json_path!(response.body, "error", json!("no inventory file selected"));
    assert_eq!(
        fixture.backend.call_count(MockOperation::MapTaxonomy).await,
        0
    );
}

#[tokio::test(start_paused = true)]
async fn test_taxonomy_requires_industry() {
    let fixture = TestFixture::new().await;
    upload(&fixture).await;

    let response = fixture.post_empty("/api/v1/session/taxonomy").await;

    assert_status!(response, StatusCode::CONFLICT);
    assert_json_path!(response.body, "error", json!("no industry selected"));
}

#[tokio::test(start_paused = true)]
async fn test_taxonomy_runs_to_completion() {
    let fixture = TestFixture::new().await;
    complete_taxonomy(&fixture).await;

    let session = fixture.get("/api/v1/session").await;
    let body = &session.body;
    assert_eq!(body["taxonomy"]["phase"], "done");
    assert_eq!(body["taxonomy"]["progress"], 100);
    assert_eq!(body["taxonomy"]["completed"], true);
    assert_eq!(body["gates"]["can_run_gartner"], true);
    assert_eq!(body["gates"]["can_download_ppt"], true);
    assert_eq!(body["gates"]["can_download_excel"], false);

    let tables = fixture.get("/api/v1/session/tables").await;
    let titles: Vec<&str> = tables.body["tables"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Upload summary", "Taxonomy mapping output"]);

    assert!(fixture
        .backend
        .calls()
        .await
        .contains(&RecordedCall::MapTaxonomy {
            industry: Industry::Healthcare
        }));
}

#[tokio::test(start_paused = true)]
async fn test_taxonomy_double_start_conflicts() {
    let fixture = TestFixture::new().await;
    upload(&fixture).await;
    fixture
        .post("/api/v1/session/industry", json!({ "industry": "Healthcare" }))
        .await;

    let first = fixture.post_empty("/api/v1/session/taxonomy").await;
    let second = fixture.post_empty("/api/v1/session/taxonomy").await;

    assert_status!(first, StatusCode::ACCEPTED);
    assert_status!(second, StatusCode::CONFLICT);
    assert_json_path!(second.body, "error", json!("taxonomy stage already running"));
}

#[tokio::test(start_paused = true)]
async fn test_gartner_requires_taxonomy() {
    let fixture = TestFixture::new().await;
    upload(&fixture).await;

    let response = fixture.post_empty("/api/v1/session/gartner").await;

    assert_status!(response, StatusCode::CONFLICT);
    assert_json_path!(response.body, "error", json!("taxonomy mapping not completed"));
}

#[tokio::test(start_paused = true)]
async fn test_gartner_runs_to_completion() {
    let fixture = TestFixture::new().await;
    complete_taxonomy(&fixture).await;

    let response = fixture.post_empty("/api/v1/session/gartner").await;
    assert_status!(response, StatusCode::ACCEPTED);
    tokio::time::sleep(Duration::from_secs(26)).await;

    let session = fixture.get("/api/v1/session").await;
    assert_eq!(session.body["gartner"]["phase"], "done");
    assert_eq!(session.body["gates"]["can_download_excel"], true);

    let tables = fixture.get("/api/v1/session/tables").await;
    let gartner = &tables.body["tables"][2];
    assert_eq!(gartner["title"], "Gartner best-in-class mapping");
    assert_eq!(gartner["rows"][0][2], "Ledger, PayHub");
}

#[tokio::test(start_paused = true)]
async fn test_taxonomy_failure_reported() {
    let fixture = TestFixture::new().await;
    fixture
        .backend
        .fail(MockOperation::MapTaxonomy, "mapping crashed")
        .await;
    complete_taxonomy(&fixture).await;

    let session = fixture.get("/api/v1/session").await;
    assert_eq!(session.body["taxonomy"]["phase"], "failed");
    assert_eq!(session.body["taxonomy"]["progress"], 0);
    assert_eq!(session.body["gates"]["can_run_gartner"], false);

    let status = fixture.get("/api/v1/session/status").await;
    assert_eq!(messages(&status.body).last().unwrap(), "mapping crashed");
}

// =============================================================================
// Status log
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_status_since() {
    let fixture = TestFixture::new().await;
    upload(&fixture).await;

    let all = fixture.get("/api/v1/session/status").await;
    assert_eq!(all.body["last_id"], 2);

    fixture
        .post("/api/v1/session/industry", json!({ "industry": "Healthcare" }))
        .await;

    let newer = fixture.get("/api/v1/session/status?since=2").await;
    assert_eq!(messages(&newer.body), vec!["Industry selected: Healthcare"]);
    assert_eq!(newer.body["last_id"], 3);
}

// =============================================================================
// Downloads
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_download_before_completion_conflicts() {
    let fixture = TestFixture::new().await;

    let response = fixture.post_empty("/api/v1/session/download/ppt").await;

    assert_status!(response, StatusCode::CONFLICT);
    assert!(fixture.sink.saved().await.is_empty());
}

#[tokio::test]
async fn test_download_unknown_kind() {
    let fixture = TestFixture::new().await;

    let response = fixture.post_empty("/api/v1/session/download/pdf").await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_json_path!(response.body, "error", json!("unknown artifact kind: pdf"));
}

#[tokio::test(start_paused = true)]
async fn test_download_ppt() {
    let fixture = TestFixture::new().await;
    fixture
        .backend
        .set_artifact(ArtifactKind::Ppt, b"deck".to_vec())
        .await;
    complete_taxonomy(&fixture).await;

    let response = fixture.post_empty("/api/v1/session/download/ppt").await;
    assert_status!(response, StatusCode::ACCEPTED);
    settle().await;

    let saved = fixture.sink.saved().await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].kind, ArtifactKind::Ppt);
    assert_eq!(saved[0].bytes, b"deck".to_vec());

    let session = fixture.get("/api/v1/session").await;
    assert_eq!(session.body["ppt_downloaded"], true);
    let status = fixture.get("/api/v1/session/status").await;
    assert_eq!(messages(&status.body).last().unwrap(), "PPT downloaded");
}

// =============================================================================
// Live updates
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_updates_reach_broadcaster() {
    let fixture = TestFixture::new().await;
    let mut rx = fixture.ws_broadcaster.subscribe();

    complete_taxonomy(&fixture).await;

    let mut received = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        received.push(msg);
    }

    assert!(received.iter().any(|m| matches!(
        m,
        WsMessage::Progress {
            stage: StageKind::Taxonomy,
            ..
        }
    )));
    assert!(received.contains(&WsMessage::StageSettled {
        stage: StageKind::Taxonomy,
        phase: StagePhase::Done,
        completed: true,
    }));
    assert!(received.contains(&WsMessage::UploadRevealed));
}
