//! Session endpoints: the operator's intents and views of the workflow.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use rationalizer_core::{
    result_tables, ArtifactKind, Industry, IntentOutcome, ResultTable, StatusEntry,
    WorkflowSnapshot,
};

use crate::metrics::INTENTS_IGNORED_TOTAL;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct IntentResponse {
    pub accepted: bool,
}

#[derive(Debug, Deserialize)]
pub struct SelectFileRequest {
    /// Path of the inventory file; null clears the selection.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct SelectIndustryRequest {
    /// Industry label (e.g. "Healthcare"); null clears the selection.
    #[serde(default)]
    pub industry: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    /// Return only entries with an id greater than this.
    #[serde(default)]
    pub since: u64,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub entries: Vec<StatusEntry>,
    pub last_id: u64,
}

#[derive(Debug, Serialize)]
pub struct TablesResponse {
    pub tables: Vec<ResultTable>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// 202 when the intent took effect, 409 with the reason when it was a no-op.
fn intent_response(
    intent: &str,
    outcome: IntentOutcome,
) -> Result<(StatusCode, Json<IntentResponse>), ApiError> {
    match outcome {
        IntentOutcome::Accepted => Ok((
            StatusCode::ACCEPTED,
            Json(IntentResponse { accepted: true }),
        )),
        IntentOutcome::Ignored(reason) => {
            tracing::debug!(intent, %reason, "Intent ignored");
            INTENTS_IGNORED_TOTAL.with_label_values(&[intent]).inc();
            Err((
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: reason.to_string(),
                }),
            ))
        }
    }
}

/// Get the full session snapshot.
pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<WorkflowSnapshot> {
    Json(state.orchestrator().snapshot().await)
}

/// Get status log entries, optionally only those after `since`.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> Json<StatusResponse> {
    let (entries, last_id) = state.orchestrator().status_since(query.since).await;
    Json(StatusResponse { entries, last_id })
}

/// Get the result tables currently visible to the operator.
pub async fn get_tables(State(state): State<Arc<AppState>>) -> Json<TablesResponse> {
    let snapshot = state.orchestrator().snapshot().await;
    Json(TablesResponse {
        tables: result_tables(&snapshot),
    })
}

/// Select (or clear) the inventory file.
pub async fn select_file(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectFileRequest>,
) -> impl IntoResponse {
    let outcome = state.orchestrator().select_file(request.path).await;
    intent_response("select_file", outcome)
}

/// Select (or clear) the industry lens.
pub async fn select_industry(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectIndustryRequest>,
) -> Result<(StatusCode, Json<IntentResponse>), ApiError> {
    let industry = match request.industry.as_deref() {
        Some(label) => Some(
            label
                .parse::<Industry>()
                .map_err(|e| bad_request(e.to_string()))?,
        ),
        None => None,
    };
    let outcome = state.orchestrator().select_industry(industry).await;
    intent_response("select_industry", outcome)
}

/// Start the taxonomy mapping stage.
pub async fn run_taxonomy(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let outcome = state.orchestrator().run_taxonomy().await;
    intent_response("run_taxonomy", outcome)
}

/// Start the Gartner mapping stage.
pub async fn run_gartner(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let outcome = state.orchestrator().run_gartner().await;
    intent_response("run_gartner", outcome)
}

/// Download a report artifact into the downloads directory.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<(StatusCode, Json<IntentResponse>), ApiError> {
    let kind: ArtifactKind = kind.parse().map_err(bad_request)?;
    let outcome = state.orchestrator().download(kind).await;
    intent_response("download", outcome)
}
