use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use rationalizer_core::{Config, Industry};

use crate::metrics::encode_metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<Config> {
    Json(state.config().clone())
}

#[derive(Serialize)]
pub struct IndustriesResponse {
    pub industries: Vec<&'static str>,
}

/// Industry lenses the operator can choose from, in display order.
pub async fn list_industries() -> Json<IndustriesResponse> {
    Json(IndustriesResponse {
        industries: Industry::ALL.iter().map(|i| i.label()).collect(),
    })
}

pub async fn metrics() -> String {
    encode_metrics()
}
