use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use hlsforge_core::{Config, RenditionSpec};

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

/// Active rendition plan, in manifest order.
#[derive(Serialize)]
pub struct LadderResponse {
    pub segment_duration_secs: u32,
    pub tiers: Vec<RenditionSpec>,
}

pub async fn get_ladder(State(state): State<Arc<AppState>>) -> Json<LadderResponse> {
    let tiers = state.plan().tiers().to_vec();
    Json(LadderResponse {
        segment_duration_secs: tiers
            .first()
            .map(|t| t.segment_duration_secs)
            .unwrap_or_default(),
        tiers,
    })
}

pub async fn get_metrics() -> impl IntoResponse {
    match encode_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
