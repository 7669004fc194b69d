//! Object-created notification endpoint.

use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use hlsforge_core::TriggerEvent;

use crate::state::AppState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Runs every eligible record of a notification.
///
/// Answers 200 when all processed records succeeded and 500 when any failed,
/// so the notifier redelivers the batch. A body that is not a notification
/// is rejected with 400.
pub async fn handle_events(State(state): State<Arc<AppState>>, body: Bytes) -> impl IntoResponse {
    let event = match std::str::from_utf8(&body)
        .map_err(|e| e.to_string())
        .and_then(|text| TriggerEvent::from_json(text).map_err(|e| e.to_string()))
    {
        Ok(event) => event,
        Err(error) => {
            warn!(%error, "Rejecting malformed notification");
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
        }
    };

    let report = state.adapter().handle(&event).await;
    let status = if report.all_succeeded() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(report)).into_response()
}
