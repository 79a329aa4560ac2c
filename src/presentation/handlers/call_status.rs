use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::CallRecordId;
use crate::presentation::state::AppState;

use super::ErrorResponse;

#[derive(Serialize)]
pub struct CallStatusResponse {
    pub id: String,
    pub uniqueid: String,
    pub direction: String,
    pub disposition: String,
    pub processing_status: String,
    pub processing_error: Option<String>,
    pub recording_path: Option<String>,
    pub transcript_path: Option<String>,
    pub analysis_path: Option<String>,
    pub has_analysis: bool,
}

#[tracing::instrument(skip(state))]
pub async fn call_status_handler(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> impl IntoResponse {
    let uuid = match Uuid::parse_str(&call_id) {
        Ok(u) => u,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid call ID: {}", call_id),
                }),
            )
                .into_response();
        }
    };
    let id = CallRecordId::from_uuid(uuid);

    let record = match state.call_repository.get_by_id(id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Call not found: {}", call_id),
                }),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch call record");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to fetch call: {}", e),
                }),
            )
                .into_response();
        }
    };

    let has_analysis = state
        .analysis_repository
        .get_by_call_record(id)
        .await
        .map(|a| a.is_some())
        .unwrap_or(false);

    let response = CallStatusResponse {
        id: record.id.as_uuid().to_string(),
        uniqueid: record.uniqueid,
        direction: record.direction.as_str().to_string(),
        disposition: record.disposition.as_str().to_string(),
        processing_status: record.processing_status.as_str().to_string(),
        processing_error: record.processing_error,
        recording_path: record.recording_path,
        transcript_path: record.transcript_path,
        analysis_path: record.analysis_path,
        has_analysis,
    };
    (StatusCode::OK, Json(response)).into_response()
}
