use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::application::services::{CdrPayload, IngestError};
use crate::domain::ConnectionId;
use crate::presentation::state::AppState;

use super::ErrorResponse;

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

#[derive(Serialize)]
pub struct WebhookResponse {
    pub call_record_id: String,
    pub duplicate: bool,
    pub job_id: Option<String>,
}

#[tracing::instrument(skip(state, headers, payload))]
pub async fn webhook_handler(
    State(state): State<AppState>,
    Path(connection_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<CdrPayload>,
) -> impl IntoResponse {
    let uuid = match Uuid::parse_str(&connection_id) {
        Ok(u) => u,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid connection ID: {}", connection_id),
                }),
            )
                .into_response();
        }
    };

    let secret = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    match state
        .ingest_service
        .ingest(ConnectionId::from_uuid(uuid), secret, payload)
        .await
    {
        Ok(outcome) => {
            let response = WebhookResponse {
                call_record_id: outcome.call_record_id.as_uuid().to_string(),
                duplicate: outcome.duplicate,
                job_id: outcome.job_id.map(|id| id.as_uuid().to_string()),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(IngestError::UnknownConnection) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Unknown connection".to_string(),
            }),
        )
            .into_response(),
        Err(IngestError::InvalidSecret) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Invalid webhook secret".to_string(),
            }),
        )
            .into_response(),
        Err(IngestError::InvalidPayload(reason)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Invalid CDR payload: {}", reason),
            }),
        )
            .into_response(),
        Err(e @ IngestError::Repository(_)) => {
            tracing::error!(error = %e, "Webhook ingestion failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Ingestion failed: {}", e),
                }),
            )
                .into_response()
        }
    }
}
