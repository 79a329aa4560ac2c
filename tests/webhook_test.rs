mod helpers;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use kuching::application::ports::{CallRepository, JobQueue};
use kuching::application::services::IngestService;
use kuching::domain::{JobStatus, ProcessingStatus, TenantId};
use kuching::infrastructure::persistence::{
    MemoryAnalysisRepository, MemoryCallRepository, MemoryConnectionRepository, MemoryJobQueue,
};
use kuching::presentation::handlers::WEBHOOK_SECRET_HEADER;
use kuching::presentation::{create_router, AppState};

use helpers::{cdr_body, pbx_connection, TEST_WEBHOOK_SECRET};

struct TestApp {
    router: axum::Router,
    call_repository: Arc<MemoryCallRepository>,
    job_queue: Arc<MemoryJobQueue>,
    connection_id: uuid::Uuid,
    tenant_id: TenantId,
}

fn test_app() -> TestApp {
    let tenant_id = TenantId::new();
    let connection = pbx_connection(tenant_id, "unused-envelope".to_string());
    let connection_id = connection.id.as_uuid();

    let connection_repository = Arc::new(MemoryConnectionRepository::new());
    connection_repository.insert(connection);

    let call_repository = Arc::new(MemoryCallRepository::new());
    let analysis_repository = Arc::new(MemoryAnalysisRepository::new());
    let job_queue = Arc::new(MemoryJobQueue::new());

    let ingest_service = Arc::new(IngestService::new(
        connection_repository,
        call_repository.clone(),
        job_queue.clone(),
    ));

    let state = AppState {
        ingest_service,
        call_repository: call_repository.clone(),
        analysis_repository,
        job_queue: job_queue.clone(),
    };

    TestApp {
        router: create_router(state),
        call_repository,
        job_queue,
        connection_id,
        tenant_id,
    }
}

fn webhook_request(
    connection_id: uuid::Uuid,
    secret: &str,
    body: &serde_json::Value,
) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/v1/webhooks/{}", connection_id))
        .header("content-type", "application/json")
        .header(WEBHOOK_SECRET_HEADER, secret)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn given_cdr_with_recording_then_call_record_and_job_created() {
    let app = test_app();
    let body = cdr_body("abc123", Some("auto-1730644867-15551230001-2001.wav"));

    let response = app
        .router
        .clone()
        .oneshot(webhook_request(app.connection_id, TEST_WEBHOOK_SECRET, &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["duplicate"], false);
    assert!(json["job_id"].is_string());

    let record = app
        .call_repository
        .find_by_uniqueid(app.tenant_id, "abc123")
        .await
        .unwrap()
        .expect("call record created");
    assert_eq!(record.processing_status, ProcessingStatus::Pending);
    assert_eq!(
        record.recording_filename.as_deref(),
        Some("auto-1730644867-15551230001-2001.wav")
    );

    let pending = app.job_queue.list_by_status(JobStatus::Pending).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].attempts, 0);
    assert_eq!(pending[0].call_record_id, record.id);
}

#[tokio::test]
async fn given_duplicate_delivery_then_same_record_and_no_second_job() {
    let app = test_app();
    let body = cdr_body("abc123", Some("rec.wav"));

    let first = app
        .router
        .clone()
        .oneshot(webhook_request(app.connection_id, TEST_WEBHOOK_SECRET, &body))
        .await
        .unwrap();
    let first_json = response_json(first).await;

    let second = app
        .router
        .clone()
        .oneshot(webhook_request(app.connection_id, TEST_WEBHOOK_SECRET, &body))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second_json = response_json(second).await;

    assert_eq!(second_json["duplicate"], true);
    assert_eq!(second_json["call_record_id"], first_json["call_record_id"]);

    let pending = app.job_queue.list_by_status(JobStatus::Pending).await.unwrap();
    assert_eq!(pending.len(), 1, "duplicate must not enqueue a second job");
}

#[tokio::test]
async fn given_cdr_without_recording_then_no_job_enqueued() {
    let app = test_app();
    let body = cdr_body("no-recording-1", None);

    let response = app
        .router
        .clone()
        .oneshot(webhook_request(app.connection_id, TEST_WEBHOOK_SECRET, &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert!(json["job_id"].is_null());

    let record = app
        .call_repository
        .find_by_uniqueid(app.tenant_id, "no-recording-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.processing_status, ProcessingStatus::Completed);

    let pending = app.job_queue.list_by_status(JobStatus::Pending).await.unwrap();
    assert!(pending.is_empty());
}

#[tokio::test]
async fn given_wrong_secret_then_unauthorized() {
    let app = test_app();
    let body = cdr_body("abc123", Some("rec.wav"));

    let response = app
        .router
        .clone()
        .oneshot(webhook_request(app.connection_id, "wrong-secret", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn given_unknown_connection_then_not_found() {
    let app = test_app();
    let body = cdr_body("abc123", Some("rec.wav"));

    let response = app
        .router
        .clone()
        .oneshot(webhook_request(uuid::Uuid::new_v4(), TEST_WEBHOOK_SECRET, &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn given_invalid_disposition_then_bad_request() {
    let app = test_app();
    let mut body = cdr_body("abc123", Some("rec.wav"));
    body["disposition"] = serde_json::json!("RINGING");

    let response = app
        .router
        .clone()
        .oneshot(webhook_request(app.connection_id, TEST_WEBHOOK_SECRET, &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn given_ingested_call_then_status_endpoints_report_it() {
    let app = test_app();
    let body = cdr_body("status-1", Some("rec.wav"));

    let response = app
        .router
        .clone()
        .oneshot(webhook_request(app.connection_id, TEST_WEBHOOK_SECRET, &body))
        .await
        .unwrap();
    let json = response_json(response).await;
    let call_id = json["call_record_id"].as_str().unwrap().to_string();
    let job_id = json["job_id"].as_str().unwrap().to_string();

    let job_response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/jobs/{}", job_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(job_response.status(), StatusCode::OK);
    let job_json = response_json(job_response).await;
    assert_eq!(job_json["status"], "pending");
    assert_eq!(job_json["attempts"], 0);
    assert_eq!(job_json["call_record_id"], call_id);

    let call_response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/calls/{}", call_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(call_response.status(), StatusCode::OK);
    let call_json = response_json(call_response).await;
    assert_eq!(call_json["processing_status"], "pending");
    assert_eq!(call_json["uniqueid"], "status-1");
    assert_eq!(call_json["has_analysis"], false);
}

#[tokio::test]
async fn given_unknown_job_then_status_endpoint_404s() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/jobs/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
