use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use kuching::application::ports::{PbxClient, PbxConfig, PbxError};
use kuching::infrastructure::pbx::HttpPbxClient;

const SESSION_COOKIE: &str = "session=abc123";

struct PbxServerState {
    logins: AtomicUsize,
    downloads: AtomicUsize,
    fail_login: bool,
    /// Scripted download responses, consumed front to back; when empty
    /// the server returns 200 with the default audio body.
    script: Mutex<VecDeque<(u16, Vec<u8>)>>,
}

async fn login_handler(State(state): State<Arc<PbxServerState>>) -> Response {
    state.logins.fetch_add(1, Ordering::SeqCst);
    if state.fail_login {
        return (StatusCode::UNAUTHORIZED, "bad credentials").into_response();
    }
    (
        [(SET_COOKIE, format!("{}; Path=/", SESSION_COOKIE))],
        "logged in",
    )
        .into_response()
}

async fn download_handler(
    State(state): State<Arc<PbxServerState>>,
    headers: HeaderMap,
) -> Response {
    state.downloads.fetch_add(1, Ordering::SeqCst);

    let authenticated = headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|c| c.contains(SESSION_COOKIE))
        .unwrap_or(false);
    if !authenticated {
        return (StatusCode::UNAUTHORIZED, "no session").into_response();
    }

    match state.script.lock().unwrap().pop_front() {
        Some((status, body)) => (StatusCode::from_u16(status).unwrap(), body).into_response(),
        None => (StatusCode::OK, b"default audio".to_vec()).into_response(),
    }
}

async fn status_handler(State(_state): State<Arc<PbxServerState>>) -> Response {
    (StatusCode::OK, "{\"status\":\"ok\"}").into_response()
}

async fn start_pbx_server(
    script: Vec<(u16, Vec<u8>)>,
    fail_login: bool,
) -> (String, Arc<PbxServerState>) {
    let state = Arc::new(PbxServerState {
        logins: AtomicUsize::new(0),
        downloads: AtomicUsize::new(0),
        fail_login,
        script: Mutex::new(script.into()),
    });

    let app = Router::new()
        .route("/api/login", post(login_handler))
        .route("/api/recordings", get(download_handler))
        .route("/api/status", get(status_handler))
        .with_state(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), state)
}

fn test_config(base_url: &str) -> PbxConfig {
    let port = base_url.rsplit(':').next().unwrap().parse().unwrap();
    PbxConfig {
        host: "127.0.0.1".to_string(),
        port,
        username: "admin".to_string(),
        password: "pbx-password".to_string(),
        verify_ssl: false,
    }
}

fn patient_client(base_url: &str) -> HttpPbxClient {
    // Hour-long timeouts so the only timers in play are the backoff
    // sleeps, which the paused clock skips over.
    HttpPbxClient::with_timeouts(Duration::from_secs(3600), Duration::from_secs(3600))
        .with_base_url(base_url.to_string())
}

#[tokio::test(start_paused = true)]
async fn given_recording_available_after_two_404s_then_third_attempt_succeeds() {
    let (base_url, state) = start_pbx_server(
        vec![
            (404, b"not found".to_vec()),
            (404, b"not found".to_vec()),
            (200, b"audio-bytes".to_vec()),
        ],
        false,
    )
    .await;

    let client = patient_client(&base_url);
    let started = tokio::time::Instant::now();

    let bytes = client
        .download_recording(&test_config(&base_url), "rec-001.wav")
        .await
        .expect("download should succeed on third attempt");

    let elapsed = started.elapsed();
    assert_eq!(&bytes[..], b"audio-bytes");
    assert_eq!(state.downloads.load(Ordering::SeqCst), 3);
    // Session established once and reused across 404 retries.
    assert_eq!(state.logins.load(Ordering::SeqCst), 1);
    // Backoff schedule: 5s after the first 404, 10s after the second.
    assert!(elapsed >= Duration::from_secs(15), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(30), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn given_recording_never_available_then_not_ready_after_three_attempts() {
    let (base_url, state) = start_pbx_server(
        vec![
            (404, b"not found".to_vec()),
            (404, b"not found".to_vec()),
            (404, b"not found".to_vec()),
        ],
        false,
    )
    .await;

    let client = patient_client(&base_url);
    let err = client
        .download_recording(&test_config(&base_url), "rec-002.wav")
        .await
        .unwrap_err();

    match err {
        PbxError::RecordingNotReady { filename, attempts } => {
            assert_eq!(filename, "rec-002.wav");
            assert_eq!(attempts, 3);
        }
        other => panic!("expected RecordingNotReady, got {:?}", other),
    }
    assert_eq!(state.downloads.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn given_expired_session_then_one_reauth_before_next_attempt() {
    let (base_url, state) = start_pbx_server(
        vec![(401, b"session expired".to_vec()), (200, b"audio".to_vec())],
        false,
    )
    .await;

    let client = patient_client(&base_url);
    let bytes = client
        .download_recording(&test_config(&base_url), "rec-003.wav")
        .await
        .expect("download should succeed after re-auth");

    assert_eq!(&bytes[..], b"audio");
    // One login for the initial session, exactly one more after the 401.
    assert_eq!(state.logins.load(Ordering::SeqCst), 2);
    // The 401 consumed one attempt; no extra downloads were spent.
    assert_eq!(state.downloads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn given_server_error_then_terminal_without_retry() {
    let (base_url, state) =
        start_pbx_server(vec![(500, b"internal error".to_vec())], false).await;

    let client = patient_client(&base_url);
    let err = client
        .download_recording(&test_config(&base_url), "rec-004.wav")
        .await
        .unwrap_err();

    match err {
        PbxError::Http { status, .. } => assert_eq!(status, 500),
        other => panic!("expected Http error, got {:?}", other),
    }
    assert_eq!(state.downloads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn given_json_error_envelope_with_200_then_surfaced_as_error() {
    let body = br#"{"response":"error","message":"file is still being written"}"#.to_vec();
    let (base_url, _state) = start_pbx_server(vec![(200, body)], false).await;

    let client = patient_client(&base_url);
    let err = client
        .download_recording(&test_config(&base_url), "rec-005.wav")
        .await
        .unwrap_err();

    match err {
        PbxError::Http { message, .. } => assert!(message.contains("still being written")),
        other => panic!("expected Http error, got {:?}", other),
    }
}

#[tokio::test]
async fn given_bad_credentials_then_auth_failed() {
    let (base_url, state) = start_pbx_server(vec![], true).await;

    let client = patient_client(&base_url);
    let err = client
        .download_recording(&test_config(&base_url), "rec-006.wav")
        .await
        .unwrap_err();

    assert!(matches!(err, PbxError::AuthFailed(_)));
    assert_eq!(state.downloads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn given_reachable_pbx_when_testing_connection_then_success_with_timing() {
    let (base_url, state) = start_pbx_server(vec![], false).await;

    let client = patient_client(&base_url);
    let result = client.test_connection(&test_config(&base_url)).await;

    assert!(result.success, "error: {:?}", result.error);
    assert!(result.error.is_none());
    assert_eq!(state.logins.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn given_unreachable_pbx_when_testing_connection_then_failure_reported() {
    // Bind a listener and drop it so the port is closed.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpPbxClient::with_timeouts(Duration::from_secs(2), Duration::from_secs(2))
        .with_base_url(format!("http://{}", addr));
    let result = client.test_connection(&test_config(&format!("http://{}", addr))).await;

    assert!(!result.success);
    assert!(result.error.is_some());
}
