use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use serde_json::json;
use tokio::net::TcpListener;

use kuching::application::ports::{AnalysisError, CallAnalyzer, CallMetadata};
use kuching::domain::{
    CallDirection, CallDisposition, Sentiment, Transcript, Utterance,
};
use kuching::infrastructure::analysis::OpenAiAnalyzer;

struct LlmServerState {
    status: u16,
    content: String,
}

async fn completions_handler(State(state): State<Arc<LlmServerState>>) -> Response {
    if state.status != 200 {
        return (StatusCode::from_u16(state.status).unwrap(), "upstream error").into_response();
    }
    let body = json!({
        "choices": [
            { "message": { "role": "assistant", "content": state.content } }
        ]
    });
    (StatusCode::OK, axum::Json(body)).into_response()
}

async fn start_llm_server(status: u16, content: String) -> String {
    let state = Arc::new(LlmServerState { status, content });
    let app = Router::new()
        .route("/v1/chat/completions", post(completions_handler))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn analysis_content() -> String {
    json!({
        "summary": "Billing dispute resolved with a credit.",
        "sentiment": "negative",
        "sentiment_score": 0.3,
        "keywords": ["billing"],
        "topics": ["billing"],
        "action_items": ["Issue credit"],
        "questions": [],
        "objections": [],
        "escalation_risk": "medium",
        "escalation_reasons": [],
        "satisfaction_prediction": "neutral",
        "compliance_flags": [],
        "call_disposition": "resolved"
    })
    .to_string()
}

fn transcript() -> Transcript {
    let utterances = vec![
        Utterance {
            speaker: 0,
            text: "How can I help?".to_string(),
            start_sec: 0.0,
            end_sec: 6.0,
            confidence: 0.97,
        },
        Utterance {
            speaker: 1,
            text: "I was double charged.".to_string(),
            start_sec: 6.5,
            end_sec: 10.5,
            confidence: 0.93,
        },
    ];
    let speakers = Transcript::derive_speaker_stats(&utterances);
    Transcript {
        text: "How can I help? I was double charged.".to_string(),
        utterances,
        speakers,
        duration_seconds: 11.0,
    }
}

fn metadata() -> CallMetadata {
    CallMetadata {
        src: "15551230001".to_string(),
        dst: "2001".to_string(),
        direction: CallDirection::Inbound,
        disposition: CallDisposition::Answered,
        duration_seconds: 62,
    }
}

fn analyzer(base_url: String) -> OpenAiAnalyzer {
    OpenAiAnalyzer::with_client(reqwest::Client::new(), "sk-test".to_string(), Some(base_url))
}

#[tokio::test]
async fn given_raw_json_completion_then_validated_result_with_talk_ratios() {
    let base_url = start_llm_server(200, analysis_content()).await;

    let result = analyzer(base_url)
        .analyze(&transcript(), &metadata())
        .await
        .unwrap();

    assert_eq!(result.sentiment, Sentiment::Negative);
    assert_eq!(result.summary, "Billing dispute resolved with a credit.");

    // 6.0s and 4.0s of airtime over a 10.0s total.
    let ratios = result.talk_ratios.expect("two speakers give talk ratios");
    assert_eq!(ratios[0].speaker, 0);
    assert_eq!(ratios[0].percent, 60);
    assert_eq!(ratios[1].speaker, 1);
    assert_eq!(ratios[1].percent, 40);
}

#[tokio::test]
async fn given_fenced_completion_then_parsed_from_block() {
    let content = format!("Sure! Here it is:\n```json\n{}\n```", analysis_content());
    let base_url = start_llm_server(200, content).await;

    let result = analyzer(base_url)
        .analyze(&transcript(), &metadata())
        .await
        .unwrap();
    assert_eq!(result.sentiment, Sentiment::Negative);
}

#[tokio::test]
async fn given_prose_completion_then_parse_error() {
    let base_url = start_llm_server(200, "The call went fine, nothing to report.".to_string()).await;

    let err = analyzer(base_url)
        .analyze(&transcript(), &metadata())
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::Parse(_)));
}

#[tokio::test]
async fn given_upstream_error_then_api_error() {
    let base_url = start_llm_server(503, String::new()).await;

    let err = analyzer(base_url)
        .analyze(&transcript(), &metadata())
        .await
        .unwrap_err();
    match err {
        AnalysisError::Api(message) => assert!(message.contains("503")),
        other => panic!("expected Api error, got {:?}", other),
    }
}
