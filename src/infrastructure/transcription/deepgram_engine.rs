use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::application::ports::{Transcriber, TranscriptionError};
use crate::domain::{Transcript, Utterance};

const DEFAULT_BASE_URL: &str = "https://api.deepgram.com";
const DEFAULT_MODEL: &str = "nova-2";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Deserialize, Default)]
struct ListenResponse {
    #[serde(default)]
    metadata: ListenMetadata,
    #[serde(default)]
    results: ListenResults,
}

#[derive(Deserialize, Default)]
struct ListenMetadata {
    #[serde(default)]
    duration: f64,
}

#[derive(Deserialize, Default)]
struct ListenResults {
    #[serde(default)]
    channels: Vec<ListenChannel>,
    #[serde(default)]
    utterances: Vec<ListenUtterance>,
}

#[derive(Deserialize, Default)]
struct ListenChannel {
    #[serde(default)]
    alternatives: Vec<ListenAlternative>,
}

#[derive(Deserialize, Default)]
struct ListenAlternative {
    #[serde(default)]
    transcript: String,
}

#[derive(Deserialize)]
struct ListenUtterance {
    #[serde(default)]
    speaker: u32,
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    start: f64,
    #[serde(default)]
    end: f64,
    #[serde(default)]
    confidence: f64,
}

/// Deepgram speech-to-text with speaker diarization. Speaker stats are
/// derived locally from the utterance list; the provider does not return
/// them.
pub struct DeepgramTranscriber {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl DeepgramTranscriber {
    pub fn new(api_key: String, base_url: Option<String>, model: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    /// Construct with a caller-supplied HTTP client, e.g. for tests.
    pub fn with_client(client: reqwest::Client, api_key: String, base_url: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    fn listen_url(&self) -> String {
        format!(
            "{}/v1/listen?model={}&diarize=true&punctuate=true&utterances=true",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl Transcriber for DeepgramTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<Transcript, TranscriptionError> {
        tracing::debug!(bytes = audio.len(), model = %self.model, "Submitting audio for transcription");

        let auth = HeaderValue::from_str(&format!("Token {}", self.api_key))
            .map_err(|e| TranscriptionError::Provider(format!("invalid API key: {}", e)))?;

        let response = self
            .client
            .post(self.listen_url())
            .header(AUTHORIZATION, auth)
            .header(CONTENT_TYPE, HeaderValue::from_static("audio/wav"))
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TranscriptionError::Timeout
                } else {
                    TranscriptionError::Provider(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    TranscriptionError::InvalidCredentials
                }
                StatusCode::PAYMENT_REQUIRED => TranscriptionError::InsufficientBalance,
                StatusCode::PAYLOAD_TOO_LARGE => TranscriptionError::PayloadTooLarge,
                _ => TranscriptionError::Provider(format!("status {}: {}", status, body)),
            });
        }

        let parsed: ListenResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::InvalidResponse(e.to_string()))?;

        let utterances: Vec<Utterance> = parsed
            .results
            .utterances
            .into_iter()
            .map(|u| Utterance {
                speaker: u.speaker,
                text: u.transcript,
                start_sec: u.start,
                end_sec: u.end,
                confidence: u.confidence,
            })
            .collect();

        // Full transcript from the first channel; fall back to joining
        // utterances when the provider omits channel output.
        let text = parsed
            .results
            .channels
            .first()
            .and_then(|c| c.alternatives.first())
            .map(|a| a.transcript.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| {
                utterances
                    .iter()
                    .map(|u| u.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            });

        let speakers = Transcript::derive_speaker_stats(&utterances);

        tracing::info!(
            chars = text.len(),
            utterances = utterances.len(),
            speakers = speakers.len(),
            "Transcription completed"
        );

        Ok(Transcript {
            text,
            utterances,
            speakers,
            duration_seconds: parsed.metadata.duration,
        })
    }
}
