use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::application::ports::{AnalysisError, CallAnalyzer, CallMetadata};
use crate::domain::{
    CallAnalysisResult, EscalationRisk, SatisfactionPrediction, Sentiment, SpeakerStats,
    SpeakerTalkRatio, Transcript,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

const SYSTEM_PROMPT: &str = "You are a call-center quality analyst. You receive one call \
transcript with metadata and return a single raw JSON object, with no markdown fences and no \
prose around it.";

const REQUIRED_FIELDS: [&str; 13] = [
    "summary",
    "sentiment",
    "sentiment_score",
    "keywords",
    "topics",
    "action_items",
    "questions",
    "objections",
    "escalation_risk",
    "escalation_reasons",
    "satisfaction_prediction",
    "compliance_flags",
    "call_disposition",
];

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

/// LLM call analysis over the chat-completions API. The prompt contract
/// is fixed; the response is validated field by field before anything
/// downstream sees it.
pub struct OpenAiAnalyzer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiAnalyzer {
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

    fn build_prompt(transcript: &Transcript, metadata: &CallMetadata) -> String {
        let mut lines = String::new();
        for u in &transcript.utterances {
            lines.push_str(&format!("Speaker {}: {}\n", u.speaker, u.text));
        }
        if lines.is_empty() {
            lines = transcript.text.clone();
        }

        format!(
            "Analyze this {} phone call.\n\
             Caller: {}\n\
             Callee: {}\n\
             Disposition: {}\n\
             Duration: {} seconds\n\n\
             Transcript:\n{}\n\n\
             Return one raw JSON object with exactly these fields:\n\
             summary (string), sentiment (positive|negative|neutral|mixed), \
             sentiment_score (number 0.0-1.0), keywords (string array), \
             topics (string array), action_items (string array), \
             questions (string array), objections (string array), \
             escalation_risk (low|medium|high), escalation_reasons (string array), \
             satisfaction_prediction (satisfied|neutral|dissatisfied), \
             compliance_flags (string array), call_disposition (string).",
            metadata.direction,
            metadata.src,
            metadata.dst,
            metadata.disposition,
            metadata.duration_seconds,
            lines
        )
    }
}

#[async_trait]
impl CallAnalyzer for OpenAiAnalyzer {
    async fn analyze(
        &self,
        transcript: &Transcript,
        metadata: &CallMetadata,
    ) -> Result<CallAnalysisResult, AnalysisError> {
        let prompt = Self::build_prompt(transcript, metadata);

        let body = json!({
            "model": self.model,
            "temperature": 0.2,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::Timeout
                } else {
                    AnalysisError::Api(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Api(format!("status {}: {}", status, text)));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Api(format!("malformed completion response: {}", e)))?;
        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| AnalysisError::Api("completion carried no choices".to_string()))?;

        let mut result = parse_analysis_payload(content)?;
        result.talk_ratios = compute_talk_ratios(&transcript.speakers);

        tracing::info!(
            sentiment = %result.sentiment,
            escalation_risk = %result.escalation_risk,
            keywords = result.keywords.len(),
            "Call analysis completed"
        );

        Ok(result)
    }
}

/// Parse the model output into a validated analysis. Tries the raw text
/// as JSON first, then the contents of a fenced ```json block.
pub fn parse_analysis_payload(raw: &str) -> Result<CallAnalysisResult, AnalysisError> {
    let value: Value = match serde_json::from_str(raw.trim()) {
        Ok(v) => v,
        Err(first_err) => match extract_fenced_json(raw) {
            Some(inner) => serde_json::from_str(inner)
                .map_err(|e| AnalysisError::Parse(format!("fenced block: {}", e)))?,
            None => return Err(AnalysisError::Parse(first_err.to_string())),
        },
    };

    validate_analysis(&value)
}

fn extract_fenced_json(raw: &str) -> Option<&str> {
    let start = match raw.find("```json") {
        Some(i) => i + "```json".len(),
        None => raw.find("```")? + "```".len(),
    };
    let rest = &raw[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

fn validate_analysis(value: &Value) -> Result<CallAnalysisResult, AnalysisError> {
    let obj = value
        .as_object()
        .ok_or_else(|| AnalysisError::Parse("response is not a JSON object".to_string()))?;

    for field in REQUIRED_FIELDS {
        if !obj.contains_key(field) {
            return Err(AnalysisError::Validation {
                field: field.to_string(),
                reason: "missing".to_string(),
            });
        }
    }

    let summary = string_field(obj, "summary")?;
    let call_disposition = string_field(obj, "call_disposition")?;

    let sentiment = Sentiment::from_str(&string_field(obj, "sentiment")?).map_err(|e| {
        AnalysisError::Validation {
            field: "sentiment".to_string(),
            reason: e,
        }
    })?;
    let escalation_risk =
        EscalationRisk::from_str(&string_field(obj, "escalation_risk")?).map_err(|e| {
            AnalysisError::Validation {
                field: "escalation_risk".to_string(),
                reason: e,
            }
        })?;
    let satisfaction_prediction =
        SatisfactionPrediction::from_str(&string_field(obj, "satisfaction_prediction")?).map_err(
            |e| AnalysisError::Validation {
                field: "satisfaction_prediction".to_string(),
                reason: e,
            },
        )?;

    let sentiment_score = obj
        .get("sentiment_score")
        .and_then(Value::as_f64)
        .ok_or_else(|| AnalysisError::Validation {
            field: "sentiment_score".to_string(),
            reason: "not a number".to_string(),
        })?;
    if !(0.0..=1.0).contains(&sentiment_score) {
        return Err(AnalysisError::Validation {
            field: "sentiment_score".to_string(),
            reason: format!("{} is outside [0.0, 1.0]", sentiment_score),
        });
    }

    let keywords = string_array_field(obj, "keywords")?;
    let topics = string_array_field(obj, "topics")?;
    let action_items = string_array_field(obj, "action_items")?;
    let questions = string_array_field(obj, "questions")?;
    let objections = string_array_field(obj, "objections")?;
    let escalation_reasons = string_array_field(obj, "escalation_reasons")?;
    let compliance_flags = string_array_field(obj, "compliance_flags")?;

    Ok(CallAnalysisResult {
        summary,
        sentiment,
        sentiment_score,
        keywords,
        topics,
        action_items,
        questions,
        objections,
        escalation_risk,
        escalation_reasons,
        satisfaction_prediction,
        compliance_flags,
        call_disposition,
        talk_ratios: None,
    })
}

fn string_field(
    obj: &serde_json::Map<String, Value>,
    field: &str,
) -> Result<String, AnalysisError> {
    obj.get(field)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| AnalysisError::Validation {
            field: field.to_string(),
            reason: "not a string".to_string(),
        })
}

fn string_array_field(
    obj: &serde_json::Map<String, Value>,
    field: &str,
) -> Result<Vec<String>, AnalysisError> {
    let items = obj
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| AnalysisError::Validation {
            field: field.to_string(),
            reason: "not an array".to_string(),
        })?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(String::from)
                .ok_or_else(|| AnalysisError::Validation {
                    field: field.to_string(),
                    reason: "array element is not a string".to_string(),
                })
        })
        .collect()
}

/// Talk share of the two highest-airtime speakers, as whole percentages
/// of total talk time. `None` with fewer than two speakers.
pub fn compute_talk_ratios(speakers: &[SpeakerStats]) -> Option<Vec<SpeakerTalkRatio>> {
    if speakers.len() < 2 {
        return None;
    }

    let total: f64 = speakers.iter().map(|s| s.talk_seconds).sum();
    if total <= 0.0 {
        return None;
    }

    // Speaker stats arrive sorted by talk time descending.
    Some(
        speakers
            .iter()
            .take(2)
            .map(|s| SpeakerTalkRatio {
                speaker: s.speaker,
                percent: (s.talk_seconds / total * 100.0).round() as u32,
            })
            .collect(),
    )
}
