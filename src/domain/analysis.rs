use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CallRecordId, TenantId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Mixed,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Mixed => "mixed",
        }
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            "mixed" => Ok(Sentiment::Mixed),
            _ => Err(format!("Invalid sentiment: {}", s)),
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationRisk {
    Low,
    Medium,
    High,
}

impl EscalationRisk {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationRisk::Low => "low",
            EscalationRisk::Medium => "medium",
            EscalationRisk::High => "high",
        }
    }
}

impl FromStr for EscalationRisk {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(EscalationRisk::Low),
            "medium" => Ok(EscalationRisk::Medium),
            "high" => Ok(EscalationRisk::High),
            _ => Err(format!("Invalid escalation risk: {}", s)),
        }
    }
}

impl fmt::Display for EscalationRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SatisfactionPrediction {
    Satisfied,
    Neutral,
    Dissatisfied,
}

impl SatisfactionPrediction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SatisfactionPrediction::Satisfied => "satisfied",
            SatisfactionPrediction::Neutral => "neutral",
            SatisfactionPrediction::Dissatisfied => "dissatisfied",
        }
    }
}

impl FromStr for SatisfactionPrediction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "satisfied" => Ok(SatisfactionPrediction::Satisfied),
            "neutral" => Ok(SatisfactionPrediction::Neutral),
            "dissatisfied" => Ok(SatisfactionPrediction::Dissatisfied),
            _ => Err(format!("Invalid satisfaction prediction: {}", s)),
        }
    }
}

impl fmt::Display for SatisfactionPrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Share of total talk time for one diarized speaker, whole percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerTalkRatio {
    pub speaker: u32,
    pub percent: u32,
}

/// Validated output of the analysis client. Field set and enum domains
/// are enforced at the parse boundary, so downstream code never sees a
/// partially-populated analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallAnalysisResult {
    pub summary: String,
    pub sentiment: Sentiment,
    /// In `[0.0, 1.0]`.
    pub sentiment_score: f64,
    pub keywords: Vec<String>,
    pub topics: Vec<String>,
    pub action_items: Vec<String>,
    pub questions: Vec<String>,
    pub objections: Vec<String>,
    pub escalation_risk: EscalationRisk,
    pub escalation_reasons: Vec<String>,
    pub satisfaction_prediction: SatisfactionPrediction,
    pub compliance_flags: Vec<String>,
    pub call_disposition: String,
    /// Talk share of the two highest-airtime speakers; absent when the
    /// transcript had fewer than two speakers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub talk_ratios: Option<Vec<SpeakerTalkRatio>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallAnalysisId(Uuid);

impl CallAnalysisId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CallAnalysisId {
    fn default() -> Self {
        Self::new()
    }
}

/// At most one per call record; written once by the pipeline and never
/// updated afterward.
#[derive(Debug, Clone)]
pub struct CallAnalysis {
    pub id: CallAnalysisId,
    pub tenant_id: TenantId,
    pub call_record_id: CallRecordId,
    pub result: CallAnalysisResult,
    pub created_at: DateTime<Utc>,
}

impl CallAnalysis {
    pub fn new(tenant_id: TenantId, call_record_id: CallRecordId, result: CallAnalysisResult) -> Self {
        Self {
            id: CallAnalysisId::new(),
            tenant_id,
            call_record_id,
            result,
            created_at: Utc::now(),
        }
    }
}
