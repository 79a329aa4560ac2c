use async_trait::async_trait;

use crate::domain::{CallAnalysisResult, CallDirection, CallDisposition, Transcript};

/// Call facts embedded into the analysis prompt.
#[derive(Debug, Clone)]
pub struct CallMetadata {
    pub src: String,
    pub dst: String,
    pub direction: CallDirection,
    pub disposition: CallDisposition,
    pub duration_seconds: i64,
}

#[async_trait]
pub trait CallAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        transcript: &Transcript,
        metadata: &CallMetadata,
    ) -> Result<CallAnalysisResult, AnalysisError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The model response was not parseable JSON, directly or from a
    /// fenced block. Terminal for the current job attempt.
    #[error("analysis response is not valid JSON: {0}")]
    Parse(String),
    /// The parsed payload violated the response contract. The field name
    /// is recorded verbatim so schema drift is diagnosable.
    #[error("analysis field {field}: {reason}")]
    Validation { field: String, reason: String },
    #[error("analysis request failed: {0}")]
    Api(String),
    #[error("analysis request timed out")]
    Timeout,
}
