use async_trait::async_trait;

use crate::domain::Transcript;

/// Speech-to-text with speaker diarization. No internal retry: a failed
/// call fails the current job attempt and the queue decides on retry.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<Transcript, TranscriptionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("invalid transcription credentials")]
    InvalidCredentials,
    #[error("insufficient transcription account balance")]
    InsufficientBalance,
    #[error("audio payload too large")]
    PayloadTooLarge,
    #[error("transcription request timed out")]
    Timeout,
    #[error("provider error: {0}")]
    Provider(String),
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}
