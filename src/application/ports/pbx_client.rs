use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;

/// Everything the client needs to reach one PBX. Built by the pipeline
/// from a `PbxConnection` after decrypting the password; the plaintext
/// never leaves this transient value.
#[derive(Debug, Clone)]
pub struct PbxConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// PBX appliances usually present self-signed certificates; strict
    /// verification is opt-in.
    pub verify_ssl: bool,
}

impl PbxConfig {
    pub fn base_url(&self) -> String {
        format!("https://{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionTestResult {
    pub success: bool,
    pub message: String,
    pub error: Option<String>,
    pub response_time_ms: u64,
}

/// Operator-facing classification of connectivity-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    Timeout,
    Refused,
    Unreachable,
    Reset,
    CertExpired,
    SelfSigned,
    Other,
}

impl NetworkErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkErrorKind::Timeout => "connection timed out",
            NetworkErrorKind::Refused => "connection refused",
            NetworkErrorKind::Unreachable => "host unreachable",
            NetworkErrorKind::Reset => "connection reset",
            NetworkErrorKind::CertExpired => "TLS certificate expired",
            NetworkErrorKind::SelfSigned => "self-signed TLS certificate rejected",
            NetworkErrorKind::Other => "network error",
        }
    }
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PbxError {
    /// The PBX has not finished writing the recording yet (HTTP 404 after
    /// the retry budget). Distinct from a hard failure so operators can
    /// see the waiting period.
    #[error("recording {filename} not available after {attempts} attempts")]
    RecordingNotReady { filename: String, attempts: u32 },
    #[error("authentication failed: {0}")]
    AuthFailed(String),
    #[error("PBX returned status {status}: {message}")]
    Http { status: u16, message: String },
    #[error("{kind}: {message}")]
    Network {
        kind: NetworkErrorKind,
        message: String,
    },
    #[error("invalid PBX response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait PbxClient: Send + Sync {
    /// Authenticate and issue one authenticated read-only call. Reports
    /// outcome and elapsed time; never retries.
    async fn test_connection(&self, config: &PbxConfig) -> ConnectionTestResult;

    /// Fetch a named recording. Carries its own bounded retry policy for
    /// not-yet-available recordings and expired sessions.
    async fn download_recording(
        &self,
        config: &PbxConfig,
        filename: &str,
    ) -> Result<Bytes, PbxError>;
}
