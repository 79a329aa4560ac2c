use std::error::Error as StdError;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    ConnectionTestResult, NetworkErrorKind, PbxClient, PbxConfig, PbxError,
};

const MAX_DOWNLOAD_ATTEMPTS: u32 = 3;
/// Backoff before retrying a not-yet-available recording. Only the delays
/// preceding a retry are slept; the final failure returns immediately.
const RETRY_SCHEDULE: [Duration; 3] = [
    Duration::from_secs(5),
    Duration::from_secs(10),
    Duration::from_secs(20),
];

const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Some PBX firmware reports errors in a 200 response with a JSON body.
#[derive(Deserialize)]
struct PbxErrorEnvelope {
    response: String,
    #[serde(default)]
    message: String,
}

/// HTTPS client for PBX appliances: JSON login returning a session
/// cookie, then authenticated GETs presenting that cookie. Appliances
/// almost always run self-signed certificates, so verification follows
/// the per-connection `verify_ssl` flag.
pub struct HttpPbxClient {
    auth_timeout: Duration,
    download_timeout: Duration,
    base_url: Option<String>,
}

impl HttpPbxClient {
    pub fn new() -> Self {
        Self {
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            base_url: None,
        }
    }

    pub fn with_timeouts(auth_timeout: Duration, download_timeout: Duration) -> Self {
        Self {
            auth_timeout,
            download_timeout,
            base_url: None,
        }
    }

    /// Point the client at a fixed base URL instead of deriving
    /// `https://host:port` from the connection, e.g. a plain-HTTP test
    /// double.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    fn endpoint(&self, config: &PbxConfig) -> String {
        self.base_url.clone().unwrap_or_else(|| config.base_url())
    }

    fn http_client(&self, config: &PbxConfig) -> Result<reqwest::Client, PbxError> {
        let mut builder = reqwest::Client::builder();
        if !config.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }
        builder.build().map_err(|e| PbxError::Network {
            kind: NetworkErrorKind::Other,
            message: format!("failed to build HTTP client: {}", e),
        })
    }

    async fn login(
        &self,
        client: &reqwest::Client,
        config: &PbxConfig,
    ) -> Result<String, PbxError> {
        let url = format!("{}/api/login", self.endpoint(config));
        let body = LoginRequest {
            username: &config.username,
            password: &config.password,
        };

        let response = client
            .post(&url)
            .json(&body)
            .timeout(self.auth_timeout)
            .send()
            .await
            .map_err(classify_network_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PbxError::AuthFailed(format!(
                "login returned {}: {}",
                status, text
            )));
        }

        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(String::from)
            .ok_or_else(|| {
                PbxError::InvalidResponse("login response carried no session cookie".to_string())
            })?;

        Ok(cookie)
    }
}

impl Default for HttpPbxClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PbxClient for HttpPbxClient {
    async fn test_connection(&self, config: &PbxConfig) -> ConnectionTestResult {
        let started = Instant::now();

        let outcome: Result<(), PbxError> = async {
            let client = self.http_client(config)?;
            let session = self.login(&client, config).await?;

            let url = format!("{}/api/status", self.endpoint(config));
            let response = client
                .get(&url)
                .header(COOKIE, session)
                .timeout(self.auth_timeout)
                .send()
                .await
                .map_err(classify_network_error)?;

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                return Err(PbxError::Http {
                    status: status.as_u16(),
                    message: text,
                });
            }
            Ok(())
        }
        .await;

        let response_time_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(()) => ConnectionTestResult {
                success: true,
                message: "connection successful".to_string(),
                error: None,
                response_time_ms,
            },
            Err(e) => ConnectionTestResult {
                success: false,
                message: "connection failed".to_string(),
                error: Some(e.to_string()),
                response_time_ms,
            },
        }
    }

    async fn download_recording(
        &self,
        config: &PbxConfig,
        filename: &str,
    ) -> Result<Bytes, PbxError> {
        let client = self.http_client(config)?;
        let url = format!("{}/api/recordings", self.endpoint(config));
        let mut session: Option<String> = None;

        for attempt in 1..=MAX_DOWNLOAD_ATTEMPTS {
            let cookie = match &session {
                Some(c) => c.clone(),
                None => {
                    let c = self.login(&client, config).await?;
                    session = Some(c.clone());
                    c
                }
            };

            let response = client
                .get(&url)
                .query(&[("filename", filename)])
                .header(COOKIE, cookie)
                .timeout(self.download_timeout)
                .send()
                .await
                .map_err(classify_network_error)?;

            match response.status() {
                s if s.is_success() => {
                    let bytes = response.bytes().await.map_err(classify_network_error)?;
                    // A 200 can still be a JSON error envelope.
                    if let Ok(envelope) = serde_json::from_slice::<PbxErrorEnvelope>(&bytes) {
                        if envelope.response == "error" {
                            return Err(PbxError::Http {
                                status: s.as_u16(),
                                message: envelope.message,
                            });
                        }
                    }
                    return Ok(bytes);
                }
                StatusCode::NOT_FOUND => {
                    if attempt == MAX_DOWNLOAD_ATTEMPTS {
                        return Err(PbxError::RecordingNotReady {
                            filename: filename.to_string(),
                            attempts: attempt,
                        });
                    }
                    let delay = RETRY_SCHEDULE[(attempt - 1) as usize];
                    tracing::debug!(
                        filename,
                        attempt,
                        delay_secs = delay.as_secs(),
                        "Recording not available yet, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                StatusCode::UNAUTHORIZED => {
                    // Session expired: re-authenticate before the next
                    // attempt, without sleeping.
                    tracing::debug!(filename, attempt, "PBX session expired, re-authenticating");
                    session = None;
                    if attempt == MAX_DOWNLOAD_ATTEMPTS {
                        return Err(PbxError::AuthFailed(
                            "session expired and attempt budget exhausted".to_string(),
                        ));
                    }
                }
                status => {
                    let text = response.text().await.unwrap_or_default();
                    return Err(PbxError::Http {
                        status: status.as_u16(),
                        message: text,
                    });
                }
            }
        }

        unreachable!("download loop exits via return")
    }
}

/// Map a connectivity-level failure onto an operator-readable category.
fn classify_network_error(error: reqwest::Error) -> PbxError {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    let lowered = chain.to_lowercase();

    let kind = if error.is_timeout() {
        NetworkErrorKind::Timeout
    } else if lowered.contains("refused") {
        NetworkErrorKind::Refused
    } else if lowered.contains("unreachable") || lowered.contains("no route") {
        NetworkErrorKind::Unreachable
    } else if lowered.contains("reset") {
        NetworkErrorKind::Reset
    } else if lowered.contains("certificate") && lowered.contains("expired") {
        NetworkErrorKind::CertExpired
    } else if lowered.contains("self-signed") || lowered.contains("self signed") {
        NetworkErrorKind::SelfSigned
    } else {
        NetworkErrorKind::Other
    };

    PbxError::Network {
        kind,
        message: chain,
    }
}
