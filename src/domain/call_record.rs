use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::ConnectionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TenantId(Uuid);

impl TenantId {
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

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallRecordId(Uuid);

impl CallRecordId {
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

impl Default for CallRecordId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallDirection {
    Inbound,
    Outbound,
    Internal,
}

impl CallDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallDirection::Inbound => "inbound",
            CallDirection::Outbound => "outbound",
            CallDirection::Internal => "internal",
        }
    }
}

impl FromStr for CallDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inbound" => Ok(CallDirection::Inbound),
            "outbound" => Ok(CallDirection::Outbound),
            "internal" => Ok(CallDirection::Internal),
            _ => Err(format!("Invalid call direction: {}", s)),
        }
    }
}

impl fmt::Display for CallDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Disposition strings follow the PBX wire format verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallDisposition {
    Answered,
    NoAnswer,
    Busy,
    Failed,
    Congestion,
}

impl CallDisposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallDisposition::Answered => "ANSWERED",
            CallDisposition::NoAnswer => "NO ANSWER",
            CallDisposition::Busy => "BUSY",
            CallDisposition::Failed => "FAILED",
            CallDisposition::Congestion => "CONGESTION",
        }
    }
}

impl FromStr for CallDisposition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ANSWERED" => Ok(CallDisposition::Answered),
            "NO ANSWER" => Ok(CallDisposition::NoAnswer),
            "BUSY" => Ok(CallDisposition::Busy),
            "FAILED" => Ok(CallDisposition::Failed),
            "CONGESTION" => Ok(CallDisposition::Congestion),
            _ => Err(format!("Invalid call disposition: {}", s)),
        }
    }
}

impl fmt::Display for CallDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }
}

impl FromStr for ProcessingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProcessingStatus::Pending),
            "processing" => Ok(ProcessingStatus::Processing),
            "completed" => Ok(ProcessingStatus::Completed),
            "failed" => Ok(ProcessingStatus::Failed),
            _ => Err(format!("Invalid processing status: {}", s)),
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One call-detail record. Created by the webhook handler; mutated only by
/// the pipeline (storage paths, processing status).
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub id: CallRecordId,
    pub tenant_id: TenantId,
    pub connection_id: ConnectionId,
    /// PBX-assigned unique call id. `(tenant_id, uniqueid)` is the natural
    /// dedup key for duplicate webhook deliveries.
    pub uniqueid: String,
    pub src: String,
    pub dst: String,
    pub direction: CallDirection,
    pub disposition: CallDisposition,
    pub started_at: DateTime<Utc>,
    pub answered_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: i64,
    pub recording_filename: Option<String>,
    pub recording_path: Option<String>,
    pub transcript_path: Option<String>,
    pub analysis_path: Option<String>,
    pub processing_status: ProcessingStatus,
    pub processing_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CallRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenant_id: TenantId,
        connection_id: ConnectionId,
        uniqueid: String,
        src: String,
        dst: String,
        direction: CallDirection,
        disposition: CallDisposition,
        started_at: DateTime<Utc>,
        answered_at: Option<DateTime<Utc>>,
        ended_at: Option<DateTime<Utc>>,
        duration_seconds: i64,
        recording_filename: Option<String>,
    ) -> Self {
        let now = Utc::now();
        // Calls without a recording have nothing to process.
        let processing_status = if recording_filename.is_some() {
            ProcessingStatus::Pending
        } else {
            ProcessingStatus::Completed
        };
        Self {
            id: CallRecordId::new(),
            tenant_id,
            connection_id,
            uniqueid,
            src,
            dst,
            direction,
            disposition,
            started_at,
            answered_at,
            ended_at,
            duration_seconds,
            recording_filename,
            recording_path: None,
            transcript_path: None,
            analysis_path: None,
            processing_status,
            processing_error: None,
            created_at: now,
            updated_at: now,
        }
    }
}
