use std::fmt;

use chrono::{DateTime, Datelike, Utc};

use super::TenantId;

/// Tenant/date-scoped object key. Paths are deterministic per call so a
/// re-run of the pipeline overwrites its own artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath(String);

impl StoragePath {
    pub fn recording(
        tenant_id: &TenantId,
        call_started_at: DateTime<Utc>,
        uniqueid: &str,
        filename: &str,
    ) -> Self {
        Self(format!(
            "{}/{}",
            Self::prefix(tenant_id, call_started_at, uniqueid),
            filename
        ))
    }

    pub fn transcript(
        tenant_id: &TenantId,
        call_started_at: DateTime<Utc>,
        uniqueid: &str,
    ) -> Self {
        Self(format!(
            "{}/transcript.json",
            Self::prefix(tenant_id, call_started_at, uniqueid)
        ))
    }

    pub fn analysis(tenant_id: &TenantId, call_started_at: DateTime<Utc>, uniqueid: &str) -> Self {
        Self(format!(
            "{}/analysis.json",
            Self::prefix(tenant_id, call_started_at, uniqueid)
        ))
    }

    pub fn from_raw(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn prefix(tenant_id: &TenantId, call_started_at: DateTime<Utc>, uniqueid: &str) -> String {
        format!(
            "{}/{:04}/{:02}/{:02}/{}",
            tenant_id.as_uuid(),
            call_started_at.year(),
            call_started_at.month(),
            call_started_at.day(),
            uniqueid
        )
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
