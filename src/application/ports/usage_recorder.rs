use async_trait::async_trait;

use crate::domain::TenantId;

use super::RepositoryError;

/// One processed call's contribution to tenant usage counters.
#[derive(Debug, Clone, Copy)]
pub struct UsageSample {
    pub calls_processed: i64,
    pub audio_seconds: i64,
    pub storage_bytes: i64,
}

/// Usage metering is best-effort: the pipeline logs a failed record and
/// carries on. Do not bill directly from these counters.
#[async_trait]
pub trait UsageRecorder: Send + Sync {
    async fn record(&self, tenant_id: TenantId, sample: UsageSample) -> Result<(), RepositoryError>;
}
