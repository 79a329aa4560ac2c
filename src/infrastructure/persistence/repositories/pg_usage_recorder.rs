use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use crate::application::ports::{RepositoryError, UsageRecorder, UsageSample};
use crate::domain::TenantId;

pub struct PgUsageRecorder {
    pool: PgPool,
}

impl PgUsageRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageRecorder for PgUsageRecorder {
    #[instrument(skip(self), fields(tenant_id = %tenant_id.as_uuid()))]
    async fn record(
        &self,
        tenant_id: TenantId,
        sample: UsageSample,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO tenant_usage (tenant_id, calls_processed, audio_seconds, storage_bytes, updated_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (tenant_id) DO UPDATE
            SET calls_processed = tenant_usage.calls_processed + EXCLUDED.calls_processed,
                audio_seconds = tenant_usage.audio_seconds + EXCLUDED.audio_seconds,
                storage_bytes = tenant_usage.storage_bytes + EXCLUDED.storage_bytes,
                updated_at = now()
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(sample.calls_processed)
        .bind(sample.audio_seconds)
        .bind(sample.storage_bytes)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }
}
