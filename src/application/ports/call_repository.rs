use async_trait::async_trait;

use crate::domain::{CallRecord, CallRecordId, StoragePath, TenantId};

use super::RepositoryError;

#[async_trait]
pub trait CallRepository: Send + Sync {
    async fn create(&self, record: &CallRecord) -> Result<(), RepositoryError>;

    async fn get_by_id(&self, id: CallRecordId) -> Result<Option<CallRecord>, RepositoryError>;

    /// Lookup by the PBX-assigned call id, scoped to one tenant. This is
    /// the dedup path for repeated webhook deliveries.
    async fn find_by_uniqueid(
        &self,
        tenant_id: TenantId,
        uniqueid: &str,
    ) -> Result<Option<CallRecord>, RepositoryError>;

    async fn set_recording_path(
        &self,
        id: CallRecordId,
        path: &StoragePath,
    ) -> Result<(), RepositoryError>;

    async fn mark_processing(&self, id: CallRecordId) -> Result<(), RepositoryError>;

    async fn mark_completed(
        &self,
        id: CallRecordId,
        transcript_path: &StoragePath,
        analysis_path: &StoragePath,
    ) -> Result<(), RepositoryError>;

    async fn mark_failed(&self, id: CallRecordId, error: &str) -> Result<(), RepositoryError>;
}
