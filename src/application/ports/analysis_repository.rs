use async_trait::async_trait;

use crate::domain::{CallAnalysis, CallRecordId};

use super::RepositoryError;

#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    /// Insert-once: a second insert for the same call record is a
    /// constraint violation, not an update.
    async fn insert(&self, analysis: &CallAnalysis) -> Result<(), RepositoryError>;

    async fn get_by_call_record(
        &self,
        call_record_id: CallRecordId,
    ) -> Result<Option<CallAnalysis>, RepositoryError>;
}
