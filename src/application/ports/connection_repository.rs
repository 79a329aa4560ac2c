use async_trait::async_trait;

use crate::domain::{ConnectionId, ConnectionStatus, PbxConnection};

use super::RepositoryError;

#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    async fn get_by_id(&self, id: ConnectionId) -> Result<Option<PbxConnection>, RepositoryError>;

    async fn update_status(
        &self,
        id: ConnectionId,
        status: ConnectionStatus,
        last_error: Option<&str>,
    ) -> Result<(), RepositoryError>;
}
