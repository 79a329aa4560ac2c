use std::io;

use bytes::Bytes;

use crate::domain::StoragePath;

/// Durable object storage for pipeline artifacts (recordings, transcript
/// and analysis JSON). Puts are idempotent: writing the same path twice
/// overwrites.
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put(&self, path: &StoragePath, data: Bytes) -> Result<u64, ArtifactStoreError>;

    async fn fetch(&self, path: &StoragePath) -> Result<Vec<u8>, ArtifactStoreError>;

    async fn delete(&self, path: &StoragePath) -> Result<(), ArtifactStoreError>;

    async fn head(&self, path: &StoragePath) -> Result<u64, ArtifactStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactStoreError {
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
