use std::collections::HashMap;
use std::sync::Mutex;

use bytes::Bytes;

use crate::application::ports::{ArtifactStore, ArtifactStoreError};
use crate::domain::StoragePath;

/// Map-backed store for tests; puts overwrite like the real adapters.
#[derive(Default)]
pub struct MemoryArtifactStore {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, path: &StoragePath) -> bool {
        self.objects.lock().unwrap().contains_key(path.as_str())
    }
}

#[async_trait::async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put(&self, path: &StoragePath, data: Bytes) -> Result<u64, ArtifactStoreError> {
        let size = data.len() as u64;
        self.objects
            .lock()
            .unwrap()
            .insert(path.as_str().to_string(), data);
        Ok(size)
    }

    async fn fetch(&self, path: &StoragePath) -> Result<Vec<u8>, ArtifactStoreError> {
        self.objects
            .lock()
            .unwrap()
            .get(path.as_str())
            .map(|b| b.to_vec())
            .ok_or_else(|| ArtifactStoreError::NotFound(path.as_str().to_string()))
    }

    async fn delete(&self, path: &StoragePath) -> Result<(), ArtifactStoreError> {
        self.objects
            .lock()
            .unwrap()
            .remove(path.as_str())
            .map(|_| ())
            .ok_or_else(|| ArtifactStoreError::NotFound(path.as_str().to_string()))
    }

    async fn head(&self, path: &StoragePath) -> Result<u64, ArtifactStoreError> {
        self.objects
            .lock()
            .unwrap()
            .get(path.as_str())
            .map(|b| b.len() as u64)
            .ok_or_else(|| ArtifactStoreError::NotFound(path.as_str().to_string()))
    }
}
