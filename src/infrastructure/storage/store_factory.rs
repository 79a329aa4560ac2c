use std::path::PathBuf;
use std::sync::Arc;

use crate::application::ports::{ArtifactStore, ArtifactStoreError};
use crate::presentation::config::{StorageProviderSetting, StorageSettings};

use super::azure_store::AzureArtifactStore;
use super::local_store::LocalArtifactStore;

pub struct ArtifactStoreFactory;

impl ArtifactStoreFactory {
    pub fn create(
        settings: &StorageSettings,
    ) -> Result<Arc<dyn ArtifactStore>, ArtifactStoreError> {
        match settings.provider {
            StorageProviderSetting::Local => {
                let store = LocalArtifactStore::new(PathBuf::from(&settings.local_path))?;
                Ok(Arc::new(store))
            }
            StorageProviderSetting::Azure => {
                let account = required(&settings.azure_account, "AZURE_STORAGE_ACCOUNT")?;
                let key = required(&settings.azure_access_key, "AZURE_STORAGE_ACCESS_KEY")?;
                let container = required(&settings.azure_container, "AZURE_STORAGE_CONTAINER")?;
                Ok(Arc::new(AzureArtifactStore::new(account, key, container)?))
            }
        }
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ArtifactStoreError> {
    value
        .as_deref()
        .ok_or_else(|| ArtifactStoreError::UploadFailed(format!("{} is required", name)))
}
