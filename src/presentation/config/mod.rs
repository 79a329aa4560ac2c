mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    AnalysisSettings, ConfigError, DatabaseSettings, EncryptionSettings, ServerSettings, Settings,
    StorageProviderSetting, StorageSettings, TranscriptionSettings, WorkerSettings,
};
