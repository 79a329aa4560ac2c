use std::env;

use super::Environment;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: Environment,
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub transcription: TranscriptionSettings,
    pub analysis: AnalysisSettings,
    pub encryption: EncryptionSettings,
    pub worker: WorkerSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy)]
pub enum StorageProviderSetting {
    Local,
    Azure,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub provider: StorageProviderSetting,
    pub local_path: String,
    pub azure_account: Option<String>,
    pub azure_access_key: Option<String>,
    pub azure_container: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TranscriptionSettings {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EncryptionSettings {
    /// 64 hex chars. Deliberately not validated here: the credential
    /// store checks it on first use.
    pub key_hex: String,
}

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub poll_interval_secs: u64,
    pub max_jobs_per_tick: usize,
    pub stale_check_interval_secs: u64,
    pub stale_after_secs: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            environment: var_or("APP_ENV", "local")
                .parse::<Environment>()
                .map_err(|e| ConfigError::Invalid("APP_ENV", e))?,
            server: ServerSettings {
                host: var_or("SERVER_HOST", "0.0.0.0"),
                port: parse_var("SERVER_PORT", 3000)?,
            },
            database: DatabaseSettings {
                url: require("DATABASE_URL")?,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            storage: StorageSettings {
                provider: match var_or("STORAGE_PROVIDER", "local").to_lowercase().as_str() {
                    "local" => StorageProviderSetting::Local,
                    "azure" => StorageProviderSetting::Azure,
                    other => {
                        return Err(ConfigError::Invalid(
                            "STORAGE_PROVIDER",
                            format!("{} (expected local or azure)", other),
                        ));
                    }
                },
                local_path: var_or("STORAGE_LOCAL_PATH", "./artifacts"),
                azure_account: env::var("AZURE_STORAGE_ACCOUNT").ok(),
                azure_access_key: env::var("AZURE_STORAGE_ACCESS_KEY").ok(),
                azure_container: env::var("AZURE_STORAGE_CONTAINER").ok(),
            },
            transcription: TranscriptionSettings {
                api_key: require("DEEPGRAM_API_KEY")?,
                base_url: env::var("DEEPGRAM_BASE_URL").ok(),
                model: env::var("DEEPGRAM_MODEL").ok(),
            },
            analysis: AnalysisSettings {
                api_key: require("OPENAI_API_KEY")?,
                base_url: env::var("OPENAI_BASE_URL").ok(),
                model: env::var("OPENAI_MODEL").ok(),
            },
            encryption: EncryptionSettings {
                key_hex: env::var("CREDENTIAL_ENCRYPTION_KEY").unwrap_or_default(),
            },
            worker: WorkerSettings {
                poll_interval_secs: parse_var("WORKER_POLL_INTERVAL_SECS", 5)?,
                max_jobs_per_tick: parse_var("WORKER_MAX_JOBS_PER_TICK", 3)?,
                stale_check_interval_secs: parse_var("WORKER_STALE_CHECK_INTERVAL_SECS", 300)?,
                stale_after_secs: parse_var("WORKER_STALE_AFTER_SECS", 600)?,
            },
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}
