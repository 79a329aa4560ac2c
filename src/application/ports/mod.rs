mod analysis_repository;
mod analyzer;
mod artifact_store;
mod call_repository;
mod connection_repository;
mod credential_cipher;
mod job_queue;
mod pbx_client;
mod repository_error;
mod transcriber;
mod usage_recorder;

pub use analysis_repository::AnalysisRepository;
pub use analyzer::{AnalysisError, CallAnalyzer, CallMetadata};
pub use artifact_store::{ArtifactStore, ArtifactStoreError};
pub use call_repository::CallRepository;
pub use connection_repository::ConnectionRepository;
pub use credential_cipher::{CredentialCipher, CredentialError};
pub use job_queue::JobQueue;
pub use pbx_client::{ConnectionTestResult, NetworkErrorKind, PbxClient, PbxConfig, PbxError};
pub use repository_error::RepositoryError;
pub use transcriber::{Transcriber, TranscriptionError};
pub use usage_recorder::{UsageRecorder, UsageSample};
