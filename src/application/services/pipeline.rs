use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::application::ports::{
    AnalysisError, AnalysisRepository, ArtifactStore, ArtifactStoreError, CallAnalyzer,
    CallMetadata, CallRepository, ConnectionRepository, CredentialCipher, CredentialError,
    PbxClient, PbxConfig, PbxError, RepositoryError, Transcriber, TranscriptionError,
    UsageRecorder, UsageSample,
};
use crate::domain::{CallAnalysis, ConnectionStatus, Job, StoragePath};

/// Small result payload stored on the completed job.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub call_record_id: Uuid,
    pub recording_bytes: u64,
    pub utterances: usize,
    pub speakers: usize,
    pub audio_seconds: f64,
    pub sentiment: String,
}

/// The fixed stage sequence executed once per claimed job. Any stage
/// failure aborts the remaining stages; the worker owns job and CDR
/// failure bookkeeping. Already-uploaded artifacts are left in place:
/// paths are deterministic, so a retry overwrites them.
pub struct CallPipeline {
    call_repository: Arc<dyn CallRepository>,
    analysis_repository: Arc<dyn AnalysisRepository>,
    connection_repository: Arc<dyn ConnectionRepository>,
    credential_cipher: Arc<dyn CredentialCipher>,
    pbx_client: Arc<dyn PbxClient>,
    transcriber: Arc<dyn Transcriber>,
    analyzer: Arc<dyn CallAnalyzer>,
    artifact_store: Arc<dyn ArtifactStore>,
    usage_recorder: Arc<dyn UsageRecorder>,
}

impl CallPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        call_repository: Arc<dyn CallRepository>,
        analysis_repository: Arc<dyn AnalysisRepository>,
        connection_repository: Arc<dyn ConnectionRepository>,
        credential_cipher: Arc<dyn CredentialCipher>,
        pbx_client: Arc<dyn PbxClient>,
        transcriber: Arc<dyn Transcriber>,
        analyzer: Arc<dyn CallAnalyzer>,
        artifact_store: Arc<dyn ArtifactStore>,
        usage_recorder: Arc<dyn UsageRecorder>,
    ) -> Self {
        Self {
            call_repository,
            analysis_repository,
            connection_repository,
            credential_cipher,
            pbx_client,
            transcriber,
            analyzer,
            artifact_store,
            usage_recorder,
        }
    }

    pub async fn execute(&self, job: &Job) -> Result<PipelineOutcome, PipelineError> {
        let call = self
            .call_repository
            .get_by_id(job.call_record_id)
            .await
            .map_err(PipelineError::Repository)?
            .ok_or(PipelineError::MissingCallRecord(
                job.call_record_id.as_uuid(),
            ))?;

        let connection = self
            .connection_repository
            .get_by_id(call.connection_id)
            .await
            .map_err(PipelineError::Repository)?
            .ok_or(PipelineError::MissingConnection(
                call.connection_id.as_uuid(),
            ))?;

        let filename = call
            .recording_filename
            .clone()
            .ok_or(PipelineError::NoRecording)?;

        let password = self
            .credential_cipher
            .decrypt(&connection.password_encrypted)
            .map_err(PipelineError::Credential)?;

        self.call_repository
            .mark_processing(call.id)
            .await
            .map_err(PipelineError::Repository)?;

        let pbx_config = PbxConfig {
            host: connection.host.clone(),
            port: connection.port,
            username: connection.username.clone(),
            password,
            verify_ssl: connection.verify_ssl,
        };

        let audio = match self
            .pbx_client
            .download_recording(&pbx_config, &filename)
            .await
        {
            Ok(audio) => audio,
            Err(e) => {
                // Surface the failure on the connection for operators;
                // best-effort, the job failure is what matters.
                if let Err(repo_err) = self
                    .connection_repository
                    .update_status(connection.id, ConnectionStatus::Error, Some(&e.to_string()))
                    .await
                {
                    tracing::warn!(error = %repo_err, "Failed to update connection status");
                }
                return Err(PipelineError::Download(e));
            }
        };
        let recording_bytes = audio.len() as u64;

        let recording_path =
            StoragePath::recording(&call.tenant_id, call.started_at, &call.uniqueid, &filename);
        self.artifact_store
            .put(&recording_path, audio.clone())
            .await
            .map_err(PipelineError::Storage)?;
        self.call_repository
            .set_recording_path(call.id, &recording_path)
            .await
            .map_err(PipelineError::Repository)?;

        let transcript = self
            .transcriber
            .transcribe(&audio)
            .await
            .map_err(PipelineError::Transcription)?;
        if transcript.is_empty() {
            return Err(PipelineError::EmptyTranscript);
        }

        let transcript_json = serde_json::to_vec(&transcript)
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;
        let transcript_path =
            StoragePath::transcript(&call.tenant_id, call.started_at, &call.uniqueid);
        self.artifact_store
            .put(&transcript_path, Bytes::from(transcript_json.clone()))
            .await
            .map_err(PipelineError::Storage)?;

        let metadata = CallMetadata {
            src: call.src.clone(),
            dst: call.dst.clone(),
            direction: call.direction,
            disposition: call.disposition,
            duration_seconds: call.duration_seconds,
        };
        let result = self
            .analyzer
            .analyze(&transcript, &metadata)
            .await
            .map_err(PipelineError::Analysis)?;

        let analysis_json = serde_json::to_vec(&result)
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;
        let analysis_path = StoragePath::analysis(&call.tenant_id, call.started_at, &call.uniqueid);
        self.artifact_store
            .put(&analysis_path, Bytes::from(analysis_json.clone()))
            .await
            .map_err(PipelineError::Storage)?;

        let analysis = CallAnalysis::new(call.tenant_id, call.id, result.clone());
        self.analysis_repository
            .insert(&analysis)
            .await
            .map_err(PipelineError::Repository)?;

        self.call_repository
            .mark_completed(call.id, &transcript_path, &analysis_path)
            .await
            .map_err(PipelineError::Repository)?;

        // Metering is not correctness-critical; log and move on.
        let sample = UsageSample {
            calls_processed: 1,
            audio_seconds: transcript.duration_seconds.round() as i64,
            storage_bytes: recording_bytes as i64
                + transcript_json.len() as i64
                + analysis_json.len() as i64,
        };
        if let Err(e) = self.usage_recorder.record(call.tenant_id, sample).await {
            tracing::warn!(
                error = %e,
                tenant_id = %call.tenant_id.as_uuid(),
                "Failed to record tenant usage"
            );
        }

        Ok(PipelineOutcome {
            call_record_id: call.id.as_uuid(),
            recording_bytes,
            utterances: transcript.utterances.len(),
            speakers: transcript.speakers.len(),
            audio_seconds: transcript.duration_seconds,
            sentiment: result.sentiment.to_string(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("call record {0} not found")]
    MissingCallRecord(Uuid),
    #[error("connection {0} not found")]
    MissingConnection(Uuid),
    #[error("call record has no recording filename")]
    NoRecording,
    #[error("credentials: {0}")]
    Credential(CredentialError),
    #[error("download: {0}")]
    Download(PbxError),
    #[error("storage: {0}")]
    Storage(ArtifactStoreError),
    #[error("transcription: {0}")]
    Transcription(TranscriptionError),
    #[error("transcript is empty")]
    EmptyTranscript,
    #[error("analysis: {0}")]
    Analysis(AnalysisError),
    #[error("serialization: {0}")]
    Serialization(String),
    #[error("repository: {0}")]
    Repository(RepositoryError),
}
