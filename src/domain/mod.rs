mod analysis;
mod call_record;
mod job;
mod job_status;
mod pbx_connection;
mod storage_path;
mod transcript;

pub use analysis::{
    CallAnalysis, CallAnalysisId, CallAnalysisResult, EscalationRisk, SatisfactionPrediction,
    Sentiment, SpeakerTalkRatio,
};
pub use call_record::{
    CallDirection, CallDisposition, CallRecord, CallRecordId, ProcessingStatus, TenantId,
};
pub use job::{Job, JobId, JobType};
pub use job_status::JobStatus;
pub use pbx_connection::{ConnectionId, ConnectionStatus, PbxConnection};
pub use storage_path::StoragePath;
pub use transcript::{SpeakerStats, Transcript, Utterance};
