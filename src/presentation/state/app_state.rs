use std::sync::Arc;

use crate::application::ports::{AnalysisRepository, CallRepository, JobQueue};
use crate::application::services::IngestService;

#[derive(Clone)]
pub struct AppState {
    pub ingest_service: Arc<IngestService>,
    pub call_repository: Arc<dyn CallRepository>,
    pub analysis_repository: Arc<dyn AnalysisRepository>,
    pub job_queue: Arc<dyn JobQueue>,
}
