use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use kuching::application::services::{CallPipeline, IngestService, PipelineWorker, WorkerConfig};
use kuching::infrastructure::analysis::OpenAiAnalyzer;
use kuching::infrastructure::crypto::CredentialStore;
use kuching::infrastructure::observability::{init_tracing, TracingConfig};
use kuching::infrastructure::pbx::HttpPbxClient;
use kuching::infrastructure::persistence::{
    create_pool, PgAnalysisRepository, PgCallRepository, PgConnectionRepository, PgJobQueue,
    PgUsageRecorder,
};
use kuching::infrastructure::storage::ArtifactStoreFactory;
use kuching::infrastructure::transcription::DeepgramTranscriber;
use kuching::presentation::{create_router, AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_tracing(TracingConfig::new(
        settings.environment.to_string(),
        settings.environment.is_prod(),
    ));

    let pool = create_pool(&settings.database.url, settings.database.max_connections).await?;
    sqlx::migrate!().run(&pool).await?;

    let call_repository = Arc::new(PgCallRepository::new(pool.clone()));
    let analysis_repository = Arc::new(PgAnalysisRepository::new(pool.clone()));
    let connection_repository = Arc::new(PgConnectionRepository::new(pool.clone()));
    let job_queue = Arc::new(PgJobQueue::new(pool.clone()));
    let usage_recorder = Arc::new(PgUsageRecorder::new(pool.clone()));

    let artifact_store = ArtifactStoreFactory::create(&settings.storage)?;
    let credential_store = Arc::new(CredentialStore::new(settings.encryption.key_hex.clone()));
    let pbx_client = Arc::new(HttpPbxClient::new());
    let transcriber = Arc::new(DeepgramTranscriber::new(
        settings.transcription.api_key.clone(),
        settings.transcription.base_url.clone(),
        settings.transcription.model.clone(),
    ));
    let analyzer = Arc::new(OpenAiAnalyzer::new(
        settings.analysis.api_key.clone(),
        settings.analysis.base_url.clone(),
        settings.analysis.model.clone(),
    ));

    let pipeline = Arc::new(CallPipeline::new(
        call_repository.clone(),
        analysis_repository.clone(),
        connection_repository.clone(),
        credential_store,
        pbx_client,
        transcriber,
        analyzer,
        artifact_store,
        usage_recorder,
    ));

    let worker = PipelineWorker::new(
        job_queue.clone(),
        call_repository.clone(),
        pipeline,
        WorkerConfig {
            poll_interval: Duration::from_secs(settings.worker.poll_interval_secs),
            max_jobs_per_tick: settings.worker.max_jobs_per_tick,
            stale_check_interval: Duration::from_secs(settings.worker.stale_check_interval_secs),
            stale_after: Duration::from_secs(settings.worker.stale_after_secs),
        },
    );
    tokio::spawn(worker.run());

    let ingest_service = Arc::new(IngestService::new(
        connection_repository,
        call_repository.clone(),
        job_queue.clone(),
    ));

    let state = AppState {
        ingest_service,
        call_repository,
        analysis_repository,
        job_queue,
    };

    let router = create_router(state);

    let addr: SocketAddr =
        format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
