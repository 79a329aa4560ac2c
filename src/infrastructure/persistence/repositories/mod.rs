mod memory;
mod pg_analysis_repository;
mod pg_call_repository;
mod pg_connection_repository;
mod pg_job_queue;
mod pg_usage_recorder;

pub use memory::{
    MemoryAnalysisRepository, MemoryCallRepository, MemoryConnectionRepository, MemoryJobQueue,
    MemoryUsageRecorder, UsageTotals,
};
pub use pg_analysis_repository::PgAnalysisRepository;
pub use pg_call_repository::PgCallRepository;
pub use pg_connection_repository::PgConnectionRepository;
pub use pg_job_queue::PgJobQueue;
pub use pg_usage_recorder::PgUsageRecorder;
