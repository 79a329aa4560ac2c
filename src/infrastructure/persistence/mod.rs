mod pg_pool;
pub mod repositories;

pub use pg_pool::create_pool;
pub use repositories::{
    MemoryAnalysisRepository, MemoryCallRepository, MemoryConnectionRepository, MemoryJobQueue,
    MemoryUsageRecorder, PgAnalysisRepository, PgCallRepository, PgConnectionRepository,
    PgJobQueue, PgUsageRecorder, UsageTotals,
};
