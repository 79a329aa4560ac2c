mod ingest;
mod pipeline;
mod worker;

pub use ingest::{CdrPayload, IngestError, IngestOutcome, IngestService};
pub use pipeline::{CallPipeline, PipelineError, PipelineOutcome};
pub use worker::{PipelineWorker, WorkerConfig};
