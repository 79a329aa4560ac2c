use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::application::ports::{CallRepository, JobQueue};
use crate::domain::{Job, JobStatus};

use super::CallPipeline;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub poll_interval: Duration,
    /// Upper bound on jobs claimed per poll tick; claimed jobs are
    /// processed sequentially, never as an unbounded fan-out.
    pub max_jobs_per_tick: usize,
    pub stale_check_interval: Duration,
    pub stale_after: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_jobs_per_tick: 3,
            stale_check_interval: Duration::from_secs(300),
            stale_after: Duration::from_secs(600),
        }
    }
}

/// Poll-loop worker: claims pending jobs from the queue, runs each one
/// through the pipeline to completion, and periodically re-arms jobs
/// abandoned by crashed workers. Multiple worker processes may run
/// concurrently; the queue's atomic claim is the only coordination.
pub struct PipelineWorker {
    job_queue: Arc<dyn JobQueue>,
    call_repository: Arc<dyn CallRepository>,
    pipeline: Arc<CallPipeline>,
    config: WorkerConfig,
}

impl PipelineWorker {
    pub fn new(
        job_queue: Arc<dyn JobQueue>,
        call_repository: Arc<dyn CallRepository>,
        pipeline: Arc<CallPipeline>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            job_queue,
            call_repository,
            pipeline,
            config,
        }
    }

    pub async fn run(self) {
        tracing::info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            max_jobs_per_tick = self.config.max_jobs_per_tick,
            "Pipeline worker started"
        );

        let mut poll = tokio::time::interval(self.config.poll_interval);
        let mut sweep = tokio::time::interval(self.config.stale_check_interval);
        poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = poll.tick() => self.tick().await,
                _ = sweep.tick() => self.sweep_stale().await,
            }
        }
    }

    /// One poll cycle: claim and process up to `max_jobs_per_tick` jobs.
    pub async fn tick(&self) {
        for _ in 0..self.config.max_jobs_per_tick {
            let job = match self.job_queue.claim_next().await {
                Ok(Some(job)) => job,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to claim job");
                    break;
                }
            };
            self.process_job(job).await;
        }
    }

    pub async fn process_job(&self, job: Job) {
        let span = tracing::info_span!(
            "pipeline_job",
            job_id = %job.id.as_uuid(),
            call_record_id = %job.call_record_id.as_uuid(),
            attempt = job.attempts,
        );
        self.run_job(job).instrument(span).await
    }

    async fn run_job(&self, job: Job) {
        match self.pipeline.execute(&job).await {
            Ok(outcome) => {
                let result = serde_json::to_value(&outcome).unwrap_or_default();
                if let Err(e) = self.job_queue.complete(job.id, result).await {
                    tracing::error!(error = %e, "Failed to mark job completed");
                    return;
                }
                tracing::info!(
                    recording_bytes = outcome.recording_bytes,
                    utterances = outcome.utterances,
                    "Pipeline job completed"
                );
            }
            Err(e) => {
                let error_msg = e.to_string();
                tracing::error!(error = %error_msg, "Pipeline job failed");

                if let Err(repo_err) = self
                    .call_repository
                    .mark_failed(job.call_record_id, &error_msg)
                    .await
                {
                    tracing::error!(error = %repo_err, "Failed to mark call record failed");
                }

                match self.job_queue.record_failure(job.id, &error_msg).await {
                    Ok(JobStatus::Pending) => {
                        tracing::info!(
                            attempts = job.attempts,
                            max_attempts = job.max_attempts,
                            "Job re-armed for retry"
                        );
                    }
                    Ok(status) => {
                        tracing::warn!(status = %status, "Job is terminal");
                    }
                    Err(repo_err) => {
                        tracing::error!(error = %repo_err, "Failed to record job failure");
                    }
                }
            }
        }
    }

    pub async fn sweep_stale(&self) {
        match self.job_queue.reset_stale(self.config.stale_after).await {
            Ok(0) => {}
            Ok(count) => {
                tracing::warn!(count, "Reset stale jobs back to pending");
            }
            Err(e) => {
                tracing::error!(error = %e, "Stale job sweep failed");
            }
        }
    }
}
