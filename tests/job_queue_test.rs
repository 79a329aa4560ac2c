use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use kuching::application::ports::JobQueue;
use kuching::domain::{CallRecordId, Job, JobStatus, TenantId};
use kuching::infrastructure::persistence::MemoryJobQueue;

fn job() -> Job {
    Job::new(TenantId::new(), CallRecordId::new())
}

#[tokio::test]
async fn given_mixed_priorities_when_claiming_then_lowest_priority_value_first() {
    let queue = MemoryJobQueue::new();

    let normal = job();
    let mut urgent = job();
    urgent.priority = 1;
    // Enqueued later, still claimed first.
    urgent.created_at = normal.created_at + chrono::Duration::seconds(10);

    queue.enqueue(&normal).await.unwrap();
    queue.enqueue(&urgent).await.unwrap();

    let first = queue.claim_next().await.unwrap().unwrap();
    let second = queue.claim_next().await.unwrap().unwrap();

    assert_eq!(first.id, urgent.id);
    assert_eq!(second.id, normal.id);
}

#[tokio::test]
async fn given_equal_priorities_when_claiming_then_oldest_first() {
    let queue = MemoryJobQueue::new();

    let base = Utc::now();
    let mut ids = Vec::new();
    for offset in [30, 10, 20] {
        let mut j = job();
        j.created_at = base + chrono::Duration::seconds(offset);
        ids.push((offset, j.id));
        queue.enqueue(&j).await.unwrap();
    }
    ids.sort_by_key(|(offset, _)| *offset);

    for (_, expected) in ids {
        let claimed = queue.claim_next().await.unwrap().unwrap();
        assert_eq!(claimed.id, expected);
    }
}

#[tokio::test]
async fn given_future_scheduled_job_when_claiming_then_not_eligible() {
    let queue = MemoryJobQueue::new();

    let mut deferred = job();
    deferred.scheduled_for = Utc::now() + chrono::Duration::hours(1);
    queue.enqueue(&deferred).await.unwrap();

    assert!(queue.claim_next().await.unwrap().is_none());
}

#[tokio::test]
async fn given_claimed_job_then_processing_with_attempt_counted() {
    let queue = MemoryJobQueue::new();
    let j = job();
    queue.enqueue(&j).await.unwrap();

    let claimed = queue.claim_next().await.unwrap().unwrap();

    assert_eq!(claimed.status, JobStatus::Processing);
    assert_eq!(claimed.attempts, 1);
    assert!(claimed.started_at.is_some());

    // Nothing left to claim while it is processing.
    assert!(queue.claim_next().await.unwrap().is_none());
}

#[tokio::test]
async fn given_concurrent_claimers_then_each_job_claimed_exactly_once() {
    let queue = Arc::new(MemoryJobQueue::new());

    let total = 20;
    let mut expected = HashSet::new();
    for _ in 0..total {
        let j = job();
        expected.insert(j.id.as_uuid());
        queue.enqueue(&j).await.unwrap();
    }

    let mut handles = Vec::new();
    for _ in 0..8 {
        let queue = Arc::clone(&queue);
        handles.push(tokio::spawn(async move {
            let mut claimed = Vec::new();
            while let Some(job) = queue.claim_next().await.unwrap() {
                claimed.push(job.id.as_uuid());
            }
            claimed
        }));
    }

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.await.unwrap());
    }

    assert_eq!(all.len(), total, "every job claimed exactly once");
    assert_eq!(all.iter().copied().collect::<HashSet<_>>(), expected);
}

#[tokio::test]
async fn given_failures_then_rearmed_until_attempts_exhausted() {
    let queue = MemoryJobQueue::new();
    let j = job();
    queue.enqueue(&j).await.unwrap();

    // Attempts 1 and 2 re-arm the job.
    for attempt in 1..=2 {
        let claimed = queue.claim_next().await.unwrap().unwrap();
        assert_eq!(claimed.attempts, attempt);
        let status = queue
            .record_failure(j.id, "download: recording not available")
            .await
            .unwrap();
        assert_eq!(status, JobStatus::Pending);
    }

    // Third failure is terminal.
    let claimed = queue.claim_next().await.unwrap().unwrap();
    assert_eq!(claimed.attempts, 3);
    let status = queue
        .record_failure(j.id, "download: recording not available")
        .await
        .unwrap();
    assert_eq!(status, JobStatus::Failed);

    let terminal = queue.get_by_id(j.id).await.unwrap().unwrap();
    assert_eq!(terminal.status, JobStatus::Failed);
    assert_eq!(
        terminal.error_message.as_deref(),
        Some("download: recording not available")
    );
    assert!(terminal.completed_at.is_some());

    assert!(queue.claim_next().await.unwrap().is_none());
}

#[tokio::test]
async fn given_completed_job_then_result_retained() {
    let queue = MemoryJobQueue::new();
    let j = job();
    queue.enqueue(&j).await.unwrap();

    queue.claim_next().await.unwrap().unwrap();
    queue
        .complete(j.id, serde_json::json!({"recording_bytes": 1024}))
        .await
        .unwrap();

    let done = queue.get_by_id(j.id).await.unwrap().unwrap();
    assert_eq!(done.status, JobStatus::Completed);
    assert!(done.completed_at.is_some());
    assert_eq!(done.result.unwrap()["recording_bytes"], 1024);
}

#[tokio::test]
async fn given_stale_processing_job_then_reset_exactly_once() {
    let queue = MemoryJobQueue::new();
    let j = job();
    queue.enqueue(&j).await.unwrap();
    queue.claim_next().await.unwrap().unwrap();

    // Zero threshold makes the just-claimed job count as stale.
    let reset = queue.reset_stale(Duration::from_secs(0)).await.unwrap();
    assert_eq!(reset, 1);

    let rearmed = queue.get_by_id(j.id).await.unwrap().unwrap();
    assert_eq!(rearmed.status, JobStatus::Pending);
    assert!(rearmed.started_at.is_none());

    // Idempotent: nothing newly stale on a second sweep.
    let reset_again = queue.reset_stale(Duration::from_secs(0)).await.unwrap();
    assert_eq!(reset_again, 0);
}

#[tokio::test]
async fn given_fresh_processing_job_then_not_reset() {
    let queue = MemoryJobQueue::new();
    let j = job();
    queue.enqueue(&j).await.unwrap();
    queue.claim_next().await.unwrap().unwrap();

    let reset = queue.reset_stale(Duration::from_secs(600)).await.unwrap();
    assert_eq!(reset, 0);

    let still = queue.get_by_id(j.id).await.unwrap().unwrap();
    assert_eq!(still.status, JobStatus::Processing);
}
