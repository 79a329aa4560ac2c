mod helpers;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use kuching::application::ports::{CallRepository, JobQueue, RepositoryError};
use kuching::domain::{Job, JobStatus};

use helpers::test_postgres::TestPostgres;

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn given_mixed_priorities_when_claiming_then_priority_then_age_order() {
    let pg = TestPostgres::new().await;
    let connection = pg.seed_connection().await;

    let first = pg.seed_call_record(&connection, "pg-claim-1").await;
    let second = pg.seed_call_record(&connection, "pg-claim-2").await;
    let third = pg.seed_call_record(&connection, "pg-claim-3").await;

    let job_a = Job::new(connection.tenant_id, first.id);
    let job_b = Job::new(connection.tenant_id, second.id).with_priority(1);
    let job_c = Job::new(connection.tenant_id, third.id);

    pg.job_queue.enqueue(&job_a).await.unwrap();
    pg.job_queue.enqueue(&job_b).await.unwrap();
    pg.job_queue.enqueue(&job_c).await.unwrap();

    let claims = [
        pg.job_queue.claim_next().await.unwrap().unwrap(),
        pg.job_queue.claim_next().await.unwrap().unwrap(),
        pg.job_queue.claim_next().await.unwrap().unwrap(),
    ];

    assert_eq!(claims[0].id, job_b.id, "lowest priority value first");
    assert_eq!(claims[1].id, job_a.id, "then oldest within priority");
    assert_eq!(claims[2].id, job_c.id);
    assert!(pg.job_queue.claim_next().await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn given_concurrent_workers_then_each_job_claimed_exactly_once() {
    let pg = TestPostgres::new().await;
    let connection = pg.seed_connection().await;

    let total = 12;
    let mut expected = HashSet::new();
    for i in 0..total {
        let record = pg
            .seed_call_record(&connection, &format!("pg-conc-{}", i))
            .await;
        let job = Job::new(connection.tenant_id, record.id);
        expected.insert(job.id.as_uuid());
        pg.job_queue.enqueue(&job).await.unwrap();
    }

    let queue = Arc::new(pg.job_queue);
    let mut handles = Vec::new();
    for _ in 0..4 {
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

    assert_eq!(all.len(), total);
    assert_eq!(all.iter().copied().collect::<HashSet<_>>(), expected);
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn given_repeated_failures_then_rearm_until_terminal() {
    let pg = TestPostgres::new().await;
    let connection = pg.seed_connection().await;
    let record = pg.seed_call_record(&connection, "pg-fail-1").await;

    let job = Job::new(connection.tenant_id, record.id);
    pg.job_queue.enqueue(&job).await.unwrap();

    for _ in 0..2 {
        pg.job_queue.claim_next().await.unwrap().unwrap();
        let status = pg
            .job_queue
            .record_failure(job.id, "transcription: provider error")
            .await
            .unwrap();
        assert_eq!(status, JobStatus::Pending);
    }

    pg.job_queue.claim_next().await.unwrap().unwrap();
    let status = pg
        .job_queue
        .record_failure(job.id, "transcription: provider error")
        .await
        .unwrap();
    assert_eq!(status, JobStatus::Failed);

    let terminal = pg.job_queue.get_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(terminal.attempts, 3);
    assert_eq!(
        terminal.error_message.as_deref(),
        Some("transcription: provider error")
    );
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn given_stale_processing_job_then_swept_back_to_pending_once() {
    let pg = TestPostgres::new().await;
    let connection = pg.seed_connection().await;
    let record = pg.seed_call_record(&connection, "pg-stale-1").await;

    let job = Job::new(connection.tenant_id, record.id);
    pg.job_queue.enqueue(&job).await.unwrap();
    pg.job_queue.claim_next().await.unwrap().unwrap();

    sqlx::query("UPDATE jobs SET started_at = now() - interval '20 minutes' WHERE id = $1")
        .bind(job.id.as_uuid())
        .execute(&pg.pool)
        .await
        .unwrap();

    let reset = pg
        .job_queue
        .reset_stale(Duration::from_secs(600))
        .await
        .unwrap();
    assert_eq!(reset, 1);

    let rearmed = pg.job_queue.get_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(rearmed.status, JobStatus::Pending);
    assert!(rearmed.started_at.is_none());

    let reset_again = pg
        .job_queue
        .reset_stale(Duration::from_secs(600))
        .await
        .unwrap();
    assert_eq!(reset_again, 0);
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn given_duplicate_uniqueid_for_tenant_then_constraint_violation() {
    let pg = TestPostgres::new().await;
    let connection = pg.seed_connection().await;

    pg.seed_call_record(&connection, "pg-dup-1").await;

    let duplicate = kuching::domain::CallRecord::new(
        connection.tenant_id,
        connection.id,
        "pg-dup-1".to_string(),
        "15551230001".to_string(),
        "2001".to_string(),
        kuching::domain::CallDirection::Inbound,
        kuching::domain::CallDisposition::Answered,
        chrono::Utc::now(),
        None,
        None,
        10,
        None,
    );

    let err = pg.call_repository.create(&duplicate).await.unwrap_err();
    assert!(matches!(err, RepositoryError::ConstraintViolation(_)));
}
