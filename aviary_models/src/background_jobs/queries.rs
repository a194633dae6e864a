use chrono::{DateTime, Duration, Utc};
use serde_json::{Value as JsonValue};
use uuid::Uuid;

use crate::database::{DatabaseClient, DatabaseError};

use super::types::{DbBackgroundJob, JobPriority, JobQueue, JobStatus};

pub async fn enqueue_job(
    db_client: &impl DatabaseClient,
    queue: JobQueue,
    job_data: &JsonValue,
    priority: JobPriority,
    scheduled_for: DateTime<Utc>,
) -> Result<Uuid, DatabaseError> {
    let job_id = Uuid::new_v4();
    db_client.execute(
        "
        INSERT INTO background_job (
            id,
            queue,
            job_data,
            job_status,
            priority,
            scheduled_for
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        ",
        &[
            &job_id,
            &queue,
            &job_data,
            &JobStatus::Queued,
            &priority,
            &scheduled_for,
        ],
    ).await?;
    Ok(job_id)
}

/// Leases a batch of due jobs, FIFO within priority.
/// Running jobs whose executor died are reclaimed after `job_timeout`.
pub async fn get_job_batch(
    db_client: &impl DatabaseClient,
    queue: JobQueue,
    batch_size: u32,
    job_timeout: u32,
) -> Result<Vec<DbBackgroundJob>, DatabaseError> {
    let now = Utc::now();
    let reclaim_before = now - Duration::seconds(job_timeout.into());
    let batch_size: i64 = batch_size.into();
    let rows = db_client.query(
        "
        UPDATE background_job
        SET job_status = $1, updated_at = $2
        WHERE id IN (
            SELECT id FROM background_job
            WHERE queue = $3
                AND (
                    job_status = $4 AND scheduled_for <= $2
                    OR job_status = $1 AND updated_at < $5
                )
            ORDER BY priority, created_at
            LIMIT $6
            FOR UPDATE SKIP LOCKED
        )
        RETURNING background_job.*
        ",
        &[
            &JobStatus::Running,
            &now,
            &queue,
            &JobStatus::Queued,
            &reclaim_before,
            &batch_size,
        ],
    ).await?;
    let mut jobs: Vec<DbBackgroundJob> = rows.iter()
        .map(DbBackgroundJob::try_from_row)
        .collect::<Result<_, _>>()?;
    // RETURNING does not preserve the subquery order
    jobs.sort_by_key(|job| (job.priority, job.created_at));
    Ok(jobs)
}

pub async fn delete_job_from_queue(
    db_client: &impl DatabaseClient,
    job_id: Uuid,
) -> Result<(), DatabaseError> {
    db_client.execute(
        "DELETE FROM background_job WHERE id = $1",
        &[&job_id],
    ).await?;
    Ok(())
}

/// Re-queues a failed job, consuming an attempt
pub async fn retry_job(
    db_client: &impl DatabaseClient,
    job_id: Uuid,
    retry_after_seconds: u32,
) -> Result<(), DatabaseError> {
    let scheduled_for =
        Utc::now() + Duration::seconds(retry_after_seconds.into());
    db_client.execute(
        "
        UPDATE background_job
        SET job_status = $2, attempt = attempt + 1, scheduled_for = $3
        WHERE id = $1
        ",
        &[&job_id, &JobStatus::Queued, &scheduled_for],
    ).await?;
    Ok(())
}

/// Removes jobs that have been sitting in a queue for too long
pub async fn delete_stale_jobs(
    db_client: &impl DatabaseClient,
    queue: JobQueue,
    max_age_seconds: u32,
) -> Result<u64, DatabaseError> {
    let threshold = Utc::now() - Duration::seconds(max_age_seconds.into());
    let deleted_count = db_client.execute(
        "
        DELETE FROM background_job
        WHERE queue = $1 AND created_at < $2
        ",
        &[&queue, &threshold],
    ).await?;
    Ok(deleted_count)
}
