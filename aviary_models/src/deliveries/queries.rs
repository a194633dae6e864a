use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::database::{DatabaseClient, DatabaseError};

use super::types::{DbDelivery, DeliveryStatus};

pub async fn create_delivery(
    db_client: &impl DatabaseClient,
    activity_id: Uuid,
    inbox_url: &str,
) -> Result<DbDelivery, DatabaseError> {
    let delivery_id = Uuid::new_v4();
    let row = db_client.query_one(
        "
        INSERT INTO delivery (id, activity_id, inbox_url, status)
        VALUES ($1, $2, $3, $4)
        RETURNING delivery.*
        ",
        &[
            &delivery_id,
            &activity_id,
            &inbox_url,
            &DeliveryStatus::Pending,
        ],
    ).await?;
    let delivery = DbDelivery::try_from_row(&row)?;
    Ok(delivery)
}

pub async fn get_delivery_by_id(
    db_client: &impl DatabaseClient,
    delivery_id: Uuid,
) -> Result<DbDelivery, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "SELECT delivery.* FROM delivery WHERE id = $1",
        &[&delivery_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("delivery"))?;
    let delivery = DbDelivery::try_from_row(&row)?;
    Ok(delivery)
}

/// Marks a delivery as delivered.
/// The transition happens at most once; a repeated call is a no-op.
pub async fn mark_delivery_delivered(
    db_client: &impl DatabaseClient,
    delivery_id: Uuid,
) -> Result<bool, DatabaseError> {
    let updated_count = db_client.execute(
        "
        UPDATE delivery
        SET
            status = $2,
            attempts = attempts + 1,
            last_attempt_at = $3,
            next_retry_at = NULL,
            error_message = NULL
        WHERE id = $1 AND status = $4
        ",
        &[
            &delivery_id,
            &DeliveryStatus::Delivered,
            &Utc::now(),
            &DeliveryStatus::Pending,
        ],
    ).await?;
    Ok(updated_count > 0)
}

/// Marks a delivery as failed without scheduling a retry (terminal failure)
pub async fn mark_delivery_failed(
    db_client: &impl DatabaseClient,
    delivery_id: Uuid,
    error_message: &str,
) -> Result<(), DatabaseError> {
    db_client.execute(
        "
        UPDATE delivery
        SET
            status = $2,
            attempts = attempts + 1,
            last_attempt_at = $3,
            next_retry_at = NULL,
            error_message = $4
        WHERE id = $1
        ",
        &[
            &delivery_id,
            &DeliveryStatus::Failed,
            &Utc::now(),
            &error_message,
        ],
    ).await?;
    Ok(())
}

/// Records a transient failure and schedules the next attempt.
/// The row stays pending so the retry scheduler can pick it up.
pub async fn schedule_delivery_retry(
    db_client: &impl DatabaseClient,
    delivery_id: Uuid,
    error_message: &str,
    next_retry_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    db_client.execute(
        "
        UPDATE delivery
        SET
            attempts = attempts + 1,
            last_attempt_at = $2,
            next_retry_at = $3,
            error_message = $4
        WHERE id = $1
        ",
        &[
            &delivery_id,
            &Utc::now(),
            &next_retry_at,
            &error_message,
        ],
    ).await?;
    Ok(())
}

/// Returns pending deliveries whose retry time has passed
pub async fn get_due_deliveries(
    db_client: &impl DatabaseClient,
    max_attempts: u32,
    limit: u32,
) -> Result<Vec<DbDelivery>, DatabaseError> {
    let max_attempts: i32 = max_attempts.try_into()
        .map_err(|_| DatabaseError::type_error())?;
    let limit: i64 = limit.into();
    let rows = db_client.query(
        "
        SELECT delivery.* FROM delivery
        WHERE
            status = $1
            AND next_retry_at IS NOT NULL
            AND next_retry_at <= $2
            AND attempts < $3
        ORDER BY next_retry_at
        LIMIT $4
        ",
        &[
            &DeliveryStatus::Pending,
            &Utc::now(),
            &max_attempts,
            &limit,
        ],
    ).await?;
    let deliveries = rows.iter()
        .map(DbDelivery::try_from_row)
        .collect::<Result<_, _>>()?;
    Ok(deliveries)
}

/// Hands a pending delivery to the retry scheduler without
/// counting an attempt
pub async fn set_delivery_next_retry(
    db_client: &impl DatabaseClient,
    delivery_id: Uuid,
    next_retry_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    db_client.execute(
        "UPDATE delivery SET next_retry_at = $2 WHERE id = $1",
        &[&delivery_id, &next_retry_at],
    ).await?;
    Ok(())
}

pub async fn delete_old_failed_deliveries(
    db_client: &impl DatabaseClient,
    older_than_days: u32,
) -> Result<u64, DatabaseError> {
    let threshold = Utc::now() - Duration::days(older_than_days.into());
    let deleted_count = db_client.execute(
        "
        DELETE FROM delivery
        WHERE status = $1 AND last_attempt_at < $2
        ",
        &[&DeliveryStatus::Failed, &threshold],
    ).await?;
    Ok(deleted_count)
}
