use chrono::Utc;
use serde_json::{Value as JsonValue};
use uuid::Uuid;

use crate::database::{DatabaseClient, DatabaseError};

use super::types::DbActivity;

/// Saves an activity document. The insert is idempotent:
/// at most one row exists per external activity ID.
pub async fn create_activity(
    db_client: &impl DatabaseClient,
    activity_id: &str,
    activity_type: &str,
    actor_uri: &str,
    object_id: Option<&str>,
    data: &JsonValue,
    is_local: bool,
    internal_user_id: Option<Uuid>,
) -> Result<DbActivity, DatabaseError> {
    let id = Uuid::new_v4();
    // Never overwrite an existing document
    // (some servers produce activities and objects with the same ID)
    db_client.execute(
        "
        INSERT INTO activity (
            id,
            activity_id,
            activity_type,
            actor_uri,
            object_id,
            data,
            is_local,
            internal_user_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (activity_id) DO NOTHING
        ",
        &[
            &id,
            &activity_id,
            &activity_type,
            &actor_uri,
            &object_id,
            &data,
            &is_local,
            &internal_user_id,
        ],
    ).await?;
    get_activity_by_activity_id(db_client, activity_id).await
}

pub async fn get_activity_by_activity_id(
    db_client: &impl DatabaseClient,
    activity_id: &str,
) -> Result<DbActivity, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "SELECT activity.* FROM activity WHERE activity_id = $1",
        &[&activity_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("activity"))?;
    let activity = DbActivity::try_from_row(&row)?;
    Ok(activity)
}

pub async fn get_activity_by_id(
    db_client: &impl DatabaseClient,
    id: Uuid,
) -> Result<DbActivity, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "SELECT activity.* FROM activity WHERE id = $1",
        &[&id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("activity"))?;
    let activity = DbActivity::try_from_row(&row)?;
    Ok(activity)
}

pub async fn mark_activity_processed(
    db_client: &impl DatabaseClient,
    id: Uuid,
) -> Result<(), DatabaseError> {
    db_client.execute(
        "
        UPDATE activity
        SET processed = TRUE, processed_at = $2, process_error = NULL
        WHERE id = $1
        ",
        &[&id, &Utc::now()],
    ).await?;
    Ok(())
}

pub async fn record_activity_process_error(
    db_client: &impl DatabaseClient,
    id: Uuid,
    error_message: &str,
) -> Result<(), DatabaseError> {
    db_client.execute(
        "
        UPDATE activity
        SET process_error = $2, process_attempts = process_attempts + 1
        WHERE id = $1
        ",
        &[&id, &error_message],
    ).await?;
    Ok(())
}

pub async fn delete_activity(
    db_client: &impl DatabaseClient,
    id: Uuid,
) -> Result<(), DatabaseError> {
    db_client.execute(
        "DELETE FROM activity WHERE id = $1",
        &[&id],
    ).await?;
    Ok(())
}
