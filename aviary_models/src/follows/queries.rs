use uuid::Uuid;

use crate::database::{DatabaseClient, DatabaseError};

use super::types::{DbFollow, FollowStatus};

/// Creates a follow or updates the activity ID on an existing one,
/// because the latest activity ID may be needed to process Undo(Follow)
pub async fn create_follow(
    db_client: &impl DatabaseClient,
    source_actor_id: Uuid,
    target_actor_id: Uuid,
    activity_id: Option<&str>,
    status: FollowStatus,
) -> Result<DbFollow, DatabaseError> {
    let follow_id = Uuid::new_v4();
    let row = db_client.query_one(
        "
        INSERT INTO follow (
            id,
            source_actor_id,
            target_actor_id,
            activity_id,
            status
        )
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (source_actor_id, target_actor_id)
        DO UPDATE SET activity_id = COALESCE($4, follow.activity_id)
        RETURNING follow.*
        ",
        &[
            &follow_id,
            &source_actor_id,
            &target_actor_id,
            &activity_id,
            &status,
        ],
    ).await?;
    let follow = DbFollow::try_from_row(&row)?;
    Ok(follow)
}

pub async fn get_follow_by_activity_id(
    db_client: &impl DatabaseClient,
    activity_id: &str,
) -> Result<DbFollow, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "SELECT follow.* FROM follow WHERE activity_id = $1",
        &[&activity_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("follow"))?;
    let follow = DbFollow::try_from_row(&row)?;
    Ok(follow)
}

pub async fn get_follow_by_pair(
    db_client: &impl DatabaseClient,
    source_actor_id: Uuid,
    target_actor_id: Uuid,
) -> Result<DbFollow, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        SELECT follow.* FROM follow
        WHERE source_actor_id = $1 AND target_actor_id = $2
        ",
        &[&source_actor_id, &target_actor_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("follow"))?;
    let follow = DbFollow::try_from_row(&row)?;
    Ok(follow)
}

/// Returns the only pending follow toward an actor, if any
pub async fn get_pending_follow_by_target(
    db_client: &impl DatabaseClient,
    target_actor_id: Uuid,
) -> Result<DbFollow, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        SELECT follow.* FROM follow
        WHERE target_actor_id = $1 AND status = $2
        ORDER BY created_at
        LIMIT 1
        ",
        &[&target_actor_id, &FollowStatus::Pending],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("follow"))?;
    let follow = DbFollow::try_from_row(&row)?;
    Ok(follow)
}

pub async fn set_follow_status(
    db_client: &impl DatabaseClient,
    follow_id: Uuid,
    status: FollowStatus,
) -> Result<(), DatabaseError> {
    let updated_count = db_client.execute(
        "UPDATE follow SET status = $2 WHERE id = $1",
        &[&follow_id, &status],
    ).await?;
    if updated_count == 0 {
        return Err(DatabaseError::NotFound("follow"));
    };
    Ok(())
}

pub async fn delete_follow(
    db_client: &impl DatabaseClient,
    follow_id: Uuid,
) -> Result<(), DatabaseError> {
    db_client.execute(
        "DELETE FROM follow WHERE id = $1",
        &[&follow_id],
    ).await?;
    Ok(())
}

/// Returns inboxes of the remote followers of a local actor
pub async fn get_follower_inboxes(
    db_client: &impl DatabaseClient,
    target_actor_id: Uuid,
) -> Result<Vec<String>, DatabaseError> {
    let rows = db_client.query(
        "
        SELECT actor.inbox_url FROM follow
        JOIN actor ON actor.id = follow.source_actor_id
        WHERE
            follow.target_actor_id = $1
            AND follow.status = $2
            AND actor.is_local = FALSE
        ",
        &[&target_actor_id, &FollowStatus::Active],
    ).await?;
    let inboxes = rows.iter()
        .map(|row| row.try_get("inbox_url"))
        .collect::<Result<_, _>>()?;
    Ok(inboxes)
}
