use uuid::Uuid;

use crate::database::{
    catch_unique_violation,
    DatabaseClient,
    DatabaseError,
};

use super::types::{DbInteraction, InteractionType};

/// Records a remote interaction.
/// Replays violate the `(message, actor, type, emoji)` constraint
/// and surface as `AlreadyExists`.
pub async fn create_interaction(
    db_client: &impl DatabaseClient,
    message_id: Uuid,
    actor_uri: &str,
    activity_id: Option<&str>,
    interaction_type: InteractionType,
    emoji: Option<&str>,
) -> Result<DbInteraction, DatabaseError> {
    let interaction_id = Uuid::new_v4();
    let row = db_client.query_one(
        "
        INSERT INTO remote_interaction (
            id,
            message_id,
            actor_uri,
            activity_id,
            interaction_type,
            emoji
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING remote_interaction.*
        ",
        &[
            &interaction_id,
            &message_id,
            &actor_uri,
            &activity_id,
            &interaction_type,
            &emoji.unwrap_or(""),
        ],
    ).await.map_err(catch_unique_violation("interaction"))?;
    let interaction = DbInteraction::try_from_row(&row)?;
    Ok(interaction)
}

pub async fn get_interaction_by_activity_id(
    db_client: &impl DatabaseClient,
    activity_id: &str,
) -> Result<DbInteraction, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        SELECT remote_interaction.* FROM remote_interaction
        WHERE activity_id = $1
        ",
        &[&activity_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("interaction"))?;
    let interaction = DbInteraction::try_from_row(&row)?;
    Ok(interaction)
}

pub async fn delete_interaction(
    db_client: &impl DatabaseClient,
    message_id: Uuid,
    actor_uri: &str,
    interaction_type: InteractionType,
    emoji: Option<&str>,
) -> Result<DbInteraction, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        DELETE FROM remote_interaction
        WHERE
            message_id = $1
            AND actor_uri = $2
            AND interaction_type = $3
            AND emoji = $4
        RETURNING remote_interaction.*
        ",
        &[&message_id, &actor_uri, &interaction_type, &emoji.unwrap_or("")],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("interaction"))?;
    let interaction = DbInteraction::try_from_row(&row)?;
    Ok(interaction)
}
