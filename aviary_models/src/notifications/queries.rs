use uuid::Uuid;

use crate::database::{DatabaseClient, DatabaseError};

use super::types::NotificationType;

pub async fn create_notification(
    db_client: &impl DatabaseClient,
    recipient_actor_id: Uuid,
    notification_type: NotificationType,
    sender_actor_id: Option<Uuid>,
    message_id: Option<Uuid>,
) -> Result<(), DatabaseError> {
    let notification_id = Uuid::new_v4();
    db_client.execute(
        "
        INSERT INTO notification (
            id,
            recipient_actor_id,
            notification_type,
            sender_actor_id,
            message_id
        )
        VALUES ($1, $2, $3, $4, $5)
        ",
        &[
            &notification_id,
            &recipient_actor_id,
            &notification_type,
            &sender_actor_id,
            &message_id,
        ],
    ).await?;
    Ok(())
}

/// Notifies every local admin-flagged actor (used for moderation reports)
pub async fn create_admin_notifications(
    db_client: &impl DatabaseClient,
    notification_type: NotificationType,
    sender_actor_id: Option<Uuid>,
) -> Result<(), DatabaseError> {
    db_client.execute(
        "
        INSERT INTO notification (
            id,
            recipient_actor_id,
            notification_type,
            sender_actor_id
        )
        SELECT gen_random_uuid(), actor.id, $1, $2
        FROM actor
        WHERE actor.is_local = TRUE
            AND (actor.metadata ->> 'is_admin')::boolean IS TRUE
        ",
        &[&notification_type, &sender_actor_id],
    ).await?;
    Ok(())
}
