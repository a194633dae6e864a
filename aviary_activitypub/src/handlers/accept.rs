use serde::Deserialize;
use serde_json::{Value as JsonValue};

use aviary_models::{
    actors::queries::get_actor_by_uri,
    database::{DatabaseClient, DatabaseError},
    follows::queries::{
        get_follow_by_activity_id,
        get_pending_follow_by_target,
        set_follow_status,
    },
    follows::types::FollowStatus,
};
use aviary_validators::errors::ValidationError;

use crate::deserialization::deserialize_into_object_id;
use crate::relay::handle_relay_accept;

use super::{HandlerContext, HandlerResult};

#[derive(Deserialize)]
struct Accept {
    #[serde(deserialize_with = "deserialize_into_object_id")]
    actor: String,
    #[serde(deserialize_with = "deserialize_into_object_id")]
    object: String,
}

/// Accept(Follow): a remote actor approved a local follow request
pub async fn handle_accept(
    _context: &mut HandlerContext<'_>,
    db_client: &impl DatabaseClient,
    activity: JsonValue,
) -> HandlerResult {
    let activity_value = activity.clone();
    let activity: Accept = serde_json::from_value(activity)?;

    // Relay subscriptions are accepted through the same activity
    if handle_relay_accept(db_client, &activity_value).await? {
        return Ok(Some("Relay"));
    };

    // Find the follow by its activity ID; some servers put the
    // followed actor's URI into the object instead
    let follow = match get_follow_by_activity_id(
        db_client,
        &activity.object,
    ).await {
        Ok(follow) => follow,
        Err(DatabaseError::NotFound(_)) => {
            let target_actor = match get_actor_by_uri(
                db_client,
                &activity.object,
            ).await {
                Ok(actor) => actor,
                Err(DatabaseError::NotFound(_)) => return Ok(None),
                Err(other_error) => return Err(other_error.into()),
            };
            match get_pending_follow_by_target(
                db_client,
                target_actor.id,
            ).await {
                Ok(follow) => follow,
                Err(DatabaseError::NotFound(_)) => return Ok(None),
                Err(other_error) => return Err(other_error.into()),
            }
        },
        Err(other_error) => return Err(other_error.into()),
    };

    // Only the followed actor may accept
    let accepting_actor = get_actor_by_uri(db_client, &activity.actor).await?;
    if follow.target_actor_id != accepting_actor.id {
        return Err(ValidationError("actor is not the follow target").into());
    };
    set_follow_status(db_client, follow.id, FollowStatus::Active).await?;
    Ok(Some("Follow"))
}
