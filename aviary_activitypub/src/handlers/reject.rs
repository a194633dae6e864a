use serde::Deserialize;
use serde_json::{Value as JsonValue};

use aviary_models::{
    actors::queries::get_actor_by_uri,
    database::{DatabaseClient, DatabaseError},
    follows::queries::{get_follow_by_activity_id, set_follow_status},
    follows::types::FollowStatus,
};
use aviary_validators::errors::ValidationError;

use crate::deserialization::deserialize_into_object_id;
use crate::relay::handle_relay_reject;

use super::{HandlerContext, HandlerResult};

#[derive(Deserialize)]
struct Reject {
    #[serde(deserialize_with = "deserialize_into_object_id")]
    actor: String,
    #[serde(deserialize_with = "deserialize_into_object_id")]
    object: String,
}

/// Reject(Follow): a remote actor denied a local follow request
pub async fn handle_reject(
    _context: &mut HandlerContext<'_>,
    db_client: &impl DatabaseClient,
    activity: JsonValue,
) -> HandlerResult {
    let activity_value = activity.clone();
    let activity: Reject = serde_json::from_value(activity)?;

    if handle_relay_reject(db_client, &activity_value).await? {
        return Ok(Some("Relay"));
    };

    let follow = match get_follow_by_activity_id(
        db_client,
        &activity.object,
    ).await {
        Ok(follow) => follow,
        Err(DatabaseError::NotFound(_)) => return Ok(None),
        Err(other_error) => return Err(other_error.into()),
    };
    let rejecting_actor = get_actor_by_uri(db_client, &activity.actor).await?;
    if follow.target_actor_id != rejecting_actor.id {
        return Err(ValidationError("actor is not the follow target").into());
    };
    set_follow_status(db_client, follow.id, FollowStatus::Rejected).await?;
    Ok(Some("Follow"))
}
