use serde::Deserialize;
use serde_json::{Value as JsonValue};

use aviary_models::{
    actors::queries::get_actor_by_id,
    database::{DatabaseClient, DatabaseError},
    messages::queries::{
        change_message_counter,
        get_message_by_activitypub_id,
        get_message_by_id,
        soft_delete_message,
        MessageCounter,
    },
};

use crate::deserialization::deserialize_into_object_id;

use super::{HandlerContext, HandlerResult};

#[derive(Deserialize)]
struct Delete {
    #[serde(deserialize_with = "deserialize_into_object_id")]
    actor: String,
    // A bare URI or a Tombstone
    #[serde(deserialize_with = "deserialize_into_object_id")]
    object: String,
}

pub async fn handle_delete(
    context: &mut HandlerContext<'_>,
    db_client: &impl DatabaseClient,
    activity: JsonValue,
    actor_uri: &str,
) -> HandlerResult {
    let activity: Delete = serde_json::from_value(activity)?;
    let message = match get_message_by_activitypub_id(
        db_client,
        &activity.object,
    ).await {
        Ok(message) => message,
        // The object was never stored here
        Err(DatabaseError::NotFound(_)) => return Ok(None),
        Err(other_error) => return Err(other_error.into()),
    };
    // Deletes from anyone but the owner are dropped silently
    let author = get_actor_by_id(db_client, message.author_actor_id).await?;
    if author.uri != activity.actor || activity.actor != actor_uri {
        log::warn!(
            "ignoring Delete of {} from non-owner {}",
            activity.object,
            actor_uri,
        );
        return Ok(None);
    };
    soft_delete_message(db_client, message.id).await?;
    if let Some(parent_id) = message.reply_to_id {
        match get_message_by_id(db_client, parent_id).await {
            Ok(parent) => {
                change_message_counter(
                    db_client,
                    parent.id,
                    MessageCounter::Reply,
                    -1,
                ).await?;
            },
            Err(DatabaseError::NotFound(_)) => (),
            Err(other_error) => return Err(other_error.into()),
        };
    };
    // Drop the cached copy along with the local one
    context.object_cache().invalidate(&activity.object).await;
    Ok(Some("Object"))
}
