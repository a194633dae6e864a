use serde::Deserialize;
use serde_json::{Value as JsonValue};

use aviary_models::{
    actors::queries::get_actor_by_id,
    database::{DatabaseClient, DatabaseError},
    messages::queries::{
        get_message_by_activitypub_id,
        update_message_content,
    },
};
use aviary_validators::activitypub::is_content_type;
use aviary_validators::errors::ValidationError;

use crate::{
    content::html_to_text,
    deserialization::deserialize_into_object_id,
    importers::import_actor,
};

use super::{HandlerContext, HandlerResult};

const ACTOR_TYPES: [&str; 5] = [
    "Person",
    "Group",
    "Service",
    "Application",
    "Organization",
];

#[derive(Deserialize)]
struct Update {
    #[serde(deserialize_with = "deserialize_into_object_id")]
    actor: String,
    object: JsonValue,
}

pub async fn handle_update(
    context: &mut HandlerContext<'_>,
    db_client: &impl DatabaseClient,
    activity: JsonValue,
    actor_uri: &str,
) -> HandlerResult {
    let activity: Update = serde_json::from_value(activity)?;
    if activity.actor != actor_uri {
        return Err(ValidationError("actor mismatch").into());
    };
    let object_type = activity.object["type"].as_str()
        .ok_or(ValidationError("object without type"))?;

    if ACTOR_TYPES.contains(&object_type) {
        // Profile update: overwrite the cached actor
        let updated_actor_id = activity.object["id"].as_str()
            .ok_or(ValidationError("actor object without ID"))?;
        if updated_actor_id != actor_uri {
            return Err(ValidationError("cannot update another actor").into());
        };
        let actor = import_actor(db_client, &activity.object).await?;
        context.object_cache().invalidate(&actor.uri).await;
        log::info!("updated actor {}", actor.uri);
        return Ok(Some("Actor"));
    };

    if !is_content_type(object_type) {
        log::warn!("Update({}) is not supported", object_type);
        return Ok(None);
    };
    let object_id = activity.object["id"].as_str()
        .ok_or(ValidationError("object without ID"))?;
    let message = match get_message_by_activitypub_id(db_client, object_id).await {
        Ok(message) => message,
        Err(DatabaseError::NotFound(_)) => return Ok(None),
        Err(other_error) => return Err(other_error.into()),
    };
    // Edits from anyone but the owner are dropped silently
    let author = get_actor_by_id(db_client, message.author_actor_id).await?;
    if author.uri != actor_uri {
        log::warn!("ignoring Update of {} from non-owner", object_id);
        return Ok(None);
    };
    let content = activity.object["content"].as_str()
        .map(html_to_text)
        .unwrap_or_default();
    update_message_content(
        db_client,
        message.id,
        &content,
        activity.object["sensitive"].as_bool().unwrap_or(message.sensitive),
        activity.object["summary"].as_str(),
    ).await?;
    context.object_cache().invalidate(object_id).await;
    Ok(Some("Object"))
}
