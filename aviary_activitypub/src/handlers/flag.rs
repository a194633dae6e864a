use serde::Deserialize;
use serde_json::{Value as JsonValue};

use aviary_models::{
    actors::queries::get_actor_by_uri,
    database::{DatabaseClient, DatabaseError},
    messages::queries::get_message_by_activitypub_id,
    notifications::types::NotificationType,
    reports::queries::create_report,
};
use aviary_validators::errors::ValidationError;

use crate::{
    deserialization::{deserialize_into_object_id, parse_string_array},
    side_effects::SideEffect,
};

use super::{HandlerContext, HandlerResult};

#[derive(Deserialize)]
struct Flag {
    #[serde(deserialize_with = "deserialize_into_object_id")]
    actor: String,
    object: JsonValue,
    content: Option<String>,
}

/// Creates a moderation report from a remote Flag.
/// Object URIs are sorted into a reported actor and reported messages.
pub async fn handle_flag(
    context: &mut HandlerContext<'_>,
    db_client: &impl DatabaseClient,
    activity: JsonValue,
    actor_uri: &str,
) -> HandlerResult {
    let activity: Flag = serde_json::from_value(activity)?;
    if activity.actor != actor_uri {
        return Err(ValidationError("actor mismatch").into());
    };
    let object_ids = parse_string_array(&activity.object);
    if object_ids.is_empty() {
        return Err(ValidationError("Flag without objects").into());
    };

    let mut target_actor_id = None;
    let mut message_ids = vec![];
    for object_id in &object_ids {
        match get_actor_by_uri(db_client, object_id).await {
            Ok(actor) if actor.is_local => {
                target_actor_id.get_or_insert(actor.id);
                continue;
            },
            Ok(_) => continue,
            Err(DatabaseError::NotFound(_)) => (),
            Err(other_error) => return Err(other_error.into()),
        };
        match get_message_by_activitypub_id(db_client, object_id).await {
            Ok(message) => message_ids.push(message.id),
            Err(DatabaseError::NotFound(_)) => (),
            Err(other_error) => return Err(other_error.into()),
        };
    };
    if target_actor_id.is_none() && message_ids.is_empty() {
        // Nothing reported exists here
        return Ok(None);
    };

    create_report(
        db_client,
        &activity.actor,
        target_actor_id,
        &message_ids,
        activity.content.as_deref().unwrap_or(""),
    ).await?;
    context.push_effect(SideEffect::NotifyAdmins {
        notification_type: NotificationType::Report,
        sender_actor_id: None,
    });
    log::info!("report received from {}", activity.actor);
    Ok(Some("Report"))
}
