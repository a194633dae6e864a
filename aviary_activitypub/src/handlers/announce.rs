use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde::Deserialize;
use serde_json::{Value as JsonValue};

use aviary_models::{
    database::{DatabaseClient, DatabaseError},
    interactions::queries::create_interaction,
    interactions::types::InteractionType,
    messages::queries::{change_message_counter, MessageCounter},
    notifications::types::NotificationType,
};
use aviary_validators::errors::ValidationError;

use crate::{
    deserialization::deserialize_into_object_id,
    importers::get_or_import_message_by_object_id,
    side_effects::SideEffect,
};

use super::activity::handle_activity;
use super::{HandlerContext, HandlerResult};

#[derive(Deserialize)]
struct Announce {
    id: String,
    #[serde(deserialize_with = "deserialize_into_object_id")]
    actor: String,
    #[serde(deserialize_with = "deserialize_into_object_id")]
    object: String,
}

pub async fn handle_announce(
    context: &mut HandlerContext<'_>,
    db_client: &impl DatabaseClient,
    activity: JsonValue,
    actor_uri: &str,
) -> HandlerResult {
    // Group actors announce wrapped activities (FEP-1b12);
    // process the inner activity under its own actor
    if let Some(inner_type) = activity["object"]["type"].as_str() {
        if !aviary_validators::activitypub::is_content_type(inner_type) {
            let inner = activity["object"].clone();
            let inner_actor = inner["actor"].as_str()
                .ok_or(ValidationError("embedded activity without actor"))?
                .to_string();
            // Type-erased box: the dispatcher recurses into itself here
            let inner_future: Pin<Box<
                dyn Future<Output = HandlerResult> + Send + '_
            >> = Box::pin(handle_activity(
                context,
                db_client,
                &inner,
                &inner_actor,
                None,
            ));
            return inner_future.await;
        };
    };

    let announce: Announce = serde_json::from_value(activity)?;
    if announce.actor != actor_uri {
        return Err(ValidationError("actor mismatch").into());
    };
    let message = get_or_import_message_by_object_id(
        context,
        db_client,
        &announce.object,
    ).await?;
    match create_interaction(
        db_client,
        message.id,
        &announce.actor,
        Some(&announce.id),
        InteractionType::Announce,
        None,
    ).await {
        Ok(_) => (),
        Err(DatabaseError::AlreadyExists(_)) => return Ok(Some("Duplicate")),
        Err(other_error) => return Err(other_error.into()),
    };
    change_message_counter(
        db_client,
        message.id,
        MessageCounter::Share,
        1,
    ).await?;
    context.push_effect(SideEffect::Notify {
        recipient_actor_id: message.author_actor_id,
        notification_type: NotificationType::Share,
        sender_actor_id: None,
        message_id: Some(message.id),
    });
    Ok(Some("Object"))
}
