use serde::Deserialize;
use serde_json::{Value as JsonValue};

use aviary_fetch::fetch::FetchError;
use aviary_models::{
    database::{DatabaseClient, DatabaseError},
    interactions::queries::create_interaction,
    interactions::types::InteractionType,
    messages::queries::{
        change_message_counter,
        get_message_by_activitypub_id,
        MessageCounter,
    },
    notifications::types::NotificationType,
};
use aviary_validators::errors::ValidationError;

use crate::{
    deserialization::deserialize_into_object_id,
    errors::HandlerError,
    side_effects::SideEffect,
    vocabulary::{DISLIKE, EMOJI_REACT, LIKE},
};

use super::{HandlerContext, HandlerResult};

#[derive(Deserialize)]
struct Like {
    id: String,
    #[serde(rename = "type")]
    activity_type: String,
    #[serde(deserialize_with = "deserialize_into_object_id")]
    actor: String,
    #[serde(deserialize_with = "deserialize_into_object_id")]
    object: String,
    content: Option<String>,
}

pub(super) fn interaction_type_for(
    activity_type: &str,
) -> Option<InteractionType> {
    match activity_type {
        LIKE => Some(InteractionType::Like),
        DISLIKE => Some(InteractionType::Dislike),
        EMOJI_REACT => Some(InteractionType::EmojiReact),
        _ => None,
    }
}

pub(super) fn counter_for(interaction_type: InteractionType) -> MessageCounter {
    match interaction_type {
        InteractionType::Like => MessageCounter::Like,
        InteractionType::Dislike => MessageCounter::Dislike,
        InteractionType::EmojiReact => MessageCounter::Like,
        InteractionType::Announce => MessageCounter::Share,
    }
}

/// Like, Dislike and EmojiReact
pub async fn handle_like(
    context: &mut HandlerContext<'_>,
    db_client: &impl DatabaseClient,
    activity: JsonValue,
    actor_uri: &str,
) -> HandlerResult {
    let activity: Like = serde_json::from_value(activity)?;
    if activity.actor != actor_uri {
        return Err(ValidationError("actor mismatch").into());
    };
    let interaction_type = interaction_type_for(&activity.activity_type)
        .ok_or(ValidationError("unexpected activity type"))?;
    if interaction_type == InteractionType::EmojiReact &&
        activity.content.is_none()
    {
        return Err(ValidationError("EmojiReact without content").into());
    };

    // Reactions to unknown posts are dropped, not retried
    let message = match get_message_by_activitypub_id(
        db_client,
        &activity.object,
    ).await {
        Ok(message) => message,
        Err(DatabaseError::NotFound(_)) => {
            return Err(HandlerError::FetchError(
                FetchError::NotFound(activity.object),
            ));
        },
        Err(other_error) => return Err(other_error.into()),
    };

    let emoji = match interaction_type {
        InteractionType::EmojiReact => activity.content.as_deref(),
        _ => None,
    };
    match create_interaction(
        db_client,
        message.id,
        &activity.actor,
        Some(&activity.id),
        interaction_type,
        emoji,
    ).await {
        Ok(_) => (),
        // Replay; the count was already adjusted
        Err(DatabaseError::AlreadyExists(_)) => return Ok(Some("Duplicate")),
        Err(other_error) => return Err(other_error.into()),
    };
    change_message_counter(
        db_client,
        message.id,
        counter_for(interaction_type),
        1,
    ).await?;
    context.push_effect(SideEffect::Notify {
        recipient_actor_id: message.author_actor_id,
        notification_type: NotificationType::Like,
        sender_actor_id: None,
        message_id: Some(message.id),
    });
    Ok(Some("Object"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_type_for() {
        assert_eq!(interaction_type_for("Like"), Some(InteractionType::Like));
        assert_eq!(
            interaction_type_for("EmojiReact"),
            Some(InteractionType::EmojiReact),
        );
        assert_eq!(interaction_type_for("Follow"), None);
    }
}
