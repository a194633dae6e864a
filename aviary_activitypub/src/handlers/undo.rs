use serde::Deserialize;
use serde_json::{Value as JsonValue};

use aviary_models::{
    actors::queries::get_actor_by_uri,
    database::{DatabaseClient, DatabaseError},
    follows::queries::{delete_follow, get_follow_by_activity_id, get_follow_by_pair},
    interactions::queries::{delete_interaction, get_interaction_by_activity_id},
    interactions::types::{DbInteraction, InteractionType},
    messages::queries::{change_message_counter, get_message_by_activitypub_id},
};
use aviary_validators::errors::ValidationError;

use aviary_fetch::fetch::{fetch_object, FetchObjectOptions};

use crate::{
    deserialization::{deserialize_into_object_id, object_to_id},
    vocabulary::{ANNOUNCE, BLOCK, FOLLOW},
};

use super::block::remove_block;
use super::like::{counter_for, interaction_type_for};
use super::{HandlerContext, HandlerResult};

#[derive(Deserialize)]
struct Undo {
    #[serde(deserialize_with = "deserialize_into_object_id")]
    actor: String,
    object: JsonValue,
}

async fn undo_interaction(
    db_client: &impl DatabaseClient,
    interaction: DbInteraction,
    actor_uri: &str,
) -> HandlerResult {
    if interaction.actor_uri != actor_uri {
        return Err(ValidationError("actor is not the author").into());
    };
    let emoji = if interaction.emoji.is_empty() {
        None
    } else {
        Some(interaction.emoji.as_str())
    };
    match delete_interaction(
        db_client,
        interaction.message_id,
        &interaction.actor_uri,
        interaction.interaction_type,
        emoji,
    ).await {
        Ok(_) => (),
        // Undo replay
        Err(DatabaseError::NotFound(_)) => return Ok(None),
        Err(other_error) => return Err(other_error.into()),
    };
    change_message_counter(
        db_client,
        interaction.message_id,
        counter_for(interaction.interaction_type),
        -1,
    ).await?;
    Ok(Some("Object"))
}

/// Dispatches an Undo whose object activity is available as a map
async fn undo_embedded(
    db_client: &impl DatabaseClient,
    inner: &JsonValue,
    actor_uri: &str,
) -> HandlerResult {
    let inner_type = inner["type"].as_str()
        .ok_or(ValidationError("undone activity without type"))?;
    match inner_type {
        FOLLOW => {
            let source = get_actor_by_uri(db_client, actor_uri).await?;
            let follow = match inner["id"].as_str() {
                Some(follow_activity_id) => {
                    get_follow_by_activity_id(db_client, follow_activity_id).await
                },
                None => {
                    // Activity ID may be absent; use the follow pair
                    let target_uri = object_to_id(&inner["object"])
                        .map_err(ValidationError)?;
                    let target = get_actor_by_uri(db_client, &target_uri).await?;
                    get_follow_by_pair(db_client, source.id, target.id).await
                },
            };
            let follow = match follow {
                Ok(follow) => follow,
                Err(DatabaseError::NotFound(_)) => return Ok(None),
                Err(other_error) => return Err(other_error.into()),
            };
            if follow.source_actor_id != source.id {
                return Err(ValidationError("actor is not the follower").into());
            };
            delete_follow(db_client, follow.id).await?;
            Ok(Some(FOLLOW))
        },
        BLOCK => {
            let target_uri = object_to_id(&inner["object"])
                .map_err(ValidationError)?;
            remove_block(db_client, actor_uri, &target_uri).await?;
            Ok(Some(BLOCK))
        },
        ANNOUNCE => {
            let message_uri = object_to_id(&inner["object"])
                .map_err(ValidationError)?;
            let message = match get_message_by_activitypub_id(
                db_client,
                &message_uri,
            ).await {
                Ok(message) => message,
                Err(DatabaseError::NotFound(_)) => return Ok(None),
                Err(other_error) => return Err(other_error.into()),
            };
            match delete_interaction(
                db_client,
                message.id,
                actor_uri,
                InteractionType::Announce,
                None,
            ).await {
                Ok(_) => (),
                Err(DatabaseError::NotFound(_)) => return Ok(None),
                Err(other_error) => return Err(other_error.into()),
            };
            change_message_counter(
                db_client,
                message.id,
                counter_for(InteractionType::Announce),
                -1,
            ).await?;
            Ok(Some(ANNOUNCE))
        },
        other_type => {
            if let Some(interaction_type) = interaction_type_for(other_type) {
                let message_uri = object_to_id(&inner["object"])
                    .map_err(ValidationError)?;
                let message = match get_message_by_activitypub_id(
                    db_client,
                    &message_uri,
                ).await {
                    Ok(message) => message,
                    Err(DatabaseError::NotFound(_)) => return Ok(None),
                    Err(other_error) => return Err(other_error.into()),
                };
                let emoji = inner["content"].as_str();
                match delete_interaction(
                    db_client,
                    message.id,
                    actor_uri,
                    interaction_type,
                    emoji,
                ).await {
                    Ok(_) => (),
                    Err(DatabaseError::NotFound(_)) => return Ok(None),
                    Err(other_error) => return Err(other_error.into()),
                };
                change_message_counter(
                    db_client,
                    message.id,
                    counter_for(interaction_type),
                    -1,
                ).await?;
                return Ok(Some("Object"));
            };
            log::warn!("Undo({}) is not supported", other_type);
            Ok(None)
        },
    }
}

/// Single Undo router.
///
/// An embedded object is dispatched by its inner type; a bare URI is
/// looked up locally, then fetched. An unresolvable reference is
/// acknowledged: the referenced activity may simply be gone.
pub async fn handle_undo(
    context: &mut HandlerContext<'_>,
    db_client: &impl DatabaseClient,
    activity: JsonValue,
    actor_uri: &str,
) -> HandlerResult {
    let undo: Undo = serde_json::from_value(activity)?;
    if undo.actor != actor_uri {
        return Err(ValidationError("actor mismatch").into());
    };
    if undo.object.is_object() {
        return undo_embedded(db_client, &undo.object, actor_uri).await;
    };

    let object_id = undo.object.as_str()
        .ok_or(ValidationError("invalid 'object' property"))?;

    // The undone activity is usually one of ours to know about
    match get_follow_by_activity_id(db_client, object_id).await {
        Ok(follow) => {
            let source = get_actor_by_uri(db_client, actor_uri).await?;
            if follow.source_actor_id != source.id {
                return Err(ValidationError("actor is not the follower").into());
            };
            delete_follow(db_client, follow.id).await?;
            return Ok(Some(FOLLOW));
        },
        Err(DatabaseError::NotFound(_)) => (),
        Err(other_error) => return Err(other_error.into()),
    };
    match get_interaction_by_activity_id(db_client, object_id).await {
        Ok(interaction) => {
            return undo_interaction(db_client, interaction, actor_uri).await;
        },
        Err(DatabaseError::NotFound(_)) => (),
        Err(other_error) => return Err(other_error.into()),
    };

    // Unknown reference: resolve it remotely
    let agent = context.agent();
    match fetch_object(
        &agent,
        context.object_cache(),
        object_id,
        FetchObjectOptions::default(),
    ).await {
        Ok(inner) => undo_embedded(db_client, &inner, actor_uri).await,
        Err(error) => {
            log::info!("undone activity is gone ({}): {}", error, object_id);
            Ok(Some("Acknowledged"))
        },
    }
}
