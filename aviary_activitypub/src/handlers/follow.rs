use serde::Deserialize;
use serde_json::{Value as JsonValue};

use aviary_models::{
    actors::queries::get_local_actor_by_username,
    actors::types::ActorType,
    database::DatabaseClient,
    follows::queries::{create_follow, set_follow_status},
    follows::types::FollowStatus,
    notifications::types::NotificationType,
};
use aviary_validators::errors::ValidationError;

use crate::{
    builders::accept_follow::build_accept_follow,
    deserialization::deserialize_into_object_id,
    identifiers::{parse_local_actor_id, parse_local_community_id},
    importers::get_or_fetch_actor_by_uri,
    publisher::publish_activity,
    side_effects::SideEffect,
};

use super::{HandlerContext, HandlerResult};

#[derive(Deserialize)]
struct Follow {
    id: String,
    #[serde(deserialize_with = "deserialize_into_object_id")]
    actor: String,
    #[serde(deserialize_with = "deserialize_into_object_id")]
    object: String,
}

pub async fn handle_follow(
    context: &mut HandlerContext<'_>,
    db_client: &impl DatabaseClient,
    activity: JsonValue,
    actor_uri: &str,
    recipient: Option<&str>,
) -> HandlerResult {
    let activity: Follow = serde_json::from_value(activity)?;
    if activity.actor != actor_uri {
        return Err(ValidationError("actor mismatch").into());
    };
    let agent = context.agent();
    let source_actor = get_or_fetch_actor_by_uri(
        db_client,
        &agent,
        context.object_cache(),
        &activity.actor,
    ).await?;

    // The follow target must be local: a user or a community
    let instance_url = context.instance().url().to_string();
    let target_username = parse_local_actor_id(&instance_url, &activity.object)
        .or(parse_local_community_id(&instance_url, &activity.object))
        .or(recipient.map(|value| value.to_string()))
        .ok_or(ValidationError("follow target is not local"))?;
    let target_actor =
        get_local_actor_by_username(db_client, &target_username).await?;

    // Store with the latest activity ID; Undo(Follow) may reference it
    let follow = create_follow(
        db_client,
        source_actor.id,
        target_actor.id,
        Some(&activity.id),
        FollowStatus::Pending,
    ).await?;

    let auto_accept = !target_actor.manually_approves_followers ||
        target_actor.actor_type == ActorType::Group;
    if auto_accept {
        set_follow_status(db_client, follow.id, FollowStatus::Active).await?;
        let accept = build_accept_follow(
            &instance_url,
            &target_actor.uri,
            &source_actor.uri,
            &activity.id,
        );
        let accept_json = serde_json::to_value(accept)
            .expect("activity should be serializable");
        publish_activity(
            db_client,
            context.delivery_tracker(),
            &accept_json,
            Some(target_actor.id),
            vec![source_actor.inbox_url.clone()],
        ).await?;
        context.push_effect(SideEffect::Notify {
            recipient_actor_id: target_actor.id,
            notification_type: NotificationType::Follow,
            sender_actor_id: Some(source_actor.id),
            message_id: None,
        });
    } else {
        context.push_effect(SideEffect::Notify {
            recipient_actor_id: target_actor.id,
            notification_type: NotificationType::FollowRequest,
            sender_actor_id: Some(source_actor.id),
            message_id: None,
        });
    };
    Ok(Some("Actor"))
}
