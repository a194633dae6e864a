//! Entry points for federating local actions.
//!
//! Each operation builds the outgoing document and hands it to the
//! pipeline, which filters, persists and queues the deliveries.
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use aviary_models::{
    actors::types::DbActor,
    database::{
        get_database_client,
        DatabaseConnectionPool,
    },
    follows::queries::{
        create_follow,
        delete_follow,
        get_follow_by_pair,
        get_follower_inboxes,
        set_follow_status,
    },
    follows::types::FollowStatus,
    messages::queries::{
        get_message_by_id,
        set_message_activitypub_id,
    },
    messages::types::DbMessage,
};

use aviary_config::Config;

use super::{
    builders::announce::build_announce,
    builders::block::build_block,
    builders::create_note::prepare_create_note,
    builders::delete_note::build_delete_note,
    builders::flag::build_flag,
    builders::follow::build_follow,
    builders::like::{build_dislike, build_emoji_react, build_like},
    builders::note::{build_note, get_reply_context},
    builders::reject_follow::build_reject_follow,
    builders::undo::build_undo,
    builders::update_note::build_update_note,
    errors::HandlerError,
    handlers::HandlerContext,
    importers::get_or_fetch_actor_by_uri,
    pipeline::{process_outgoing, PipelineOutcome},
    state::FederationState,
};

fn to_json(activity: impl serde::Serialize) -> JsonValue {
    serde_json::to_value(activity)
        .expect("activity should be serializable")
}

/// Inboxes of the audience of a local message: followers plus every
/// remote actor addressed in `cc`
async fn message_recipient_inboxes(
    context: &HandlerContext<'_>,
    db_pool: &DatabaseConnectionPool,
    author: &DbActor,
    cc: &[String],
) -> Result<Vec<String>, HandlerError> {
    let db_client_guard = get_database_client(db_pool).await?;
    let db_client = &**db_client_guard;
    let mut inboxes = get_follower_inboxes(db_client, author.id).await?;
    let agent = context.agent();
    let instance_url = context.instance().url().to_string();
    for uri in cc {
        if uri.starts_with(&instance_url) || uri.ends_with("/followers") {
            continue;
        };
        match get_or_fetch_actor_by_uri(
            db_client,
            &agent,
            context.object_cache(),
            uri,
        ).await {
            Ok(actor) => inboxes.push(actor.inbox_url),
            Err(error) => {
                log::warn!("failed to resolve recipient {}: {}", uri, error);
            },
        };
    };
    Ok(inboxes)
}

/// Federates a local message as Create(Note).
/// The ActivityPub ID is assigned on first federation.
pub async fn federate_message(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
    author: &DbActor,
    message_id: Uuid,
) -> Result<PipelineOutcome, HandlerError> {
    let context = HandlerContext::new(config, state);
    let create = {
        let db_client_guard = get_database_client(db_pool).await?;
        let db_client = &**db_client_guard;
        let message = get_message_by_id(db_client, message_id).await?;
        let create = prepare_create_note(
            &context,
            db_client,
            &author.username,
            &message,
        ).await?;
        if message.activitypub_id.is_none() {
            set_message_activitypub_id(
                db_client,
                message.id,
                &create.object.id,
            ).await?;
        };
        create
    };
    let inboxes = message_recipient_inboxes(
        &context,
        db_pool,
        author,
        &create.cc,
    ).await?;
    process_outgoing(
        config,
        db_pool,
        state,
        &to_json(create),
        Some(author.id),
        inboxes,
    ).await
}

/// Federates an edit as Update(Note)
pub async fn federate_message_update(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
    author: &DbActor,
    message_id: Uuid,
) -> Result<PipelineOutcome, HandlerError> {
    let context = HandlerContext::new(config, state);
    let db_client_guard = get_database_client(db_pool).await?;
    let db_client = &**db_client_guard;
    let message = get_message_by_id(db_client, message_id).await?;
    let reply_context = get_reply_context(db_client, &message).await?;
    let note = build_note(
        context.instance().url(),
        &author.username,
        &message,
        &reply_context,
        vec![],
        false,
    );
    let updated = message.edited_at.unwrap_or(message.created_at);
    let update = build_update_note(context.instance().url(), note, updated);
    drop(db_client_guard);
    let inboxes = message_recipient_inboxes(
        &context,
        db_pool,
        author,
        &update.cc,
    ).await?;
    process_outgoing(
        config,
        db_pool,
        state,
        &to_json(update),
        Some(author.id),
        inboxes,
    ).await
}

/// Federates a deletion as Delete with a Tombstone object
pub async fn federate_message_delete(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
    author: &DbActor,
    message: &DbMessage,
) -> Result<PipelineOutcome, HandlerError> {
    let context = HandlerContext::new(config, state);
    let object_id = message.activitypub_id.clone()
        .ok_or(HandlerError::ServiceError("message was never federated"))?;
    let delete = build_delete_note(
        context.instance().url(),
        &author.uri,
        &object_id,
    );
    let inboxes = message_recipient_inboxes(
        &context,
        db_pool,
        author,
        &[],
    ).await?;
    process_outgoing(
        config,
        db_pool,
        state,
        &to_json(delete),
        Some(author.id),
        inboxes,
    ).await
}

/// Follows a remote actor on behalf of a local one
pub async fn follow_remote_actor(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
    follower: &DbActor,
    target_uri: &str,
) -> Result<PipelineOutcome, HandlerError> {
    let context = HandlerContext::new(config, state);
    let db_client_guard = get_database_client(db_pool).await?;
    let db_client = &**db_client_guard;
    let agent = context.agent();
    let target = get_or_fetch_actor_by_uri(
        db_client,
        &agent,
        context.object_cache(),
        target_uri,
    ).await?;
    let follow = build_follow(
        context.instance().url(),
        &follower.uri,
        &target.uri,
    );
    create_follow(
        db_client,
        follower.id,
        target.id,
        Some(&follow.id),
        FollowStatus::Pending,
    ).await?;
    let inbox = target.inbox_url.clone();
    drop(db_client_guard);
    process_outgoing(
        config,
        db_pool,
        state,
        &to_json(follow),
        Some(follower.id),
        vec![inbox],
    ).await
}

/// Withdraws a follow with Undo(Follow)
pub async fn unfollow_remote_actor(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
    follower: &DbActor,
    target: &DbActor,
) -> Result<PipelineOutcome, HandlerError> {
    let db_client_guard = get_database_client(db_pool).await?;
    let db_client = &**db_client_guard;
    let follow = get_follow_by_pair(db_client, follower.id, target.id).await?;
    let undo = build_undo(
        config.instance_url().as_str(),
        &follower.uri,
        json!({
            "id": follow.activity_id,
            "type": "Follow",
            "actor": follower.uri,
            "object": target.uri,
        }),
        vec![target.uri.clone()],
    );
    delete_follow(db_client, follow.id).await?;
    let inbox = target.inbox_url.clone();
    drop(db_client_guard);
    process_outgoing(
        config,
        db_pool,
        state,
        &to_json(undo),
        Some(follower.id),
        vec![inbox],
    ).await
}

/// Denies a pending follow request with Reject(Follow)
pub async fn reject_follow_request(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
    target: &DbActor,
    source: &DbActor,
) -> Result<PipelineOutcome, HandlerError> {
    let db_client_guard = get_database_client(db_pool).await?;
    let db_client = &**db_client_guard;
    let follow = get_follow_by_pair(db_client, source.id, target.id).await?;
    let follow_activity_id = follow.activity_id.clone()
        .ok_or(HandlerError::ServiceError("follow without activity ID"))?;
    let reject = build_reject_follow(
        config.instance_url().as_str(),
        &target.uri,
        &source.uri,
        &follow_activity_id,
    );
    set_follow_status(db_client, follow.id, FollowStatus::Rejected).await?;
    let inbox = source.inbox_url.clone();
    drop(db_client_guard);
    process_outgoing(
        config,
        db_pool,
        state,
        &to_json(reject),
        Some(target.id),
        vec![inbox],
    ).await
}

#[derive(Clone, Copy)]
pub enum Reaction<'a> {
    Like,
    Dislike,
    Emoji(&'a str),
}

/// Federates a reaction to a remote message
pub async fn react_to_message(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
    actor: &DbActor,
    object_id: &str,
    object_owner: &DbActor,
    reaction: Reaction<'_>,
) -> Result<PipelineOutcome, HandlerError> {
    let instance_url = config.instance_url();
    let activity = match reaction {
        Reaction::Like => {
            build_like(&instance_url, &actor.uri, object_id, &object_owner.uri)
        },
        Reaction::Dislike => {
            build_dislike(&instance_url, &actor.uri, object_id, &object_owner.uri)
        },
        Reaction::Emoji(emoji) => {
            build_emoji_react(
                &instance_url,
                &actor.uri,
                object_id,
                &object_owner.uri,
                emoji,
            )
        },
    };
    process_outgoing(
        config,
        db_pool,
        state,
        &to_json(activity),
        Some(actor.id),
        vec![object_owner.inbox_url.clone()],
    ).await
}

/// Boosts a message to the actor's followers
pub async fn announce_message(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
    actor: &DbActor,
    object_id: &str,
) -> Result<PipelineOutcome, HandlerError> {
    let context = HandlerContext::new(config, state);
    let announce = build_announce(
        context.instance().url(),
        &actor.uri,
        object_id,
    );
    let inboxes = message_recipient_inboxes(
        &context,
        db_pool,
        actor,
        &[],
    ).await?;
    process_outgoing(
        config,
        db_pool,
        state,
        &to_json(announce),
        Some(actor.id),
        inboxes,
    ).await
}

/// Tells a remote server about a user-level block
pub async fn block_remote_actor(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
    actor: &DbActor,
    target: &DbActor,
) -> Result<PipelineOutcome, HandlerError> {
    let block = build_block(
        config.instance_url().as_str(),
        &actor.uri,
        &target.uri,
    );
    process_outgoing(
        config,
        db_pool,
        state,
        &to_json(block),
        Some(actor.id),
        vec![target.inbox_url.clone()],
    ).await
}

/// Reports remote content to its origin server
pub async fn report_remote_content(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
    reported_actor: &DbActor,
    object_ids: Vec<String>,
    comment: Option<String>,
) -> Result<PipelineOutcome, HandlerError> {
    let instance = config.instance();
    let reporter_uri =
        super::identifiers::local_instance_actor_id(instance.url());
    let flag = build_flag(
        instance.url(),
        &reporter_uri,
        object_ids,
        comment,
        &reported_actor.uri,
    );
    process_outgoing(
        config,
        db_pool,
        state,
        &to_json(flag),
        None,
        vec![reported_actor.inbox_url.clone()],
    ).await
}
