//! Relay subscriptions.
//!
//! Relays are Application-type actors. A subscription is a Follow of
//! the relay actor; its state machine is pending -> active/rejected,
//! with delivery errors parking it in the error state.
use serde_json::{json, Value as JsonValue};

use aviary_config::Instance;
use aviary_fetch::fetch::{fetch_object, FetchObjectOptions};
use aviary_models::{
    actors::queries::{create_or_update_actor, get_actor_by_uri},
    actors::types::{ActorData, ActorType, DbActor},
    database::{DatabaseClient, DatabaseError},
    relays::queries::{
        create_relay_subscription,
        delete_relay_subscription,
        get_active_relay_subscriptions,
        get_relay_subscription_by_follow_activity_id,
        get_relay_subscription_by_inbox,
        get_relay_subscription_by_uri,
        set_relay_subscription_status,
    },
    relays::types::RelaySubscriptionStatus,
};

use super::{
    builders::announce::build_announce,
    builders::follow::build_follow,
    builders::undo::build_undo,
    deserialization::object_to_id,
    errors::HandlerError,
    handlers::HandlerContext,
    identifiers::{local_actor_inbox, local_actor_key_id},
    keys::ensure_local_actor_key,
    publisher::publish_activity,
    queues::DeliveryJobTracker,
};

const RELAY_USERNAME: &str = "relay";

fn relay_actor_id(instance_url: &str) -> String {
    format!("{}/relay", instance_url)
}

/// Returns the local relay actor, creating it (with its keypair)
/// on first use
pub async fn get_relay_actor(
    db_client: &impl DatabaseClient,
    instance: &Instance,
) -> Result<DbActor, HandlerError> {
    let actor_id = relay_actor_id(instance.url());
    let actor = match get_actor_by_uri(db_client, &actor_id).await {
        Ok(actor) => actor,
        Err(DatabaseError::NotFound(_)) => {
            let actor_data = ActorData {
                uri: actor_id.clone(),
                username: RELAY_USERNAME.to_string(),
                domain: instance.hostname().to_string(),
                actor_type: ActorType::Application,
                inbox_url: local_actor_inbox(&actor_id),
                shared_inbox_url: None,
                outbox_url: None,
                followers_url: None,
                public_key_pem: None,
                manually_approves_followers: true,
                is_local: true,
                metadata: json!({}),
            };
            create_or_update_actor(db_client, actor_data).await?
        },
        Err(other_error) => return Err(other_error.into()),
    };
    let key_id = local_actor_key_id(&actor.uri);
    ensure_local_actor_key(db_client, &actor, &key_id).await?;
    Ok(actor)
}

/// Subscribes to a relay: stores a pending subscription and delivers
/// a Follow activity to the relay inbox
pub async fn subscribe(
    context: &HandlerContext<'_>,
    db_client: &impl DatabaseClient,
    relay_uri: &str,
) -> Result<(), HandlerError> {
    let instance = context.instance();
    let relay_actor = get_relay_actor(db_client, instance).await?;
    let agent = context.agent();
    let relay_json = fetch_object(
        &agent,
        context.object_cache(),
        relay_uri,
        FetchObjectOptions::default(),
    ).await?;
    let relay_inbox = relay_json["inbox"].as_str()
        .ok_or(HandlerError::ValidationError(
            "relay actor without inbox".to_string(),
        ))?;

    let follow = build_follow(instance.url(), &relay_actor.uri, relay_uri);
    let follow_json = serde_json::to_value(&follow)
        .expect("activity should be serializable");
    create_relay_subscription(
        db_client,
        relay_uri,
        relay_inbox,
        &follow.id,
    ).await?;
    publish_activity(
        db_client,
        context.delivery_tracker(),
        &follow_json,
        Some(relay_actor.id),
        vec![relay_inbox.to_string()],
    ).await?;
    log::info!("relay subscription requested: {}", relay_uri);
    Ok(())
}

/// Unsubscribes from a relay: delivers Undo(Follow) and removes
/// the subscription
pub async fn unsubscribe(
    context: &HandlerContext<'_>,
    db_client: &impl DatabaseClient,
    relay_uri: &str,
) -> Result<(), HandlerError> {
    let instance = context.instance();
    let subscription = get_relay_subscription_by_uri(db_client, relay_uri).await?;
    let relay_actor = get_relay_actor(db_client, instance).await?;
    let undo = build_undo(
        instance.url(),
        &relay_actor.uri,
        json!({
            "id": subscription.follow_activity_id,
            "type": "Follow",
            "actor": relay_actor.uri,
            "object": relay_uri,
        }),
        vec![relay_uri.to_string()],
    );
    let undo_json = serde_json::to_value(undo)
        .expect("activity should be serializable");
    publish_activity(
        db_client,
        context.delivery_tracker(),
        &undo_json,
        Some(relay_actor.id),
        vec![subscription.relay_inbox.clone()],
    ).await?;
    delete_relay_subscription(db_client, subscription.id).await?;
    log::info!("relay subscription removed: {}", relay_uri);
    Ok(())
}

async fn find_subscription(
    db_client: &impl DatabaseClient,
    activity: &JsonValue,
) -> Result<Option<aviary_models::relays::types::DbRelaySubscription>, DatabaseError> {
    // By the exact follow activity ID
    if let Ok(object_id) = object_to_id(&activity["object"]) {
        match get_relay_subscription_by_follow_activity_id(
            db_client,
            &object_id,
        ).await {
            Ok(subscription) => return Ok(Some(subscription)),
            Err(DatabaseError::NotFound(_)) => (),
            Err(other_error) => return Err(other_error),
        };
        // By the followed relay URI
        if let Some(followed_uri) = activity["object"]["object"].as_str() {
            match get_relay_subscription_by_uri(db_client, followed_uri).await {
                Ok(subscription) => return Ok(Some(subscription)),
                Err(DatabaseError::NotFound(_)) => (),
                Err(other_error) => return Err(other_error),
            };
        };
        match get_relay_subscription_by_uri(db_client, &object_id).await {
            Ok(subscription) => return Ok(Some(subscription)),
            Err(DatabaseError::NotFound(_)) => (),
            Err(other_error) => return Err(other_error),
        };
    };
    // By the accepting actor
    if let Ok(actor_uri) = object_to_id(&activity["actor"]) {
        match get_relay_subscription_by_uri(db_client, &actor_uri).await {
            Ok(subscription) => return Ok(Some(subscription)),
            Err(DatabaseError::NotFound(_)) => (),
            Err(other_error) => return Err(other_error),
        };
    };
    Ok(None)
}

/// Activates a pending subscription on Accept.
/// Returns false if the Accept concerns no relay.
pub async fn handle_relay_accept(
    db_client: &impl DatabaseClient,
    activity: &JsonValue,
) -> Result<bool, HandlerError> {
    let Some(subscription) = find_subscription(db_client, activity).await? else {
        return Ok(false);
    };
    if subscription.status == RelaySubscriptionStatus::Pending {
        set_relay_subscription_status(
            db_client,
            subscription.id,
            RelaySubscriptionStatus::Active,
        ).await?;
        log::info!("relay subscription active: {}", subscription.relay_uri);
    };
    Ok(true)
}

pub async fn handle_relay_reject(
    db_client: &impl DatabaseClient,
    activity: &JsonValue,
) -> Result<bool, HandlerError> {
    let Some(subscription) = find_subscription(db_client, activity).await? else {
        return Ok(false);
    };
    set_relay_subscription_status(
        db_client,
        subscription.id,
        RelaySubscriptionStatus::Rejected,
    ).await?;
    log::warn!("relay subscription rejected: {}", subscription.relay_uri);
    Ok(true)
}

/// Parks a subscription in the error state when deliveries to the
/// relay inbox fail permanently
pub async fn note_relay_delivery_failure(
    db_client: &impl DatabaseClient,
    inbox_url: &str,
) -> Result<(), DatabaseError> {
    let subscription = match get_relay_subscription_by_inbox(
        db_client,
        inbox_url,
    ).await {
        Ok(subscription) => subscription,
        Err(DatabaseError::NotFound(_)) => return Ok(()),
        Err(other_error) => return Err(other_error),
    };
    if matches!(
        subscription.status,
        RelaySubscriptionStatus::Pending | RelaySubscriptionStatus::Active,
    ) {
        set_relay_subscription_status(
            db_client,
            subscription.id,
            RelaySubscriptionStatus::Error,
        ).await?;
        log::warn!("relay subscription in error state: {}", subscription.relay_uri);
    };
    Ok(())
}

/// Admin override for relays that never answer with Accept
pub async fn force_activate(
    db_client: &impl DatabaseClient,
    relay_uri: &str,
) -> Result<(), HandlerError> {
    let subscription = get_relay_subscription_by_uri(db_client, relay_uri).await?;
    set_relay_subscription_status(
        db_client,
        subscription.id,
        RelaySubscriptionStatus::Active,
    ).await?;
    Ok(())
}

/// Announces a public local Create to every active relay
pub async fn announce_to_relays(
    db_client: &impl DatabaseClient,
    tracker: &DeliveryJobTracker,
    instance: &Instance,
    object_id: &str,
) -> Result<(), HandlerError> {
    let subscriptions = get_active_relay_subscriptions(db_client).await?;
    if subscriptions.is_empty() {
        return Ok(());
    };
    let relay_actor = get_relay_actor(db_client, instance).await?;
    let announce = build_announce(instance.url(), &relay_actor.uri, object_id);
    let announce_json = serde_json::to_value(announce)
        .expect("activity should be serializable");
    let inboxes = subscriptions.into_iter()
        .map(|subscription| subscription.relay_inbox)
        .collect();
    publish_activity(
        db_client,
        tracker,
        &announce_json,
        Some(relay_actor.id),
        inboxes,
    ).await?;
    Ok(())
}
