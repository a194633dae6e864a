//! Single entry point for activity processing
use serde_json::{Value as JsonValue};
use uuid::Uuid;

use aviary_config::Config;
use aviary_core::urls::get_hostname;
use aviary_models::{
    activities::queries::{
        create_activity,
        get_activity_by_activity_id,
        mark_activity_processed,
        record_activity_process_error,
    },
    database::{
        get_database_client,
        DatabaseConnectionPool,
        DatabaseError,
    },
};
use aviary_validators::activitypub::validate_activity;

use aviary_fetch::constants::AP_PUBLIC;

use super::{
    deserialization::object_to_id,
    errors::HandlerError,
    handlers::activity::handle_activity,
    handlers::HandlerContext,
    mrf::{FederationFilter, MrfOutcome},
    publisher::publish_activity,
    relay::announce_to_relays,
    state::FederationState,
    vocabulary::CREATE,
};

#[derive(Debug)]
pub enum PipelineOutcome {
    Processed,
    /// Rejected by an MRF policy; not an error
    Rejected(String),
    /// Already-seen activity ID; idempotent no-op
    Duplicate,
}

/// Processes an inbound activity: validate, filter, persist, dispatch.
///
/// The handler runs in one transaction. Side effects collected by the
/// handler are dispatched after commit and cannot roll it back.
pub async fn process_incoming(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
    activity: &JsonValue,
    actor_uri: &str,
    recipient: Option<&str>,
) -> Result<PipelineOutcome, HandlerError> {
    validate_activity(activity)?;
    let actor_hostname = get_hostname(actor_uri)
        .map_err(|_| HandlerError::ValidationError("invalid actor URI".to_string()))?;

    let mut db_client = get_database_client(db_pool).await?;

    // Filter before anything is persisted
    let filter = FederationFilter::init(config, &**db_client).await?;
    let activity = match filter.apply(activity.clone(), &actor_hostname) {
        MrfOutcome::Accept(rewritten) => rewritten,
        MrfOutcome::Reject(reason) => {
            return Ok(PipelineOutcome::Rejected(reason));
        },
    };

    // The activity row survives handler failures, keeping the
    // error trail; replays short-circuit on the processed flag
    let activity_type = activity["type"].as_str().unwrap_or("Unknown");
    let maybe_activity_id = activity["id"].as_str();
    let db_activity_id = if let Some(activity_id) = maybe_activity_id {
        match get_activity_by_activity_id(&**db_client, activity_id).await {
            Ok(existing) if existing.processed => {
                return Ok(PipelineOutcome::Duplicate);
            },
            Ok(existing) => Some(existing.id),
            Err(DatabaseError::NotFound(_)) => {
                let object_id = object_to_id(&activity["object"]).ok();
                let db_activity = create_activity(
                    &**db_client,
                    activity_id,
                    activity_type,
                    actor_uri,
                    object_id.as_deref(),
                    &activity,
                    false,
                    None,
                ).await?;
                Some(db_activity.id)
            },
            Err(other_error) => return Err(other_error.into()),
        }
    } else {
        None
    };

    let transaction = db_client.transaction().await
        .map_err(DatabaseError::from)?;
    let mut context = HandlerContext::new(config, state);
    let handler_result = handle_activity(
        &mut context,
        &*transaction,
        &activity,
        actor_uri,
        recipient,
    ).await;
    match handler_result {
        Ok(maybe_descriptor) => {
            if let Some(db_activity_id) = db_activity_id {
                mark_activity_processed(&*transaction, db_activity_id).await?;
            };
            transaction.commit().await.map_err(DatabaseError::from)?;
            if let Some(descriptor) = maybe_descriptor {
                log::info!(
                    "processed {}({}) from {}",
                    activity_type,
                    descriptor,
                    actor_uri,
                );
            };
            state.side_effects.dispatch(db_pool, context.take_effects()).await;
            Ok(PipelineOutcome::Processed)
        },
        Err(error) => {
            drop(transaction); // rollback
            if let Some(db_activity_id) = db_activity_id {
                record_activity_process_error(
                    &**db_client,
                    db_activity_id,
                    &error.to_string(),
                ).await?;
            };
            Err(error)
        },
    }
}

/// Persists a locally-generated activity and queues its federation.
/// Publisher enqueue errors are logged, not propagated: the local
/// state change has already been committed.
pub async fn process_outgoing(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
    activity: &JsonValue,
    sender_actor_id: Option<Uuid>,
    recipient_inboxes: Vec<String>,
) -> Result<PipelineOutcome, HandlerError> {
    validate_activity(activity)?;
    let instance_hostname = config.instance_domain();
    let db_client = get_database_client(db_pool).await?;
    let filter = FederationFilter::init(config, &**db_client).await?;
    let activity = match filter.apply(activity.clone(), &instance_hostname) {
        MrfOutcome::Accept(rewritten) => rewritten,
        MrfOutcome::Reject(reason) => {
            return Ok(PipelineOutcome::Rejected(reason));
        },
    };
    // Delivery job enqueue failures are handled inside the publisher;
    // only the activity persistence itself can fail here
    publish_activity(
        &**db_client,
        &state.delivery_tracker,
        &activity,
        sender_actor_id,
        recipient_inboxes,
    ).await?;

    // Public Create activities are announced to subscribed relays
    let is_public_create = activity["type"].as_str() == Some(CREATE) &&
        activity["to"].as_array()
            .is_some_and(|to| to.iter().any(|item| item == AP_PUBLIC));
    if is_public_create {
        if let Ok(object_id) = object_to_id(&activity["object"]) {
            let announce_result = announce_to_relays(
                &**db_client,
                &state.delivery_tracker,
                &config.instance(),
                &object_id,
            ).await;
            if let Err(error) = announce_result {
                log::warn!("failed to announce to relays: {}", error);
            };
        };
    };
    Ok(PipelineOutcome::Processed)
}
