//! Outbound persistence: activity rows, delivery rows, delivery jobs
use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::{Value as JsonValue};
use uuid::Uuid;

use aviary_core::urls::get_hostname;
use aviary_models::{
    activities::queries::create_activity,
    activities::types::DbActivity,
    actors::queries::get_shared_inbox_for_domain,
    database::{DatabaseClient, DatabaseError},
    deliveries::queries::{create_delivery, set_delivery_next_retry},
};

use super::deserialization::object_to_id;
use super::errors::HandlerError;
use super::queues::{DeliveryJobData, DeliveryJobTracker};

/// Collapses per-actor inboxes into shared inboxes.
///
/// Inboxes are deduplicated first. When two or more recipients live
/// on the same host, their inboxes are replaced by that host's shared
/// inbox: the one advertised by any cached actor there, or the
/// conventional `https://{host}/inbox`.
pub async fn compact_inboxes(
    db_client: &impl DatabaseClient,
    inbox_urls: Vec<String>,
) -> Result<Vec<String>, DatabaseError> {
    let mut by_domain: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut compacted = vec![];
    for inbox_url in inbox_urls {
        match get_hostname(&inbox_url) {
            Ok(domain) => {
                let inboxes = by_domain.entry(domain).or_default();
                if !inboxes.contains(&inbox_url) {
                    inboxes.push(inbox_url);
                };
            },
            Err(_) => log::warn!("invalid inbox URL: {}", inbox_url),
        };
    };
    for (domain, inboxes) in by_domain {
        if inboxes.len() < 2 {
            compacted.extend(inboxes);
            continue;
        };
        let shared_inbox = get_shared_inbox_for_domain(db_client, &domain)
            .await?
            .unwrap_or(format!("https://{}/inbox", domain));
        compacted.push(shared_inbox);
    };
    Ok(compacted)
}

/// Saves an outgoing activity and one pending delivery per inbox,
/// then queues dispatcher jobs. The activity row is reused when the
/// same activity is published twice.
pub async fn publish_activity(
    db_client: &impl DatabaseClient,
    tracker: &DeliveryJobTracker,
    activity: &JsonValue,
    sender_actor_id: Option<Uuid>,
    inbox_urls: Vec<String>,
) -> Result<DbActivity, HandlerError> {
    let activity_id = activity["id"].as_str()
        .ok_or(HandlerError::ValidationError(
            "activity without ID".to_string(),
        ))?;
    let activity_type = activity["type"].as_str().unwrap_or("Unknown");
    let actor_uri = object_to_id(&activity["actor"])
        .map_err(|_| HandlerError::ValidationError(
            "activity without actor".to_string(),
        ))?;
    let object_id = object_to_id(&activity["object"]).ok();
    let db_activity = create_activity(
        db_client,
        activity_id,
        activity_type,
        &actor_uri,
        object_id.as_deref(),
        activity,
        true,
        sender_actor_id,
    ).await?;

    let inboxes = compact_inboxes(db_client, inbox_urls).await?;
    log::info!(
        "queueing {} for delivery to {} inboxes",
        activity_type,
        inboxes.len(),
    );
    for inbox_url in inboxes {
        let delivery = create_delivery(
            db_client,
            db_activity.id,
            &inbox_url,
        ).await?;
        if !tracker.try_track(delivery.id) {
            continue;
        };
        let job_data = DeliveryJobData::new(delivery.id);
        if let Err(error) = job_data.into_job(db_client, 0).await {
            // The retry scheduler picks the row up later
            log::error!("failed to enqueue delivery job: {}", error);
            set_delivery_next_retry(db_client, delivery.id, Utc::now()).await?;
        };
    };
    Ok(db_activity)
}
