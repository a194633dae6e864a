//! Delivery dispatcher: executes queued delivery jobs
use chrono::{Duration, Utc};

use aviary_config::Config;
use aviary_fetch::deliver::{send_object, DelivererError};
use aviary_models::{
    activities::queries::get_activity_by_id,
    actors::queries::get_actor_by_uri,
    background_jobs::queries::{
        delete_job_from_queue,
        get_job_batch,
    },
    background_jobs::types::{DbBackgroundJob, JobQueue},
    database::{
        get_database_client,
        DatabaseClient,
        DatabaseConnectionPool,
        DatabaseError,
        DatabaseTypeError,
    },
    deliveries::queries::{
        get_delivery_by_id,
        mark_delivery_delivered,
        mark_delivery_failed,
        schedule_delivery_retry,
    },
    deliveries::types::{DbDelivery, DeliveryStatus},
    instances::queries::{
        get_instance_by_domain,
        set_instance_reachable,
        set_instance_unreachable,
    },
};

use super::{
    agent::{build_federation_agent, build_federation_agent_with_key},
    errors::HandlerError,
    identifiers::local_actor_key_id,
    keys::ensure_local_actor_key,
    queues::DeliveryJobData,
    relay::note_relay_delivery_failure,
    state::FederationState,
    throttler::{AcquireOutcome, DomainSlot},
};

const JOB_TIMEOUT: u32 = 600; // 10 minutes

const DELIVERY_BACKOFF_BASE_SECONDS: i64 = 60;
const DELIVERY_BACKOFF_MAX_SECONDS: i64 = 21_600; // 6 hours

fn delivery_backoff(attempts: i32) -> Duration {
    let exponent = u32::try_from(attempts).unwrap_or(0).min(31);
    let seconds = DELIVERY_BACKOFF_BASE_SECONDS
        .saturating_mul(2_i64.pow(exponent))
        .min(DELIVERY_BACKOFF_MAX_SECONDS);
    Duration::seconds(seconds)
}

enum Disposition {
    Done,
    Snooze(u32),
    Drop(&'static str),
}

/// Marks a delivery as permanently failed and updates the relay
/// subscription state machine when the inbox belongs to a relay
async fn fail_delivery(
    db_client: &impl DatabaseClient,
    delivery: &DbDelivery,
    error_message: &str,
) -> Result<(), DatabaseError> {
    mark_delivery_failed(db_client, delivery.id, error_message).await?;
    note_relay_delivery_failure(db_client, &delivery.inbox_url).await?;
    Ok(())
}

async fn execute_delivery(
    config: &Config,
    db_client: &impl DatabaseClient,
    state: &FederationState,
    job: &DbBackgroundJob,
    delivery: &DbDelivery,
) -> Result<Disposition, HandlerError> {
    let limits = &config.limits.delivery;
    let instance = config.instance();
    let activity = get_activity_by_id(db_client, delivery.activity_id).await?;
    let domain = match aviary_core::urls::get_hostname(&delivery.inbox_url) {
        Ok(domain) => domain,
        Err(_) => {
            mark_delivery_failed(
                db_client,
                delivery.id,
                "invalid inbox URL",
            ).await?;
            return Ok(Disposition::Done);
        },
    };

    // Instances that have been failing for longer than the
    // reachability window are considered dead
    match get_instance_by_domain(db_client, &domain).await {
        Ok(instance_record) => {
            let timeout_days = config.federation.reachability_timeout_days;
            if !instance_record.is_reachable(timeout_days) {
                fail_delivery(db_client, delivery, "instance is unreachable").await?;
                return Ok(Disposition::Done);
            };
            if !instance_record.should_retry() {
                return Ok(Disposition::Snooze(limits.throttle_snooze_seconds));
            };
        },
        Err(DatabaseError::NotFound(_)) => (),
        Err(other_error) => return Err(other_error.into()),
    };

    let job_age = (Utc::now() - job.created_at).num_seconds();
    match state.throttler.acquire(&domain) {
        AcquireOutcome::Acquired => (),
        AcquireOutcome::Throttled => {
            if job_age > limits.max_backoff_job_age_seconds.into() {
                return Ok(Disposition::Drop("throttle budget exhausted"));
            };
            return Ok(Disposition::Snooze(limits.throttle_snooze_seconds));
        },
        AcquireOutcome::Backoff { remaining_ms } => {
            if job_age > limits.max_backoff_job_age_seconds.into() {
                return Ok(Disposition::Drop("domain in backoff"));
            };
            let snooze_seconds = u32::try_from(remaining_ms / 1000)
                .unwrap_or(u32::MAX)
                .max(limits.throttle_snooze_seconds);
            return Ok(Disposition::Snooze(snooze_seconds));
        },
    };
    let slot = DomainSlot::new(state.throttler.clone(), domain.clone());

    // Keys are generated lazily on the first delivery of a sender
    let agent = match activity.internal_user_id {
        Some(sender_actor_id) => {
            let sender = match get_actor_by_uri(db_client, &activity.actor_uri).await {
                Ok(sender) if sender.id == sender_actor_id => sender,
                Ok(_) | Err(DatabaseError::NotFound(_)) => {
                    mark_delivery_failed(
                        db_client,
                        delivery.id,
                        "sender is gone",
                    ).await?;
                    return Ok(Disposition::Done);
                },
                Err(other_error) => return Err(other_error.into()),
            };
            let key_id = local_actor_key_id(&sender.uri);
            let secret_key =
                ensure_local_actor_key(db_client, &sender, &key_id).await?;
            build_federation_agent_with_key(&instance, secret_key, key_id)
        },
        None => build_federation_agent(&instance),
    };

    let activity_json = activity.data.to_string();
    let result = send_object(&agent, &activity_json, &delivery.inbox_url).await;
    match result {
        Ok(response) => {
            let transitioned =
                mark_delivery_delivered(db_client, delivery.id).await?;
            if transitioned {
                log::info!(
                    "delivered {} to {} [{}]",
                    activity.activity_id,
                    delivery.inbox_url,
                    response.status.as_str(),
                );
            };
            set_instance_reachable(db_client, &domain).await?;
            slot.succeed();
            Ok(Disposition::Done)
        },
        Err(error) if error.is_terminal() => {
            fail_delivery(db_client, delivery, &error.to_string()).await?;
            log::warn!(
                "delivery to {} failed permanently: {}",
                delivery.inbox_url,
                error,
            );
            slot.fail();
            Ok(Disposition::Done)
        },
        Err(error) => {
            let is_transport_error = matches!(
                error,
                DelivererError::RequestError(_) | DelivererError::ResponseTooLarge,
            );
            if delivery.attempts + 1 >= limits.max_delivery_attempts as i32 {
                fail_delivery(db_client, delivery, &error.to_string()).await?;
            } else {
                let next_retry_at =
                    Utc::now() + delivery_backoff(delivery.attempts);
                schedule_delivery_retry(
                    db_client,
                    delivery.id,
                    &error.to_string(),
                    next_retry_at,
                ).await?;
            };
            if is_transport_error {
                set_instance_unreachable(db_client, &domain).await?;
            };
            log::warn!(
                "failed to deliver to {}: {}",
                delivery.inbox_url,
                error,
            );
            slot.fail();
            Ok(Disposition::Done)
        },
    }
}

pub async fn process_queued_deliveries(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
) -> Result<(), DatabaseError> {
    let limits = &config.limits.delivery;
    let batch = {
        let db_client_guard = get_database_client(db_pool).await?;
        let db_client = &**db_client_guard;
        get_job_batch(
            db_client,
            JobQueue::Delivery,
            config.federation.delivery_queue_batch_size,
            JOB_TIMEOUT,
        ).await?
    };
    for job in batch {
        let db_client_guard = get_database_client(db_pool).await?;
        let db_client = &**db_client_guard;
        let job_data: DeliveryJobData =
            serde_json::from_value(job.job_data.clone())
                .map_err(|_| DatabaseTypeError)?;
        let delivery =
            match get_delivery_by_id(db_client, job_data.delivery_id).await {
                Ok(delivery) => delivery,
                Err(DatabaseError::NotFound(_)) => {
                    delete_job_from_queue(db_client, job.id).await?;
                    continue;
                },
                Err(other_error) => return Err(other_error),
            };
        if delivery.status != DeliveryStatus::Pending {
            // Someone else finished this delivery
            delete_job_from_queue(db_client, job.id).await?;
            continue;
        };
        let job_age = (Utc::now() - job.created_at).num_seconds();
        if job_age > limits.max_job_age_seconds.into() {
            log::warn!(
                "dropping stale delivery job for {}",
                delivery.inbox_url,
            );
            fail_delivery(db_client, &delivery, "job expired").await?;
            delete_job_from_queue(db_client, job.id).await?;
            continue;
        };

        let disposition = execute_delivery(
            config,
            db_client,
            state,
            &job,
            &delivery,
        ).await;
        match disposition {
            Ok(Disposition::Done) => {
                delete_job_from_queue(db_client, job.id).await?;
            },
            Ok(Disposition::Snooze(seconds)) => {
                delete_job_from_queue(db_client, job.id).await?;
                if job_data.snoozes >= limits.max_throttle_snoozes {
                    log::warn!(
                        "dropping delivery job for {}: snooze budget exhausted",
                        delivery.inbox_url,
                    );
                    fail_delivery(
                        db_client,
                        &delivery,
                        "snooze budget exhausted",
                    ).await?;
                } else {
                    let snoozed = DeliveryJobData {
                        delivery_id: delivery.id,
                        snoozes: job_data.snoozes + 1,
                    };
                    snoozed.into_job(db_client, seconds).await?;
                };
            },
            Ok(Disposition::Drop(reason)) => {
                log::warn!(
                    "dropping delivery job for {}: {}",
                    delivery.inbox_url,
                    reason,
                );
                fail_delivery(db_client, &delivery, reason).await?;
                delete_job_from_queue(db_client, job.id).await?;
            },
            Err(error) => {
                log::error!(
                    "delivery job failed unexpectedly ({}): {}",
                    delivery.inbox_url,
                    error,
                );
                delete_job_from_queue(db_client, job.id).await?;
            },
        };
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_backoff() {
        assert_eq!(delivery_backoff(0), Duration::seconds(60));
        assert_eq!(delivery_backoff(1), Duration::seconds(120));
        assert_eq!(delivery_backoff(5), Duration::seconds(1920));
        // Capped
        assert_eq!(delivery_backoff(20), Duration::seconds(21_600));
    }
}
