//! Durable queue job payloads and the inbox job executor
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration as StdDuration, Instant};

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue};
use uuid::Uuid;

use aviary_config::Config;
use aviary_models::{
    background_jobs::queries::{
        delete_job_from_queue,
        enqueue_job,
        get_job_batch,
        retry_job,
    },
    background_jobs::types::{
        JobPriority,
        JobQueue,
        JOB_PRIORITY_HIGH,
        JOB_PRIORITY_HIGHEST,
        JOB_PRIORITY_LOW,
        JOB_PRIORITY_LOWEST,
    },
    database::{
        get_database_client,
        DatabaseClient,
        DatabaseConnectionPool,
        DatabaseError,
        DatabaseTypeError,
    },
};

use super::pipeline::{process_incoming, PipelineOutcome};
use super::state::FederationState;
use super::vocabulary::*;

const JOB_TIMEOUT: u32 = 3600; // 1 hour
const INCOMING_RETRIES_MAX: i32 = 2;

// Content priority applies to anything that creates or removes state
const CONTENT_TYPES: [&str; 3] = [CREATE, UPDATE, DELETE];
const RELATION_TYPES: [&str; 5] = [FOLLOW, ACCEPT, REJECT, UNDO, BLOCK];
const REACTION_TYPES: [&str; 3] = [LIKE, DISLIKE, EMOJI_REACT];

/// Priority of an inbound activity job.
/// Announce inherits the priority of its inner object without
/// fetching it: a bare URI is assumed to reference content.
pub fn activity_priority(activity: &JsonValue) -> JobPriority {
    let activity_type = activity["type"].as_str().unwrap_or_default();
    if CONTENT_TYPES.contains(&activity_type) {
        return JOB_PRIORITY_HIGHEST;
    };
    if RELATION_TYPES.contains(&activity_type) {
        return JOB_PRIORITY_HIGH;
    };
    if REACTION_TYPES.contains(&activity_type) {
        return JOB_PRIORITY_LOW;
    };
    if activity_type == ANNOUNCE {
        let inner_type = activity["object"]["type"].as_str();
        return match inner_type {
            Some(inner) if REACTION_TYPES.contains(&inner) => JOB_PRIORITY_LOW,
            _ => JOB_PRIORITY_HIGHEST,
        };
    };
    JOB_PRIORITY_HIGH
}

#[derive(Deserialize, Serialize)]
pub struct IncomingActivityJobData {
    pub activity: JsonValue,
    pub actor_uri: String,
    pub recipient: Option<String>,
}

impl IncomingActivityJobData {
    pub fn new(
        activity: JsonValue,
        actor_uri: String,
        recipient: Option<String>,
    ) -> Self {
        Self { activity, actor_uri, recipient }
    }

    pub async fn into_job(
        self,
        db_client: &impl DatabaseClient,
        priority: JobPriority,
        delay: u32,
    ) -> Result<(), DatabaseError> {
        let job_data = serde_json::to_value(self)
            .expect("activity should be serializable");
        let scheduled_for = Utc::now() + Duration::seconds(delay.into());
        enqueue_job(
            db_client,
            JobQueue::InboxProcess,
            &job_data,
            priority,
            scheduled_for,
        ).await?;
        Ok(())
    }
}

#[derive(Deserialize, Serialize)]
pub struct DeliveryJobData {
    pub delivery_id: Uuid,

    /// Times this job was postponed by the domain throttler
    #[serde(default)]
    pub snoozes: u32,
}

impl DeliveryJobData {
    pub fn new(delivery_id: Uuid) -> Self {
        Self { delivery_id, snoozes: 0 }
    }

    pub async fn into_job(
        self,
        db_client: &impl DatabaseClient,
        delay: u32,
    ) -> Result<(), DatabaseError> {
        let job_data = serde_json::to_value(self)
            .expect("job data should be serializable");
        let scheduled_for = Utc::now() + Duration::seconds(delay.into());
        enqueue_job(
            db_client,
            JobQueue::Delivery,
            &job_data,
            JOB_PRIORITY_HIGH,
            scheduled_for,
        ).await?;
        Ok(())
    }
}

#[derive(Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum MaintenanceJobData {
    /// Fetch a replies collection and store its items
    RepliesIngest { collection_id: String },
}

impl MaintenanceJobData {
    pub async fn into_job(
        self,
        db_client: &impl DatabaseClient,
    ) -> Result<(), DatabaseError> {
        let job_data = serde_json::to_value(self)
            .expect("job data should be serializable");
        enqueue_job(
            db_client,
            JobQueue::Maintenance,
            &job_data,
            JOB_PRIORITY_LOWEST,
            Utc::now(),
        ).await?;
        Ok(())
    }
}

const DELIVERY_UNIQUENESS_WINDOW: StdDuration = StdDuration::from_secs(300);

/// In-memory uniqueness window for delivery jobs.
/// Enqueueing the same delivery twice within the window is a no-op;
/// the Delivery row state machine guarantees correctness if the
/// window is lost on restart.
#[derive(Clone, Default)]
pub struct DeliveryJobTracker {
    recent: Arc<Mutex<HashMap<Uuid, Instant>>>,
}

impl DeliveryJobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if a job for this delivery was enqueued recently
    pub fn try_track(&self, delivery_id: Uuid) -> bool {
        let now = Instant::now();
        let mut recent = self.recent.lock()
            .expect("delivery tracker lock should not be poisoned");
        if let Some(enqueued_at) = recent.get(&delivery_id) {
            if now.duration_since(*enqueued_at) < DELIVERY_UNIQUENESS_WINDOW {
                return false;
            };
        };
        recent.insert(delivery_id, now);
        true
    }

    pub fn sweep(&self) {
        let now = Instant::now();
        let mut recent = self.recent.lock()
            .expect("delivery tracker lock should not be poisoned");
        recent.retain(|_, enqueued_at| {
            now.duration_since(*enqueued_at) < DELIVERY_UNIQUENESS_WINDOW
        });
    }
}

const fn incoming_queue_backoff(_attempt: i32) -> u32 {
    // Constant, 10 minutes
    60 * 10
}

pub async fn process_queued_incoming_activities(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
) -> Result<(), DatabaseError> {
    let batch = {
        let db_client_guard = get_database_client(db_pool).await?;
        let db_client = &**db_client_guard;
        get_job_batch(
            db_client,
            JobQueue::InboxProcess,
            config.federation.inbox_queue_batch_size,
            JOB_TIMEOUT,
        ).await?
    };
    for job in batch {
        let job_data: IncomingActivityJobData =
            serde_json::from_value(job.job_data)
                .map_err(|_| DatabaseTypeError)?;
        let duration_max = StdDuration::from_secs((JOB_TIMEOUT / 6).into());
        let handler_future = process_incoming(
            config,
            db_pool,
            state,
            &job_data.activity,
            &job_data.actor_uri,
            job_data.recipient.as_deref(),
        );
        let timed_result = tokio::time::timeout(
            duration_max,
            handler_future,
        ).await;
        let db_client_guard = get_database_client(db_pool).await?;
        let db_client = &**db_client_guard;
        let handler_result = match timed_result {
            Ok(result) => result,
            Err(_) => {
                log::error!(
                    "failed to process activity (timeout): {}",
                    job_data.activity,
                );
                delete_job_from_queue(db_client, job.id).await?;
                continue;
            },
        };
        match handler_result {
            Ok(PipelineOutcome::Rejected(reason)) => {
                log::info!("activity rejected ({}): {}", reason, job_data.activity);
                delete_job_from_queue(db_client, job.id).await?;
            },
            Ok(outcome) => {
                log::debug!("activity processed: {:?}", outcome);
                delete_job_from_queue(db_client, job.id).await?;
            },
            Err(error) => {
                if error.is_terminal() || job.attempt >= INCOMING_RETRIES_MAX {
                    log::warn!(
                        "failed to process activity ({}): {}",
                        error,
                        job_data.activity,
                    );
                    delete_job_from_queue(db_client, job.id).await?;
                } else {
                    log::warn!(
                        "failed to process activity ({}) (attempt #{}), re-queued",
                        error,
                        job.attempt + 1,
                    );
                    let retry_after = incoming_queue_backoff(job.attempt);
                    retry_job(db_client, job.id, retry_after).await?;
                };
            },
        };
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    #[test]
    fn test_activity_priority() {
        let create = json!({"type": "Create", "object": {"type": "Note"}});
        assert_eq!(activity_priority(&create), 0);
        let follow = json!({"type": "Follow"});
        assert_eq!(activity_priority(&follow), 1);
        let like = json!({"type": "Like"});
        assert_eq!(activity_priority(&like), 2);
        let unknown = json!({"type": "Listen"});
        assert_eq!(activity_priority(&unknown), 1);
    }

    #[test]
    fn test_activity_priority_announce() {
        // Announced content keeps content priority
        let announce = json!({
            "type": "Announce",
            "object": "https://remote.example/objects/1",
        });
        assert_eq!(activity_priority(&announce), 0);
        let announce_note = json!({
            "type": "Announce",
            "object": {"type": "Note", "content": "hi"},
        });
        assert_eq!(activity_priority(&announce_note), 0);
        // Announced reactions are low priority
        let announce_like = json!({
            "type": "Announce",
            "object": {"type": "Like", "object": "https://remote.example/objects/1"},
        });
        assert_eq!(activity_priority(&announce_like), 2);
    }

    #[test]
    fn test_delivery_job_tracker() {
        let tracker = DeliveryJobTracker::new();
        let delivery_id = Uuid::new_v4();
        assert_eq!(tracker.try_track(delivery_id), true);
        // Second enqueue within the window is suppressed
        assert_eq!(tracker.try_track(delivery_id), false);
        // Other deliveries are unaffected
        assert_eq!(tracker.try_track(Uuid::new_v4()), true);
    }
}
