//! In-memory staging for the inbox hot path.
//!
//! The HTTP handler must return quickly under federation storms, so
//! enqueueing is O(1) and database-free. A single flusher task moves
//! staged activities into the durable queue in small transactional
//! batches. Database uniqueness is not consulted on this path;
//! deduplication happens here, in memory.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::{Value as JsonValue};
use uuid::Uuid;

use aviary_config::InboxQueueLimits;
use aviary_models::database::{
    get_database_client,
    DatabaseConnectionPool,
    DatabaseError,
};

use super::queues::{activity_priority, IncomingActivityJobData};

const DEDUP_WINDOW: Duration = Duration::from_secs(60);

const SHEDDABLE_TYPES: [&str; 3] = ["Like", "Dislike", "EmojiReact"];

#[derive(Clone)]
pub struct StagedActivity {
    pub activity: JsonValue,
    pub actor_uri: String,
    /// Username of the addressed local actor (None for the shared inbox)
    pub recipient: Option<String>,
    pub staged_at: Instant,
}

#[derive(Debug, PartialEq)]
pub enum EnqueueOutcome {
    Queued,
    /// Same activity ID seen within the dedup window
    Duplicate,
    /// Dropped by overload shedding
    Shed,
}

struct QueueState {
    staging: HashMap<Uuid, StagedActivity>,
    seen: HashMap<String, Instant>,
}

#[derive(Clone)]
pub struct InboxQueue {
    limits: InboxQueueLimits,
    state: Arc<Mutex<QueueState>>,
}

/// Low-priority activities may be dropped under overload.
/// Content activities are never shed here.
fn is_sheddable(activity: &JsonValue) -> bool {
    let activity_type = activity["type"].as_str().unwrap_or_default();
    if SHEDDABLE_TYPES.contains(&activity_type) {
        return true;
    };
    if activity_type == "Undo" {
        return activity["object"]["type"].as_str()
            .is_some_and(|inner| SHEDDABLE_TYPES.contains(&inner));
    };
    false
}

/// Drops known-large fields that are never read, shrinking the
/// payload stored in the durable queue
fn trim_payload(value: &mut JsonValue) {
    match value {
        JsonValue::Object(map) => {
            map.remove("contentMap");
            for (_, item) in map.iter_mut() {
                trim_payload(item);
            };
        },
        JsonValue::Array(items) => {
            for item in items.iter_mut() {
                trim_payload(item);
            };
        },
        _ => (),
    };
}

impl InboxQueue {
    pub fn new(limits: InboxQueueLimits) -> Self {
        Self {
            limits,
            state: Arc::new(Mutex::new(QueueState {
                staging: HashMap::new(),
                seen: HashMap::new(),
            })),
        }
    }

    pub fn enqueue(
        &self,
        mut activity: JsonValue,
        actor_uri: &str,
        recipient: Option<&str>,
    ) -> EnqueueOutcome {
        let now = Instant::now();
        let mut state = self.state.lock()
            .expect("inbox queue lock should not be poisoned");
        if let Some(activity_id) = activity["id"].as_str() {
            if let Some(first_seen) = state.seen.get(activity_id) {
                if now.duration_since(*first_seen) < DEDUP_WINDOW {
                    return EnqueueOutcome::Duplicate;
                };
            };
            state.seen.insert(activity_id.to_string(), now);
        };
        if state.staging.len() >= self.limits.max_queue_size &&
            is_sheddable(&activity)
        {
            return EnqueueOutcome::Shed;
        };
        trim_payload(&mut activity);
        let staged = StagedActivity {
            activity,
            actor_uri: actor_uri.to_string(),
            recipient: recipient.map(|value| value.to_string()),
            staged_at: now,
        };
        state.staging.insert(Uuid::new_v4(), staged);
        EnqueueOutcome::Queued
    }

    /// Removes up to `max_batch_size` staged items, key by key
    fn drain_batch(&self) -> Vec<StagedActivity> {
        let mut state = self.state.lock()
            .expect("inbox queue lock should not be poisoned");
        let keys: Vec<Uuid> = state.staging.keys()
            .take(self.limits.max_batch_size)
            .copied()
            .collect();
        keys.iter()
            .filter_map(|key| state.staging.remove(key))
            .collect()
    }

    fn requeue(&self, items: Vec<StagedActivity>) {
        let mut state = self.state.lock()
            .expect("inbox queue lock should not be poisoned");
        for item in items {
            state.staging.insert(Uuid::new_v4(), item);
        };
    }

    /// Moves one batch into the durable queue.
    /// Each chunk is one transaction; a failed chunk puts the
    /// remaining items back into staging for the next tick.
    pub async fn flush(
        &self,
        db_pool: &DatabaseConnectionPool,
    ) -> Result<usize, DatabaseError> {
        let batch = self.drain_batch();
        if batch.is_empty() {
            return Ok(0);
        };
        let mut flushed = 0;
        let mut chunks = batch
            .chunks(self.limits.insert_chunk_size)
            .map(|chunk| chunk.to_vec())
            .collect::<Vec<_>>()
            .into_iter();
        while let Some(chunk) = chunks.next() {
            let chunk_size = chunk.len();
            match self.insert_chunk(db_pool, chunk.clone()).await {
                Ok(()) => flushed += chunk_size,
                Err(error) => {
                    log::error!("inbox queue flush failed: {}", error);
                    let mut remaining = chunk;
                    remaining.extend(chunks.flatten());
                    self.requeue(remaining);
                    return Err(error);
                },
            };
        };
        Ok(flushed)
    }

    async fn insert_chunk(
        &self,
        db_pool: &DatabaseConnectionPool,
        chunk: Vec<StagedActivity>,
    ) -> Result<(), DatabaseError> {
        let mut db_client = get_database_client(db_pool).await?;
        let transaction = db_client.transaction().await?;
        for staged in chunk {
            let priority = activity_priority(&staged.activity);
            let job_data = IncomingActivityJobData::new(
                staged.activity,
                staged.actor_uri,
                staged.recipient,
            );
            job_data.into_job(&*transaction, priority, 0).await?;
        };
        transaction.commit().await?;
        Ok(())
    }

    /// Removes dedup entries older than the window
    pub fn sweep(&self) {
        let now = Instant::now();
        let mut state = self.state.lock()
            .expect("inbox queue lock should not be poisoned");
        state.seen.retain(|_, first_seen| {
            now.duration_since(*first_seen) < DEDUP_WINDOW
        });
    }

    pub fn staged_count(&self) -> usize {
        let state = self.state.lock()
            .expect("inbox queue lock should not be poisoned");
        state.staging.len()
    }
}

/// Spawns the single flusher task
pub fn start_flusher(
    queue: InboxQueue,
    db_pool: DatabaseConnectionPool,
) {
    let interval = Duration::from_millis(queue.limits.flush_interval_ms);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(error) = queue.flush(&db_pool).await {
                log::error!("inbox queue flusher: {}", error);
            };
        };
    });
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    fn limits() -> InboxQueueLimits {
        InboxQueueLimits {
            flush_interval_ms: 500,
            max_batch_size: 25,
            insert_chunk_size: 5,
            max_queue_size: 3,
        }
    }

    fn follow_activity(id: u32) -> JsonValue {
        json!({
            "id": format!("https://remote.example/activities/{}", id),
            "type": "Follow",
            "actor": "https://remote.example/users/alice",
            "object": "https://social.example/users/bob",
        })
    }

    #[test]
    fn test_enqueue_and_dedup() {
        let queue = InboxQueue::new(limits());
        let activity = follow_activity(1);
        let outcome = queue.enqueue(
            activity.clone(),
            "https://remote.example/users/alice",
            None,
        );
        assert_eq!(outcome, EnqueueOutcome::Queued);
        // Second enqueue within the window is a duplicate
        let outcome = queue.enqueue(
            activity,
            "https://remote.example/users/alice",
            None,
        );
        assert_eq!(outcome, EnqueueOutcome::Duplicate);
        assert_eq!(queue.staged_count(), 1);
    }

    #[test]
    fn test_shedding_low_priority_only() {
        let queue = InboxQueue::new(limits());
        for index in 0..3 {
            queue.enqueue(
                follow_activity(index),
                "https://remote.example/users/alice",
                None,
            );
        };
        assert_eq!(queue.staged_count(), 3);

        // Queue is full: a Like is shed
        let like = json!({
            "id": "https://remote.example/activities/like-1",
            "type": "Like",
            "actor": "https://remote.example/users/alice",
            "object": "https://social.example/objects/1",
        });
        let outcome = queue.enqueue(
            like,
            "https://remote.example/users/alice",
            None,
        );
        assert_eq!(outcome, EnqueueOutcome::Shed);

        // An Undo of a Like is shed as well
        let undo_like = json!({
            "id": "https://remote.example/activities/undo-1",
            "type": "Undo",
            "actor": "https://remote.example/users/alice",
            "object": {
                "id": "https://remote.example/activities/like-1",
                "type": "Like",
            },
        });
        let outcome = queue.enqueue(
            undo_like,
            "https://remote.example/users/alice",
            None,
        );
        assert_eq!(outcome, EnqueueOutcome::Shed);

        // Content is never shed
        let outcome = queue.enqueue(
            follow_activity(99),
            "https://remote.example/users/alice",
            None,
        );
        assert_eq!(outcome, EnqueueOutcome::Queued);
    }

    #[test]
    fn test_trim_payload() {
        let mut activity = json!({
            "id": "https://remote.example/activities/1",
            "type": "Create",
            "object": {
                "content": "<p>Hello</p>",
                "contentMap": {"en": "<p>Hello</p>", "de": "<p>Hallo</p>"},
            },
        });
        trim_payload(&mut activity);
        assert_eq!(activity["object"]["contentMap"].is_null(), true);
        assert_eq!(activity["object"]["content"], "<p>Hello</p>");
    }

    #[test]
    fn test_sweep_keeps_recent_entries() {
        let queue = InboxQueue::new(limits());
        queue.enqueue(
            follow_activity(1),
            "https://remote.example/users/alice",
            None,
        );
        queue.sweep();
        // Entry is still within the window
        let outcome = queue.enqueue(
            follow_activity(1),
            "https://remote.example/users/alice",
            None,
        );
        assert_eq!(outcome, EnqueueOutcome::Duplicate);
    }
}
