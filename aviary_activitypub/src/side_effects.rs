//! Post-commit fan-out.
//!
//! Handlers collect side effects while running inside the pipeline
//! transaction; the bus dispatches them after commit. Failures here
//! are logged and swallowed so they can never undo primary state.
use tokio::sync::broadcast;
use uuid::Uuid;

use aviary_models::{
    database::{
        get_database_client,
        DatabaseConnectionPool,
        DatabaseError,
    },
    notifications::queries::{
        create_admin_notifications,
        create_notification,
    },
    notifications::types::NotificationType,
};

const TIMELINE_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone, Debug)]
pub enum SideEffect {
    Notify {
        recipient_actor_id: Uuid,
        notification_type: NotificationType,
        sender_actor_id: Option<Uuid>,
        message_id: Option<Uuid>,
    },
    NotifyAdmins {
        notification_type: NotificationType,
        sender_actor_id: Option<Uuid>,
    },
    /// New public message for the federated timeline
    TimelineBroadcast {
        message_id: Uuid,
    },
}

#[derive(Clone, Debug)]
pub struct TimelineEvent {
    pub message_id: Uuid,
}

#[derive(Clone)]
pub struct SideEffectBus {
    timeline_tx: broadcast::Sender<TimelineEvent>,
}

impl Default for SideEffectBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SideEffectBus {
    pub fn new() -> Self {
        let (timeline_tx, _) = broadcast::channel(TIMELINE_CHANNEL_CAPACITY);
        Self { timeline_tx }
    }

    pub fn subscribe_timeline(&self) -> broadcast::Receiver<TimelineEvent> {
        self.timeline_tx.subscribe()
    }

    async fn dispatch_one(
        &self,
        db_pool: &DatabaseConnectionPool,
        effect: SideEffect,
    ) -> Result<(), DatabaseError> {
        match effect {
            SideEffect::Notify {
                recipient_actor_id,
                notification_type,
                sender_actor_id,
                message_id,
            } => {
                let db_client_guard = get_database_client(db_pool).await?;
                let db_client = &**db_client_guard;
                create_notification(
                    db_client,
                    recipient_actor_id,
                    notification_type,
                    sender_actor_id,
                    message_id,
                ).await?;
            },
            SideEffect::NotifyAdmins { notification_type, sender_actor_id } => {
                let db_client_guard = get_database_client(db_pool).await?;
                let db_client = &**db_client_guard;
                create_admin_notifications(
                    db_client,
                    notification_type,
                    sender_actor_id,
                ).await?;
            },
            SideEffect::TimelineBroadcast { message_id } => {
                // No subscribers is not an error
                let _ = self.timeline_tx.send(TimelineEvent { message_id });
            },
        };
        Ok(())
    }

    /// Runs every collected effect, best effort
    pub async fn dispatch(
        &self,
        db_pool: &DatabaseConnectionPool,
        effects: Vec<SideEffect>,
    ) {
        for effect in effects {
            if let Err(error) = self.dispatch_one(db_pool, effect).await {
                log::warn!("side effect failed: {}", error);
            };
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeline_broadcast() {
        let bus = SideEffectBus::new();
        let mut receiver = bus.subscribe_timeline();
        let message_id = Uuid::new_v4();
        let _ = bus.timeline_tx.send(TimelineEvent { message_id });
        let event = receiver.recv().await.unwrap();
        assert_eq!(event.message_id, message_id);
    }
}
