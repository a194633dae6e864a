use chrono::{DateTime, Utc};
use uuid::Uuid;

pub struct DbReport {
    pub id: Uuid,
    pub reporter_actor_uri: String,
    pub target_actor_id: Option<Uuid>,
    pub message_ids: Vec<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl DbReport {
    pub(crate) fn try_from_row(
        row: &tokio_postgres::Row,
    ) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            reporter_actor_uri: row.try_get("reporter_actor_uri")?,
            target_actor_id: row.try_get("target_actor_id")?,
            message_ids: row.try_get("message_ids")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
