use chrono::{DateTime, Utc};
use serde_json::{Value as JsonValue};
use uuid::Uuid;

pub struct DbActivity {
    pub id: Uuid,
    pub activity_id: String,
    pub activity_type: String,
    pub actor_uri: String,
    pub object_id: Option<String>,
    pub data: JsonValue,
    pub is_local: bool,
    pub internal_user_id: Option<Uuid>,
    pub processed: bool,
    pub processed_at: Option<DateTime<Utc>>,
    pub process_error: Option<String>,
    pub process_attempts: i32,
    pub created_at: DateTime<Utc>,
}

impl DbActivity {
    pub(crate) fn try_from_row(
        row: &tokio_postgres::Row,
    ) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            activity_id: row.try_get("activity_id")?,
            activity_type: row.try_get("activity_type")?,
            actor_uri: row.try_get("actor_uri")?,
            object_id: row.try_get("object_id")?,
            data: row.try_get("data")?,
            is_local: row.try_get("is_local")?,
            internal_user_id: row.try_get("internal_user_id")?,
            processed: row.try_get("processed")?,
            processed_at: row.try_get("processed_at")?,
            process_error: row.try_get("process_error")?,
            process_attempts: row.try_get("process_attempts")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
