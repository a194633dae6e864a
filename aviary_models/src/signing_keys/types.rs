use chrono::{DateTime, Utc};
use uuid::Uuid;

pub struct DbSigningKey {
    pub key_id: String,
    pub actor_id: Option<Uuid>,
    pub public_key_pem: String,
    pub private_key_pem: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl DbSigningKey {
    pub(crate) fn try_from_row(
        row: &tokio_postgres::Row,
    ) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            key_id: row.try_get("key_id")?,
            actor_id: row.try_get("actor_id")?,
            public_key_pem: row.try_get("public_key_pem")?,
            private_key_pem: row.try_get("private_key_pem")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
