use chrono::Utc;
use uuid::Uuid;

use crate::database::{DatabaseClient, DatabaseError};

use super::types::DbSigningKey;

pub async fn upsert_signing_key(
    db_client: &impl DatabaseClient,
    key_id: &str,
    actor_id: Option<Uuid>,
    public_key_pem: &str,
    private_key_pem: Option<&str>,
) -> Result<DbSigningKey, DatabaseError> {
    let row = db_client.query_one(
        "
        INSERT INTO signing_key (
            key_id,
            actor_id,
            public_key_pem,
            private_key_pem,
            updated_at
        )
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (key_id)
        DO UPDATE SET
            public_key_pem = $3,
            private_key_pem = $4,
            updated_at = $5
        RETURNING signing_key.*
        ",
        &[&key_id, &actor_id, &public_key_pem, &private_key_pem, &Utc::now()],
    ).await?;
    let key = DbSigningKey::try_from_row(&row)?;
    Ok(key)
}

pub async fn get_signing_key(
    db_client: &impl DatabaseClient,
    key_id: &str,
) -> Result<DbSigningKey, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "SELECT signing_key.* FROM signing_key WHERE key_id = $1",
        &[&key_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("signing key"))?;
    let key = DbSigningKey::try_from_row(&row)?;
    Ok(key)
}

pub async fn get_signing_key_by_actor_id(
    db_client: &impl DatabaseClient,
    actor_id: Uuid,
) -> Result<DbSigningKey, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "SELECT signing_key.* FROM signing_key WHERE actor_id = $1",
        &[&actor_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("signing key"))?;
    let key = DbSigningKey::try_from_row(&row)?;
    Ok(key)
}
