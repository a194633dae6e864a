use chrono::Utc;
use uuid::Uuid;

use crate::database::{DatabaseClient, DatabaseError};

use super::types::{ActorData, DbActor};

pub async fn create_or_update_actor(
    db_client: &impl DatabaseClient,
    actor_data: ActorData,
) -> Result<DbActor, DatabaseError> {
    let actor_id = Uuid::new_v4();
    let row = db_client.query_one(
        "
        INSERT INTO actor (
            id,
            uri,
            username,
            domain,
            actor_type,
            inbox_url,
            shared_inbox_url,
            outbox_url,
            followers_url,
            public_key_pem,
            manually_approves_followers,
            is_local,
            last_fetched_at,
            metadata
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        ON CONFLICT (uri)
        DO UPDATE SET
            actor_type = $5,
            inbox_url = $6,
            shared_inbox_url = $7,
            outbox_url = $8,
            followers_url = $9,
            public_key_pem = $10,
            manually_approves_followers = $11,
            last_fetched_at = $13,
            metadata = $14
        RETURNING actor.*
        ",
        &[
            &actor_id,
            &actor_data.uri,
            &actor_data.username,
            &actor_data.domain,
            &actor_data.actor_type,
            &actor_data.inbox_url,
            &actor_data.shared_inbox_url,
            &actor_data.outbox_url,
            &actor_data.followers_url,
            &actor_data.public_key_pem,
            &actor_data.manually_approves_followers,
            &actor_data.is_local,
            &Utc::now(),
            &actor_data.metadata,
        ],
    ).await?;
    let actor = DbActor::try_from_row(&row)?;
    Ok(actor)
}

pub async fn get_actor_by_id(
    db_client: &impl DatabaseClient,
    actor_id: Uuid,
) -> Result<DbActor, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "SELECT actor.* FROM actor WHERE id = $1",
        &[&actor_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("actor"))?;
    let actor = DbActor::try_from_row(&row)?;
    Ok(actor)
}

pub async fn get_actor_by_uri(
    db_client: &impl DatabaseClient,
    actor_uri: &str,
) -> Result<DbActor, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "SELECT actor.* FROM actor WHERE uri = $1",
        &[&actor_uri],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("actor"))?;
    let actor = DbActor::try_from_row(&row)?;
    Ok(actor)
}

pub async fn get_local_actor_by_username(
    db_client: &impl DatabaseClient,
    username: &str,
) -> Result<DbActor, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        SELECT actor.* FROM actor
        WHERE username = $1 AND is_local = TRUE
        ",
        &[&username],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("actor"))?;
    let actor = DbActor::try_from_row(&row)?;
    Ok(actor)
}

/// Returns an advertised shared inbox of any cached actor on the given host
pub async fn get_shared_inbox_for_domain(
    db_client: &impl DatabaseClient,
    domain: &str,
) -> Result<Option<String>, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        SELECT shared_inbox_url FROM actor
        WHERE domain = $1 AND shared_inbox_url IS NOT NULL
        LIMIT 1
        ",
        &[&domain],
    ).await?;
    let maybe_shared_inbox = match maybe_row {
        Some(row) => row.try_get("shared_inbox_url")?,
        None => None,
    };
    Ok(maybe_shared_inbox)
}

pub async fn set_actor_metadata(
    db_client: &impl DatabaseClient,
    actor_id: Uuid,
    metadata: &serde_json::Value,
) -> Result<(), DatabaseError> {
    let updated_count = db_client.execute(
        "UPDATE actor SET metadata = $2 WHERE id = $1",
        &[&actor_id, metadata],
    ).await?;
    if updated_count == 0 {
        return Err(DatabaseError::NotFound("actor"));
    };
    Ok(())
}
