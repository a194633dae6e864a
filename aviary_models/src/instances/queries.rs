use chrono::Utc;
use uuid::Uuid;

use crate::database::{DatabaseClient, DatabaseError};

use super::types::DbInstance;

pub async fn get_instance_by_domain(
    db_client: &impl DatabaseClient,
    domain: &str,
) -> Result<DbInstance, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "SELECT instance.* FROM instance WHERE domain = $1",
        &[&domain],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("instance"))?;
    let instance = DbInstance::try_from_row(&row)?;
    Ok(instance)
}

/// Returns all records carrying MRF policy flags.
/// Wildcard records (`*.example.com`) are matched by the policy layer.
pub async fn get_instances_with_policies(
    db_client: &impl DatabaseClient,
) -> Result<Vec<DbInstance>, DatabaseError> {
    let rows = db_client.query(
        "
        SELECT instance.* FROM instance
        WHERE
            blocked OR silenced OR media_removal OR media_nsfw
            OR federated_timeline_removal OR followers_only
            OR report_removal OR avatar_removal OR banner_removal
        ",
        &[],
    ).await?;
    let instances = rows.iter()
        .map(DbInstance::try_from_row)
        .collect::<Result<_, _>>()?;
    Ok(instances)
}

/// Records a delivery failure.
/// `unreachable_since` is only set on the transition to unreachable.
pub async fn set_instance_unreachable(
    db_client: &impl DatabaseClient,
    domain: &str,
) -> Result<DbInstance, DatabaseError> {
    let instance_id = Uuid::new_v4();
    let row = db_client.query_one(
        "
        INSERT INTO instance (id, domain, unreachable_since, failure_count)
        VALUES ($1, $2, $3, 1)
        ON CONFLICT (domain)
        DO UPDATE SET
            failure_count = instance.failure_count + 1,
            unreachable_since =
                COALESCE(instance.unreachable_since, $3)
        RETURNING instance.*
        ",
        &[&instance_id, &domain, &Utc::now()],
    ).await?;
    let instance = DbInstance::try_from_row(&row)?;
    Ok(instance)
}

pub async fn set_instance_reachable(
    db_client: &impl DatabaseClient,
    domain: &str,
) -> Result<(), DatabaseError> {
    db_client.execute(
        "
        UPDATE instance
        SET unreachable_since = NULL, failure_count = 0
        WHERE domain = $1
        ",
        &[&domain],
    ).await?;
    Ok(())
}

pub async fn save_instance_nodeinfo(
    db_client: &impl DatabaseClient,
    domain: &str,
    nodeinfo: &serde_json::Value,
) -> Result<(), DatabaseError> {
    let instance_id = Uuid::new_v4();
    db_client.execute(
        "
        INSERT INTO instance (id, domain, nodeinfo)
        VALUES ($1, $2, $3)
        ON CONFLICT (domain)
        DO UPDATE SET nodeinfo = $3
        ",
        &[&instance_id, &domain, &nodeinfo],
    ).await?;
    Ok(())
}
