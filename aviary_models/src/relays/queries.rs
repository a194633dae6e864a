use uuid::Uuid;

use crate::database::{
    catch_unique_violation,
    DatabaseClient,
    DatabaseError,
};

use super::types::{DbRelaySubscription, RelaySubscriptionStatus};

pub async fn create_relay_subscription(
    db_client: &impl DatabaseClient,
    relay_uri: &str,
    relay_inbox: &str,
    follow_activity_id: &str,
) -> Result<DbRelaySubscription, DatabaseError> {
    let subscription_id = Uuid::new_v4();
    let row = db_client.query_one(
        "
        INSERT INTO relay_subscription (
            id,
            relay_uri,
            relay_inbox,
            follow_activity_id,
            status
        )
        VALUES ($1, $2, $3, $4, $5)
        RETURNING relay_subscription.*
        ",
        &[
            &subscription_id,
            &relay_uri,
            &relay_inbox,
            &follow_activity_id,
            &RelaySubscriptionStatus::Pending,
        ],
    ).await.map_err(catch_unique_violation("relay subscription"))?;
    let subscription = DbRelaySubscription::try_from_row(&row)?;
    Ok(subscription)
}

pub async fn get_relay_subscription_by_uri(
    db_client: &impl DatabaseClient,
    relay_uri: &str,
) -> Result<DbRelaySubscription, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        SELECT relay_subscription.* FROM relay_subscription
        WHERE relay_uri = $1
        ",
        &[&relay_uri],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("relay subscription"))?;
    let subscription = DbRelaySubscription::try_from_row(&row)?;
    Ok(subscription)
}

pub async fn get_relay_subscription_by_follow_activity_id(
    db_client: &impl DatabaseClient,
    follow_activity_id: &str,
) -> Result<DbRelaySubscription, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        SELECT relay_subscription.* FROM relay_subscription
        WHERE follow_activity_id = $1
        ",
        &[&follow_activity_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("relay subscription"))?;
    let subscription = DbRelaySubscription::try_from_row(&row)?;
    Ok(subscription)
}

pub async fn get_relay_subscription_by_inbox(
    db_client: &impl DatabaseClient,
    relay_inbox: &str,
) -> Result<DbRelaySubscription, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        SELECT relay_subscription.* FROM relay_subscription
        WHERE relay_inbox = $1
        ",
        &[&relay_inbox],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("relay subscription"))?;
    let subscription = DbRelaySubscription::try_from_row(&row)?;
    Ok(subscription)
}

pub async fn get_active_relay_subscriptions(
    db_client: &impl DatabaseClient,
) -> Result<Vec<DbRelaySubscription>, DatabaseError> {
    let rows = db_client.query(
        "
        SELECT relay_subscription.* FROM relay_subscription
        WHERE status = $1
        ",
        &[&RelaySubscriptionStatus::Active],
    ).await?;
    let subscriptions = rows.iter()
        .map(DbRelaySubscription::try_from_row)
        .collect::<Result<_, _>>()?;
    Ok(subscriptions)
}

pub async fn set_relay_subscription_status(
    db_client: &impl DatabaseClient,
    subscription_id: Uuid,
    status: RelaySubscriptionStatus,
) -> Result<(), DatabaseError> {
    let updated_count = db_client.execute(
        "UPDATE relay_subscription SET status = $2 WHERE id = $1",
        &[&subscription_id, &status],
    ).await?;
    if updated_count == 0 {
        return Err(DatabaseError::NotFound("relay subscription"));
    };
    Ok(())
}

pub async fn delete_relay_subscription(
    db_client: &impl DatabaseClient,
    subscription_id: Uuid,
) -> Result<(), DatabaseError> {
    db_client.execute(
        "DELETE FROM relay_subscription WHERE id = $1",
        &[&subscription_id],
    ).await?;
    Ok(())
}
