//! Periodic federation maintenance
use aviary_activitypub::{
    deliverer::process_queued_deliveries,
    deserialization::object_to_id,
    handlers::HandlerContext,
    importers::{get_or_fetch_actor_by_uri, import_message},
    queues::{
        process_queued_incoming_activities,
        DeliveryJobData,
        MaintenanceJobData,
    },
    state::FederationState,
};
use aviary_config::Config;
use aviary_fetch::{
    collections::fetch_collection_items,
    fetch::{fetch_object, FetchObjectOptions},
};
use aviary_models::{
    background_jobs::queries::{
        delete_job_from_queue,
        delete_stale_jobs,
        get_job_batch,
    },
    background_jobs::types::JobQueue,
    database::{
        get_database_client,
        DatabaseConnectionPool,
        DatabaseError,
        DatabaseTypeError,
    },
    deliveries::queries::{delete_old_failed_deliveries, get_due_deliveries},
};

const MAINTENANCE_BATCH_SIZE: u32 = 5;
const MAINTENANCE_JOB_TIMEOUT: u32 = 3600;

const FAILED_DELIVERY_RETENTION_DAYS: u32 = 7;

pub async fn incoming_activity_queue_executor(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
) -> Result<(), anyhow::Error> {
    process_queued_incoming_activities(config, db_pool, state).await?;
    Ok(())
}

pub async fn delivery_queue_executor(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
) -> Result<(), anyhow::Error> {
    process_queued_deliveries(config, db_pool, state).await?;
    Ok(())
}

/// Re-enqueues failed deliveries whose retry time has passed.
/// The in-memory uniqueness window keeps a delivery from getting
/// two jobs while one is still queued.
pub async fn retry_scheduler(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
) -> Result<(), anyhow::Error> {
    let db_client_guard = get_database_client(db_pool).await?;
    let db_client = &**db_client_guard;
    let due = get_due_deliveries(
        db_client,
        config.limits.delivery.max_delivery_attempts,
        config.limits.delivery.retry_batch_size,
    ).await?;
    let mut scheduled = 0;
    for delivery in due {
        if !state.delivery_tracker.try_track(delivery.id) {
            continue;
        };
        let job_data = DeliveryJobData::new(delivery.id);
        job_data.into_job(db_client, 0).await?;
        scheduled += 1;
    };
    if scheduled > 0 {
        log::info!("retry scheduler: {} deliveries re-queued", scheduled);
    };
    Ok(())
}

async fn ingest_replies(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
    collection_id: &str,
) -> Result<(), anyhow::Error> {
    let mut context = HandlerContext::new(config, state);
    let agent = context.agent();
    let items = fetch_collection_items(
        &agent,
        &state.object_cache,
        collection_id,
        config.federation.max_collection_pages,
        config.federation.max_collection_items,
    ).await?.into_items();
    let db_client_guard = get_database_client(db_pool).await?;
    let db_client = &**db_client_guard;
    for item in items {
        let object = if item.is_object() {
            item
        } else {
            let Ok(object_id) = object_to_id(&item) else {
                continue;
            };
            match fetch_object(
                &agent,
                &state.object_cache,
                &object_id,
                FetchObjectOptions::default(),
            ).await {
                Ok(object) => object,
                Err(error) => {
                    log::warn!("failed to fetch reply {}: {}", object_id, error);
                    continue;
                },
            }
        };
        let Ok(author_uri) = object_to_id(&object["attributedTo"]) else {
            continue;
        };
        let author = match get_or_fetch_actor_by_uri(
            db_client,
            &agent,
            &state.object_cache,
            &author_uri,
        ).await {
            Ok(author) => author,
            Err(error) => {
                log::warn!("failed to fetch reply author: {}", error);
                continue;
            },
        };
        match import_message(&mut context, db_client, &object, &author).await {
            Ok(_) => (),
            Err(error) => log::warn!("failed to store reply: {}", error),
        };
    };
    state.side_effects.dispatch(db_pool, context.take_effects()).await;
    Ok(())
}

pub async fn maintenance_queue_executor(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
) -> Result<(), anyhow::Error> {
    let batch = {
        let db_client_guard = get_database_client(db_pool).await?;
        let db_client = &**db_client_guard;
        get_job_batch(
            db_client,
            JobQueue::Maintenance,
            MAINTENANCE_BATCH_SIZE,
            MAINTENANCE_JOB_TIMEOUT,
        ).await?
    };
    for job in batch {
        let job_data: MaintenanceJobData =
            serde_json::from_value::<MaintenanceJobData>(job.job_data.clone())
                .map_err(|_| DatabaseError::from(DatabaseTypeError))?;
        match job_data {
            MaintenanceJobData::RepliesIngest { ref collection_id } => {
                let result = ingest_replies(
                    config,
                    db_pool,
                    state,
                    collection_id,
                ).await;
                if let Err(error) = result {
                    log::warn!("replies ingest failed: {}", error);
                };
            },
        };
        let db_client_guard = get_database_client(db_pool).await?;
        let db_client = &**db_client_guard;
        delete_job_from_queue(db_client, job.id).await?;
    };
    Ok(())
}

/// Removes expired entries from the advisory in-memory tables
pub fn cache_sweep(state: &FederationState) -> Result<(), anyhow::Error> {
    state.inbox_queue.sweep();
    state.rate_limiter.sweep();
    state.delivery_tracker.sweep();
    Ok(())
}

// Jobs past these ages are discarded, never retried forever
const STALE_INBOX_JOB_AGE: u32 = 86_400;
const STALE_MAINTENANCE_JOB_AGE: u32 = 86_400;

pub async fn stale_job_cleanup(
    db_pool: &DatabaseConnectionPool,
) -> Result<(), anyhow::Error> {
    let db_client_guard = get_database_client(db_pool).await?;
    let db_client = &**db_client_guard;
    let mut deleted_count = delete_stale_jobs(
        db_client,
        JobQueue::InboxProcess,
        STALE_INBOX_JOB_AGE,
    ).await?;
    deleted_count += delete_stale_jobs(
        db_client,
        JobQueue::Maintenance,
        STALE_MAINTENANCE_JOB_AGE,
    ).await?;
    if deleted_count > 0 {
        log::info!("deleted {} stale jobs", deleted_count);
    };
    Ok(())
}

pub async fn failed_delivery_cleanup(
    db_pool: &DatabaseConnectionPool,
) -> Result<(), anyhow::Error> {
    let db_client_guard = get_database_client(db_pool).await?;
    let db_client = &**db_client_guard;
    let deleted_count = delete_old_failed_deliveries(
        db_client,
        FAILED_DELIVERY_RETENTION_DAYS,
    ).await?;
    if deleted_count > 0 {
        log::info!("deleted {} failed deliveries", deleted_count);
    };
    Ok(())
}
