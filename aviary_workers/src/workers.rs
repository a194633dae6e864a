use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use aviary_activitypub::state::FederationState;
use aviary_config::Config;
use aviary_models::database::DatabaseConnectionPool;

use super::periodic_tasks::*;

const WORKER_DELAY: u64 = 500;

#[derive(Debug, Eq, Hash, PartialEq)]
pub enum PeriodicTask {
    IncomingActivityQueueExecutor,
    DeliveryQueueExecutor,
    RetryScheduler,
    MaintenanceQueueExecutor,
    CacheSweep,
    StaleJobCleanup,
    FailedDeliveryCleanup,
}

impl PeriodicTask {
    /// Returns task period (in seconds)
    fn period(&self) -> i64 {
        match self {
            Self::IncomingActivityQueueExecutor => 1,
            Self::DeliveryQueueExecutor => 1,
            Self::RetryScheduler => 30,
            Self::MaintenanceQueueExecutor => 10,
            Self::CacheSweep => 60,
            Self::StaleJobCleanup => 3600,
            Self::FailedDeliveryCleanup => 3600 * 24,
        }
    }

    fn is_ready(&self, last_run: &Option<DateTime<Utc>>) -> bool {
        match last_run {
            Some(last_run) => {
                let time_passed = Utc::now() - *last_run;
                time_passed.num_seconds() >= self.period()
            },
            None => true,
        }
    }
}

pub async fn run_worker(
    config: Config,
    db_pool: DatabaseConnectionPool,
    state: FederationState,
    tasks: Vec<PeriodicTask>,
) -> () {
    let mut worker_state: HashMap<PeriodicTask, Option<DateTime<Utc>>> =
        HashMap::from_iter(tasks.into_iter().map(|task| (task, None)));
    let mut interval =
        tokio::time::interval(Duration::from_millis(WORKER_DELAY));
    loop {
        interval.tick().await;

        for (task, last_run) in worker_state.iter_mut() {
            if !task.is_ready(last_run) {
                continue;
            };
            let task_result = match task {
                PeriodicTask::IncomingActivityQueueExecutor => {
                    incoming_activity_queue_executor(
                        &config,
                        &db_pool,
                        &state,
                    ).await
                },
                PeriodicTask::DeliveryQueueExecutor => {
                    delivery_queue_executor(&config, &db_pool, &state).await
                },
                PeriodicTask::RetryScheduler => {
                    retry_scheduler(&config, &db_pool, &state).await
                },
                PeriodicTask::MaintenanceQueueExecutor => {
                    maintenance_queue_executor(&config, &db_pool, &state).await
                },
                PeriodicTask::CacheSweep => {
                    cache_sweep(&state)
                },
                PeriodicTask::StaleJobCleanup => {
                    stale_job_cleanup(&db_pool).await
                },
                PeriodicTask::FailedDeliveryCleanup => {
                    failed_delivery_cleanup(&db_pool).await
                },
            };
            task_result.unwrap_or_else(|error| {
                log::error!("{:?}: {}", task, error);
            });
            *last_run = Some(Utc::now());
        };
    };
}

pub fn start_workers(
    config: Config,
    db_pool: DatabaseConnectionPool,
    state: FederationState,
) -> () {
    tokio::spawn(async move {
        let tasks = vec![
            PeriodicTask::IncomingActivityQueueExecutor,
            PeriodicTask::DeliveryQueueExecutor,
            PeriodicTask::RetryScheduler,
            PeriodicTask::MaintenanceQueueExecutor,
            PeriodicTask::CacheSweep,
            PeriodicTask::StaleJobCleanup,
            PeriodicTask::FailedDeliveryCleanup,
        ];
        run_worker(config, db_pool, state, tasks).await;
    });
    log::info!("background worker started");
}
