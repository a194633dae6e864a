use chrono::{DateTime, Utc};
use serde_json::{Value as JsonValue};
use uuid::Uuid;

use crate::database::{
    int_enum::{int_enum_from_sql, int_enum_to_sql},
    DatabaseTypeError,
};

/// Job queues, drained independently by their executors
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum JobQueue {
    InboxProcess,
    Delivery,
    Maintenance,
}

impl From<JobQueue> for i16 {
    fn from(value: JobQueue) -> i16 {
        match value {
            JobQueue::InboxProcess => 1,
            JobQueue::Delivery => 2,
            JobQueue::Maintenance => 3,
        }
    }
}

impl TryFrom<i16> for JobQueue {
    type Error = DatabaseTypeError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        let queue = match value {
            1 => Self::InboxProcess,
            2 => Self::Delivery,
            3 => Self::Maintenance,
            _ => return Err(DatabaseTypeError),
        };
        Ok(queue)
    }
}

int_enum_from_sql!(JobQueue);
int_enum_to_sql!(JobQueue);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum JobStatus {
    Queued,
    Running,
}

impl From<JobStatus> for i16 {
    fn from(value: JobStatus) -> i16 {
        match value {
            JobStatus::Queued => 1,
            JobStatus::Running => 2,
        }
    }
}

impl TryFrom<i16> for JobStatus {
    type Error = DatabaseTypeError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        let job_status = match value {
            1 => Self::Queued,
            2 => Self::Running,
            _ => return Err(DatabaseTypeError),
        };
        Ok(job_status)
    }
}

int_enum_from_sql!(JobStatus);
int_enum_to_sql!(JobStatus);

/// 0 is the highest priority, 3 the lowest.
/// FIFO order is preserved within a priority level.
pub type JobPriority = i16;

pub const JOB_PRIORITY_HIGHEST: JobPriority = 0;
pub const JOB_PRIORITY_HIGH: JobPriority = 1;
pub const JOB_PRIORITY_LOW: JobPriority = 2;
pub const JOB_PRIORITY_LOWEST: JobPriority = 3;

pub struct DbBackgroundJob {
    pub id: Uuid,
    pub queue: JobQueue,
    pub job_data: JsonValue,
    pub job_status: JobStatus,
    pub priority: JobPriority,
    pub attempt: i32,
    pub scheduled_for: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbBackgroundJob {
    pub(crate) fn try_from_row(
        row: &tokio_postgres::Row,
    ) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            queue: row.try_get("queue")?,
            job_data: row.try_get("job_data")?,
            job_status: row.try_get("job_status")?,
            priority: row.try_get("priority")?,
            attempt: row.try_get("attempt")?,
            scheduled_for: row.try_get("scheduled_for")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
