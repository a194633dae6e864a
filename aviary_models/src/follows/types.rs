use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::{
    int_enum::{int_enum_from_sql, int_enum_to_sql},
    DatabaseTypeError,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FollowStatus {
    Pending,
    Active,
    Rejected,
}

impl From<FollowStatus> for i16 {
    fn from(value: FollowStatus) -> i16 {
        match value {
            FollowStatus::Pending => 1,
            FollowStatus::Active => 2,
            FollowStatus::Rejected => 3,
        }
    }
}

impl TryFrom<i16> for FollowStatus {
    type Error = DatabaseTypeError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        let status = match value {
            1 => Self::Pending,
            2 => Self::Active,
            3 => Self::Rejected,
            _ => return Err(DatabaseTypeError),
        };
        Ok(status)
    }
}

int_enum_from_sql!(FollowStatus);
int_enum_to_sql!(FollowStatus);

pub struct DbFollow {
    pub id: Uuid,
    pub source_actor_id: Uuid,
    pub target_actor_id: Uuid,
    pub activity_id: Option<String>,
    pub status: FollowStatus,
    pub created_at: DateTime<Utc>,
}

impl DbFollow {
    pub(crate) fn try_from_row(
        row: &tokio_postgres::Row,
    ) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            source_actor_id: row.try_get("source_actor_id")?,
            target_actor_id: row.try_get("target_actor_id")?,
            activity_id: row.try_get("activity_id")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
