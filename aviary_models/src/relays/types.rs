use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::{
    int_enum::{int_enum_from_sql, int_enum_to_sql},
    DatabaseTypeError,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RelaySubscriptionStatus {
    Pending,
    Active,
    Rejected,
    Error,
}

impl From<RelaySubscriptionStatus> for i16 {
    fn from(value: RelaySubscriptionStatus) -> i16 {
        match value {
            RelaySubscriptionStatus::Pending => 1,
            RelaySubscriptionStatus::Active => 2,
            RelaySubscriptionStatus::Rejected => 3,
            RelaySubscriptionStatus::Error => 4,
        }
    }
}

impl TryFrom<i16> for RelaySubscriptionStatus {
    type Error = DatabaseTypeError;

    fn try_from(value: i16) -> Result<Self, DatabaseTypeError> {
        let status = match value {
            1 => Self::Pending,
            2 => Self::Active,
            3 => Self::Rejected,
            4 => Self::Error,
            _ => return Err(DatabaseTypeError),
        };
        Ok(status)
    }
}

int_enum_from_sql!(RelaySubscriptionStatus);
int_enum_to_sql!(RelaySubscriptionStatus);

pub struct DbRelaySubscription {
    pub id: Uuid,
    pub relay_uri: String,
    pub relay_inbox: String,
    pub follow_activity_id: String,
    pub status: RelaySubscriptionStatus,
    pub created_at: DateTime<Utc>,
}

impl DbRelaySubscription {
    pub(crate) fn try_from_row(
        row: &tokio_postgres::Row,
    ) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            relay_uri: row.try_get("relay_uri")?,
            relay_inbox: row.try_get("relay_inbox")?,
            follow_activity_id: row.try_get("follow_activity_id")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
