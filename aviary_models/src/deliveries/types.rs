use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::{
    int_enum::{int_enum_from_sql, int_enum_to_sql},
    DatabaseTypeError,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DeliveryStatus {
    Pending,
    Delivered,
    Failed,
}

impl From<DeliveryStatus> for i16 {
    fn from(value: DeliveryStatus) -> i16 {
        match value {
            DeliveryStatus::Pending => 1,
            DeliveryStatus::Delivered => 2,
            DeliveryStatus::Failed => 3,
        }
    }
}

impl TryFrom<i16> for DeliveryStatus {
    type Error = DatabaseTypeError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        let status = match value {
            1 => Self::Pending,
            2 => Self::Delivered,
            3 => Self::Failed,
            _ => return Err(DatabaseTypeError),
        };
        Ok(status)
    }
}

int_enum_from_sql!(DeliveryStatus);
int_enum_to_sql!(DeliveryStatus);

pub struct DbDelivery {
    pub id: Uuid,
    pub activity_id: Uuid,
    pub inbox_url: String,
    pub status: DeliveryStatus,
    pub attempts: i32,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DbDelivery {
    pub(crate) fn try_from_row(
        row: &tokio_postgres::Row,
    ) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            activity_id: row.try_get("activity_id")?,
            inbox_url: row.try_get("inbox_url")?,
            status: row.try_get("status")?,
            attempts: row.try_get("attempts")?,
            last_attempt_at: row.try_get("last_attempt_at")?,
            next_retry_at: row.try_get("next_retry_at")?,
            error_message: row.try_get("error_message")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_status_int_round_trip() {
        for status in [
            DeliveryStatus::Pending,
            DeliveryStatus::Delivered,
            DeliveryStatus::Failed,
        ] {
            let int_value = i16::from(status);
            assert_eq!(DeliveryStatus::try_from(int_value).unwrap(), status);
        };
    }
}
