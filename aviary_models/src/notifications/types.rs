use crate::database::{
    int_enum::{int_enum_from_sql, int_enum_to_sql},
    DatabaseTypeError,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NotificationType {
    Follow,
    FollowRequest,
    Reply,
    Like,
    Share,
    Mention,
    Report,
}

impl From<NotificationType> for i16 {
    fn from(value: NotificationType) -> i16 {
        match value {
            NotificationType::Follow => 1,
            NotificationType::FollowRequest => 2,
            NotificationType::Reply => 3,
            NotificationType::Like => 4,
            NotificationType::Share => 5,
            NotificationType::Mention => 6,
            NotificationType::Report => 7,
        }
    }
}

impl TryFrom<i16> for NotificationType {
    type Error = DatabaseTypeError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        let notification_type = match value {
            1 => Self::Follow,
            2 => Self::FollowRequest,
            3 => Self::Reply,
            4 => Self::Like,
            5 => Self::Share,
            6 => Self::Mention,
            7 => Self::Report,
            _ => return Err(DatabaseTypeError),
        };
        Ok(notification_type)
    }
}

int_enum_from_sql!(NotificationType);
int_enum_to_sql!(NotificationType);
