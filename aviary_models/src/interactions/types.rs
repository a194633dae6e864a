use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::{
    int_enum::{int_enum_from_sql, int_enum_to_sql},
    DatabaseTypeError,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InteractionType {
    Like,
    Dislike,
    EmojiReact,
    Announce,
}

impl From<InteractionType> for i16 {
    fn from(value: InteractionType) -> i16 {
        match value {
            InteractionType::Like => 1,
            InteractionType::Dislike => 2,
            InteractionType::EmojiReact => 3,
            InteractionType::Announce => 4,
        }
    }
}

impl TryFrom<i16> for InteractionType {
    type Error = DatabaseTypeError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        let interaction_type = match value {
            1 => Self::Like,
            2 => Self::Dislike,
            3 => Self::EmojiReact,
            4 => Self::Announce,
            _ => return Err(DatabaseTypeError),
        };
        Ok(interaction_type)
    }
}

int_enum_from_sql!(InteractionType);
int_enum_to_sql!(InteractionType);

pub struct DbInteraction {
    pub id: Uuid,
    pub message_id: Uuid,
    pub actor_uri: String,
    pub activity_id: Option<String>,
    pub interaction_type: InteractionType,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
}

impl DbInteraction {
    pub(crate) fn try_from_row(
        row: &tokio_postgres::Row,
    ) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            message_id: row.try_get("message_id")?,
            actor_uri: row.try_get("actor_uri")?,
            activity_id: row.try_get("activity_id")?,
            interaction_type: row.try_get("interaction_type")?,
            emoji: row.try_get("emoji")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
