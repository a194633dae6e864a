use chrono::{DateTime, Utc};
use serde_json::{Value as JsonValue};
use uuid::Uuid;

use crate::database::{
    int_enum::{int_enum_from_sql, int_enum_to_sql},
    DatabaseTypeError,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Visibility {
    Public,
    Unlisted,
    Followers,
    Direct,
}

impl From<Visibility> for i16 {
    fn from(value: Visibility) -> i16 {
        match value {
            Visibility::Public => 1,
            Visibility::Unlisted => 2,
            Visibility::Followers => 3,
            Visibility::Direct => 4,
        }
    }
}

impl TryFrom<i16> for Visibility {
    type Error = DatabaseTypeError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        let visibility = match value {
            1 => Self::Public,
            2 => Self::Unlisted,
            3 => Self::Followers,
            4 => Self::Direct,
            _ => return Err(DatabaseTypeError),
        };
        Ok(visibility)
    }
}

int_enum_from_sql!(Visibility);
int_enum_to_sql!(Visibility);

pub struct DbMessage {
    pub id: Uuid,
    pub author_actor_id: Uuid,
    pub content: String,
    pub visibility: Visibility,
    pub activitypub_id: Option<String>,
    pub reply_to_id: Option<Uuid>,
    pub reply_count: i32,
    pub like_count: i32,
    pub dislike_count: i32,
    pub share_count: i32,
    pub sensitive: bool,
    pub content_warning: Option<String>,
    pub title: Option<String>,
    pub media: JsonValue,
    pub community_actor_uri: Option<String>,
    pub edited_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DbMessage {
    pub(crate) fn try_from_row(
        row: &tokio_postgres::Row,
    ) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            author_actor_id: row.try_get("author_actor_id")?,
            content: row.try_get("content")?,
            visibility: row.try_get("visibility")?,
            activitypub_id: row.try_get("activitypub_id")?,
            reply_to_id: row.try_get("reply_to_id")?,
            reply_count: row.try_get("reply_count")?,
            like_count: row.try_get("like_count")?,
            dislike_count: row.try_get("dislike_count")?,
            share_count: row.try_get("share_count")?,
            sensitive: row.try_get("sensitive")?,
            content_warning: row.try_get("content_warning")?,
            title: row.try_get("title")?,
            media: row.try_get("media")?,
            community_actor_uri: row.try_get("community_actor_uri")?,
            edited_at: row.try_get("edited_at")?,
            deleted_at: row.try_get("deleted_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Field set accepted by message create queries
pub struct MessageData {
    pub author_actor_id: Uuid,
    pub content: String,
    pub visibility: Visibility,
    pub activitypub_id: Option<String>,
    pub reply_to_id: Option<Uuid>,
    pub sensitive: bool,
    pub content_warning: Option<String>,
    pub title: Option<String>,
    pub media: JsonValue,
    pub community_actor_uri: Option<String>,
}
