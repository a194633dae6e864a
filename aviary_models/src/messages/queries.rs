use chrono::Utc;
use uuid::Uuid;

use crate::database::{
    catch_unique_violation,
    DatabaseClient,
    DatabaseError,
};

use super::types::{DbMessage, MessageData};

pub async fn create_message(
    db_client: &impl DatabaseClient,
    message_data: MessageData,
) -> Result<DbMessage, DatabaseError> {
    let message_id = Uuid::new_v4();
    let row = db_client.query_one(
        "
        INSERT INTO message (
            id,
            author_actor_id,
            content,
            visibility,
            activitypub_id,
            reply_to_id,
            sensitive,
            content_warning,
            title,
            media,
            community_actor_uri
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING message.*
        ",
        &[
            &message_id,
            &message_data.author_actor_id,
            &message_data.content,
            &message_data.visibility,
            &message_data.activitypub_id,
            &message_data.reply_to_id,
            &message_data.sensitive,
            &message_data.content_warning,
            &message_data.title,
            &message_data.media,
            &message_data.community_actor_uri,
        ],
    ).await.map_err(catch_unique_violation("message"))?;
    let message = DbMessage::try_from_row(&row)?;
    Ok(message)
}

pub async fn get_message_by_id(
    db_client: &impl DatabaseClient,
    message_id: Uuid,
) -> Result<DbMessage, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        SELECT message.* FROM message
        WHERE id = $1 AND deleted_at IS NULL
        ",
        &[&message_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("message"))?;
    let message = DbMessage::try_from_row(&row)?;
    Ok(message)
}

pub async fn get_message_by_activitypub_id(
    db_client: &impl DatabaseClient,
    activitypub_id: &str,
) -> Result<DbMessage, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        SELECT message.* FROM message
        WHERE activitypub_id = $1 AND deleted_at IS NULL
        ",
        &[&activitypub_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("message"))?;
    let message = DbMessage::try_from_row(&row)?;
    Ok(message)
}

/// Assigns an ActivityPub ID on first federation of a local post
pub async fn set_message_activitypub_id(
    db_client: &impl DatabaseClient,
    message_id: Uuid,
    activitypub_id: &str,
) -> Result<(), DatabaseError> {
    db_client.execute(
        "
        UPDATE message SET activitypub_id = $2
        WHERE id = $1 AND activitypub_id IS NULL
        ",
        &[&message_id, &activitypub_id],
    ).await.map_err(catch_unique_violation("message"))?;
    Ok(())
}

pub async fn update_message_content(
    db_client: &impl DatabaseClient,
    message_id: Uuid,
    content: &str,
    sensitive: bool,
    content_warning: Option<&str>,
) -> Result<(), DatabaseError> {
    let updated_count = db_client.execute(
        "
        UPDATE message
        SET content = $2, sensitive = $3, content_warning = $4, edited_at = $5
        WHERE id = $1 AND deleted_at IS NULL
        ",
        &[&message_id, &content, &sensitive, &content_warning, &Utc::now()],
    ).await?;
    if updated_count == 0 {
        return Err(DatabaseError::NotFound("message"));
    };
    Ok(())
}

pub async fn soft_delete_message(
    db_client: &impl DatabaseClient,
    message_id: Uuid,
) -> Result<(), DatabaseError> {
    db_client.execute(
        "
        UPDATE message SET deleted_at = $2, content = ''
        WHERE id = $1 AND deleted_at IS NULL
        ",
        &[&message_id, &Utc::now()],
    ).await?;
    Ok(())
}

#[derive(Clone, Copy)]
pub enum MessageCounter {
    Reply,
    Like,
    Dislike,
    Share,
}

impl MessageCounter {
    fn column(self) -> &'static str {
        match self {
            Self::Reply => "reply_count",
            Self::Like => "like_count",
            Self::Dislike => "dislike_count",
            Self::Share => "share_count",
        }
    }
}

pub async fn change_message_counter(
    db_client: &impl DatabaseClient,
    message_id: Uuid,
    counter: MessageCounter,
    change: i32,
) -> Result<(), DatabaseError> {
    let statement = format!(
        "
        UPDATE message
        SET {column} = GREATEST({column} + $2, 0)
        WHERE id = $1
        ",
        column=counter.column(),
    );
    db_client.execute(&statement, &[&message_id, &change]).await?;
    Ok(())
}
