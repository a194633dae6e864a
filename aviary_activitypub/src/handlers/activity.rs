//! Type dispatch for inbound activities
use serde_json::{Value as JsonValue};

use aviary_models::database::DatabaseClient;

use crate::vocabulary::*;

use super::{
    accept::handle_accept,
    announce::handle_announce,
    block::handle_block,
    create::handle_create,
    delete::handle_delete,
    flag::handle_flag,
    follow::handle_follow,
    like::handle_like,
    reject::handle_reject,
    undo::handle_undo,
    update::handle_update,
    HandlerContext,
    HandlerResult,
};

pub async fn handle_activity(
    context: &mut HandlerContext<'_>,
    db_client: &impl DatabaseClient,
    activity: &JsonValue,
    actor_uri: &str,
    recipient: Option<&str>,
) -> HandlerResult {
    let activity_type = activity["type"].as_str().unwrap_or_default();
    let activity = activity.clone();
    match activity_type {
        ACCEPT => {
            handle_accept(context, db_client, activity).await
        },
        ANNOUNCE => {
            handle_announce(context, db_client, activity, actor_uri).await
        },
        BLOCK => {
            handle_block(context, db_client, activity, actor_uri).await
        },
        CREATE => {
            handle_create(context, db_client, activity, actor_uri).await
        },
        DELETE => {
            handle_delete(context, db_client, activity, actor_uri).await
        },
        FLAG => {
            handle_flag(context, db_client, activity, actor_uri).await
        },
        FOLLOW => {
            handle_follow(context, db_client, activity, actor_uri, recipient).await
        },
        LIKE | DISLIKE | EMOJI_REACT => {
            handle_like(context, db_client, activity, actor_uri).await
        },
        REJECT => {
            handle_reject(context, db_client, activity).await
        },
        UNDO => {
            handle_undo(context, db_client, activity, actor_uri).await
        },
        UPDATE => {
            handle_update(context, db_client, activity, actor_uri).await
        },
        other_type => {
            log::warn!("activity type is not supported: {}", other_type);
            Ok(None)
        },
    }
}
