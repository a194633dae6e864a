use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use aviary_models::{
    actors::queries::{get_actor_by_uri, set_actor_metadata},
    database::DatabaseClient,
};
use aviary_validators::errors::ValidationError;

use crate::deserialization::deserialize_into_object_id;
use crate::importers::get_or_fetch_actor_by_uri;

use super::{HandlerContext, HandlerResult};

#[derive(Deserialize)]
struct Block {
    #[serde(deserialize_with = "deserialize_into_object_id")]
    actor: String,
    #[serde(deserialize_with = "deserialize_into_object_id")]
    object: String,
}

/// Records a remote user block against a local actor
pub async fn handle_block(
    context: &mut HandlerContext<'_>,
    db_client: &impl DatabaseClient,
    activity: JsonValue,
    actor_uri: &str,
) -> HandlerResult {
    let activity: Block = serde_json::from_value(activity)?;
    if activity.actor != actor_uri {
        return Err(ValidationError("actor mismatch").into());
    };
    let target = get_actor_by_uri(db_client, &activity.object).await?;
    if !target.is_local {
        return Err(ValidationError("block target is not local").into());
    };
    let agent = context.agent();
    let source = get_or_fetch_actor_by_uri(
        db_client,
        &agent,
        context.object_cache(),
        &activity.actor,
    ).await?;
    let mut blocked_by = source.metadata["blocks"].as_array()
        .cloned()
        .unwrap_or_default();
    let target_uri = json!(target.uri);
    if !blocked_by.contains(&target_uri) {
        blocked_by.push(target_uri);
    };
    let mut metadata = source.metadata.clone();
    metadata["blocks"] = json!(blocked_by);
    set_actor_metadata(db_client, source.id, &metadata).await?;
    Ok(Some("Actor"))
}

pub(super) async fn remove_block(
    db_client: &impl DatabaseClient,
    source_actor_uri: &str,
    target_actor_uri: &str,
) -> Result<(), crate::errors::HandlerError> {
    let source = get_actor_by_uri(db_client, source_actor_uri).await?;
    let mut metadata = source.metadata.clone();
    let blocked = metadata["blocks"].as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter(|item| item.as_str() != Some(target_actor_uri))
        .collect::<Vec<_>>();
    metadata["blocks"] = json!(blocked);
    set_actor_metadata(db_client, source.id, &metadata).await?;
    Ok(())
}
