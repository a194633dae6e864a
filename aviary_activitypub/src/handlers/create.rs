use serde_json::{Value as JsonValue};

use aviary_models::database::{DatabaseClient, DatabaseError};
use aviary_validators::activitypub::is_content_type;
use aviary_validators::errors::ValidationError;

use crate::{
    deserialization::object_to_id,
    importers::{get_or_fetch_actor_by_uri, import_message},
    queues::MaintenanceJobData,
};

use super::{HandlerContext, HandlerResult};

pub async fn handle_create(
    context: &mut HandlerContext<'_>,
    db_client: &impl DatabaseClient,
    activity: JsonValue,
    actor_uri: &str,
) -> HandlerResult {
    let object = &activity["object"];
    if !object.is_object() {
        return Err(ValidationError("Create without embedded object").into());
    };
    let object_type = object["type"].as_str()
        .ok_or(ValidationError("object without type"))?;
    if !is_content_type(object_type) {
        log::warn!("Create({}) is not supported", object_type);
        return Ok(None);
    };

    // The object author must match the activity actor
    let author_uri = object_to_id(&object["attributedTo"])
        .unwrap_or(actor_uri.to_string());
    if author_uri != actor_uri {
        return Err(ValidationError("object author mismatch").into());
    };

    let agent = context.agent();
    let author = get_or_fetch_actor_by_uri(
        db_client,
        &agent,
        context.object_cache(),
        &author_uri,
    ).await?;

    let message = match import_message(context, db_client, object, &author).await {
        Ok(message) => message,
        // Replayed Create; the first copy won
        Err(crate::errors::HandlerError::DatabaseError(
            DatabaseError::AlreadyExists(_),
        )) => return Ok(Some("AlreadyReceived")),
        Err(other_error) => return Err(other_error),
    };

    // Reply collections referenced by the object are ingested
    // in the background
    if let Some(replies_id) = object["replies"]["first"].as_str()
        .or(object["replies"].as_str())
    {
        let job_data = MaintenanceJobData::RepliesIngest {
            collection_id: replies_id.to_string(),
        };
        job_data.into_job(db_client).await?;
    };

    log::info!("created message {} from {}", message.id, author.uri);
    Ok(Some(object_type_static(object_type)))
}

fn object_type_static(object_type: &str) -> &'static str {
    match object_type {
        "Note" => "Note",
        "Article" => "Article",
        "Page" => "Page",
        "Question" => "Question",
        "Event" => "Event",
        "Audio" => "Audio",
        "Video" => "Video",
        "Image" => "Image",
        _ => "Object",
    }
}
