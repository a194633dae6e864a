//! Fetching and storing remote actors and objects
use chrono::{Duration, Utc};
use serde_json::{json, Value as JsonValue};

use aviary_core::urls::get_hostname;
use aviary_fetch::{
    agent::FederationAgent,
    constants::AP_PUBLIC,
    fetch::{fetch_object, FetchObjectOptions, ObjectCache},
};
use aviary_models::{
    actors::queries::{create_or_update_actor, get_actor_by_uri},
    actors::types::{ActorData, ActorType, DbActor},
    database::{DatabaseClient, DatabaseError},
    messages::queries::{
        change_message_counter,
        create_message,
        get_message_by_activitypub_id,
        MessageCounter,
    },
    messages::types::{DbMessage, MessageData, Visibility},
    notifications::types::NotificationType,
    signing_keys::queries::upsert_signing_key,
};
use aviary_validators::activitypub::is_content_type;

use super::{
    content::html_to_text,
    deserialization::{object_to_id, parse_string_array},
    errors::HandlerError,
    handlers::HandlerContext,
    identifiers::local_actor_key_id,
    side_effects::SideEffect,
};

// Cached actors are refreshed when older than this
const ACTOR_REFRESH_INTERVAL: i64 = 86_400; // 1 day

fn invalid(reason: &str) -> HandlerError {
    HandlerError::ValidationError(reason.to_string())
}

/// Extracts the field set stored for a remote actor
pub fn parse_actor_document(
    actor_json: &JsonValue,
) -> Result<ActorData, HandlerError> {
    let actor_id = actor_json["id"].as_str()
        .ok_or(invalid("actor document without ID"))?;
    let domain = get_hostname(actor_id)
        .map_err(|_| invalid("invalid actor ID"))?;
    let actor_type = actor_json["type"].as_str()
        .and_then(ActorType::from_keyword)
        .ok_or(invalid("unexpected actor type"))?;
    let username = actor_json["preferredUsername"].as_str()
        .ok_or(invalid("actor document without preferredUsername"))?;
    let inbox_url = actor_json["inbox"].as_str()
        .ok_or(invalid("actor document without inbox"))?;
    let shared_inbox_url = actor_json["endpoints"]["sharedInbox"].as_str();
    let public_key_pem = actor_json["publicKey"]["publicKeyPem"].as_str();
    let metadata = json!({
        "endpoints": actor_json["endpoints"].clone(),
        "url": actor_json["url"].clone(),
        "name": actor_json["name"].clone(),
    });
    Ok(ActorData {
        uri: actor_id.to_string(),
        username: username.to_string(),
        domain,
        actor_type,
        inbox_url: inbox_url.to_string(),
        shared_inbox_url: shared_inbox_url.map(|value| value.to_string()),
        outbox_url: actor_json["outbox"].as_str().map(|value| value.to_string()),
        followers_url: actor_json["followers"].as_str().map(|value| value.to_string()),
        public_key_pem: public_key_pem.map(|value| value.to_string()),
        manually_approves_followers:
            actor_json["manuallyApprovesFollowers"].as_bool().unwrap_or(false),
        is_local: false,
        metadata,
    })
}

pub async fn import_actor(
    db_client: &impl DatabaseClient,
    actor_json: &JsonValue,
) -> Result<DbActor, HandlerError> {
    let actor_data = parse_actor_document(actor_json)?;
    let maybe_public_key_pem = actor_data.public_key_pem.clone();
    let actor = create_or_update_actor(db_client, actor_data).await?;
    // Keep the signing key cache in step with the actor document
    if let Some(public_key_pem) = maybe_public_key_pem {
        let key_id = actor_json["publicKey"]["id"].as_str()
            .map(|value| value.to_string())
            .unwrap_or(local_actor_key_id(&actor.uri));
        upsert_signing_key(
            db_client,
            &key_id,
            None,
            &public_key_pem,
            None,
        ).await?;
    };
    Ok(actor)
}

/// Returns a cached actor, fetching the document when unknown or stale
pub async fn get_or_fetch_actor_by_uri(
    db_client: &impl DatabaseClient,
    agent: &FederationAgent,
    cache: &ObjectCache,
    actor_uri: &str,
) -> Result<DbActor, HandlerError> {
    match get_actor_by_uri(db_client, actor_uri).await {
        Ok(actor) if actor.is_local => return Ok(actor),
        Ok(actor) => {
            let is_stale = actor.last_fetched_at
                .map(|fetched_at| {
                    Utc::now() - fetched_at >
                        Duration::seconds(ACTOR_REFRESH_INTERVAL)
                })
                .unwrap_or(true);
            if !is_stale {
                return Ok(actor);
            };
        },
        Err(DatabaseError::NotFound(_)) => (),
        Err(other_error) => return Err(other_error.into()),
    };
    let actor_json = fetch_object(
        agent,
        cache,
        actor_uri,
        FetchObjectOptions::default(),
    ).await?;
    if actor_json["id"].as_str() != Some(actor_uri) {
        return Err(invalid("actor ID does not match requested URI"));
    };
    import_actor(db_client, &actor_json).await
}

/// Derives message visibility from the audience of an object
pub fn derive_visibility(
    to: &[String],
    cc: &[String],
    author_followers: Option<&str>,
) -> Visibility {
    if to.iter().any(|item| item == AP_PUBLIC) {
        return Visibility::Public;
    };
    if cc.iter().any(|item| item == AP_PUBLIC) {
        return Visibility::Unlisted;
    };
    if let Some(followers) = author_followers {
        if to.iter().any(|item| item == followers) {
            return Visibility::Followers;
        };
    };
    Visibility::Direct
}

fn parse_attachments(object: &JsonValue) -> JsonValue {
    let Some(items) = object["attachment"].as_array() else {
        return json!([]);
    };
    let attachments: Vec<JsonValue> = items.iter()
        .filter_map(|item| {
            let url = match &item["url"] {
                JsonValue::String(url) => url.to_string(),
                JsonValue::Array(_) => {
                    object_to_id(&item["url"][0]).ok()?
                },
                _ => return None,
            };
            Some(json!({
                "url": url,
                "media_type": item["mediaType"].as_str(),
                "description": item["name"].as_str(),
            }))
        })
        .collect();
    json!(attachments)
}

/// Stores a remote content object as a local federated message.
/// Replays surface as `AlreadyExists` on the `activitypub_id` column.
pub async fn import_message(
    context: &mut HandlerContext<'_>,
    db_client: &impl DatabaseClient,
    object: &JsonValue,
    author: &DbActor,
) -> Result<DbMessage, HandlerError> {
    let object_id = object["id"].as_str()
        .ok_or(invalid("object without ID"))?;
    let object_type = object["type"].as_str()
        .ok_or(invalid("object without type"))?;
    if !is_content_type(object_type) {
        return Err(invalid("not a content object"));
    };
    let to = parse_string_array(&object["to"]);
    let cc = parse_string_array(&object["cc"]);
    let visibility = derive_visibility(
        &to,
        &cc,
        author.followers_url.as_deref(),
    );
    let content = object["content"].as_str()
        .map(html_to_text)
        .unwrap_or_default();
    // Replies are resolved against already-known messages only;
    // missing parents are filled in by the replies ingester
    let reply_to = match object["inReplyTo"].as_str() {
        Some(parent_object_id) => {
            match get_message_by_activitypub_id(db_client, parent_object_id).await {
                Ok(parent) => Some(parent),
                Err(DatabaseError::NotFound(_)) => None,
                Err(other_error) => return Err(other_error.into()),
            }
        },
        None => None,
    };
    let community_actor_uri = object["audience"].as_str()
        .map(|value| value.to_string());
    let message_data = MessageData {
        author_actor_id: author.id,
        content,
        visibility,
        activitypub_id: Some(object_id.to_string()),
        reply_to_id: reply_to.as_ref().map(|parent| parent.id),
        sensitive: object["sensitive"].as_bool().unwrap_or(false),
        content_warning: object["summary"].as_str()
            .filter(|value| !value.is_empty())
            .map(|value| value.to_string()),
        title: object["name"].as_str().map(|value| value.to_string()),
        media: parse_attachments(object),
        community_actor_uri,
    };
    let message = create_message(db_client, message_data).await?;
    if let Some(parent) = reply_to {
        change_message_counter(
            db_client,
            parent.id,
            MessageCounter::Reply,
            1,
        ).await?;
        context.push_effect(SideEffect::Notify {
            recipient_actor_id: parent.author_actor_id,
            notification_type: NotificationType::Reply,
            sender_actor_id: Some(author.id),
            message_id: Some(message.id),
        });
    };
    if message.visibility == Visibility::Public {
        context.push_effect(SideEffect::TimelineBroadcast {
            message_id: message.id,
        });
    };
    Ok(message)
}

/// Finds a message by object URI, fetching and storing it when unknown
pub async fn get_or_import_message_by_object_id(
    context: &mut HandlerContext<'_>,
    db_client: &impl DatabaseClient,
    object_id: &str,
) -> Result<DbMessage, HandlerError> {
    match get_message_by_activitypub_id(db_client, object_id).await {
        Ok(message) => return Ok(message),
        Err(DatabaseError::NotFound(_)) => (),
        Err(other_error) => return Err(other_error.into()),
    };
    let agent = context.agent();
    let object = fetch_object(
        &agent,
        context.object_cache(),
        object_id,
        FetchObjectOptions::default(),
    ).await?;
    let author_uri = object_to_id(&object["attributedTo"])
        .map_err(|_| invalid("object without attributedTo"))?;
    let author = get_or_fetch_actor_by_uri(
        db_client,
        &agent,
        context.object_cache(),
        &author_uri,
    ).await?;
    import_message(context, db_client, &object, &author).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    #[test]
    fn test_parse_actor_document() {
        let actor_json = json!({
            "id": "https://remote.example/users/alice",
            "type": "Person",
            "preferredUsername": "alice",
            "inbox": "https://remote.example/users/alice/inbox",
            "outbox": "https://remote.example/users/alice/outbox",
            "followers": "https://remote.example/users/alice/followers",
            "endpoints": {"sharedInbox": "https://remote.example/inbox"},
            "manuallyApprovesFollowers": true,
            "publicKey": {
                "id": "https://remote.example/users/alice#main-key",
                "publicKeyPem": "-----BEGIN PUBLIC KEY-----\n...",
            },
        });
        let actor_data = parse_actor_document(&actor_json).unwrap();
        assert_eq!(actor_data.username, "alice");
        assert_eq!(actor_data.domain, "remote.example");
        assert_eq!(actor_data.actor_type, ActorType::Person);
        assert_eq!(
            actor_data.shared_inbox_url.as_deref(),
            Some("https://remote.example/inbox"),
        );
        assert_eq!(actor_data.manually_approves_followers, true);
        assert_eq!(actor_data.is_local, false);
    }

    #[test]
    fn test_parse_actor_document_rejects_unknown_type() {
        let actor_json = json!({
            "id": "https://remote.example/objects/1",
            "type": "Note",
            "preferredUsername": "alice",
            "inbox": "https://remote.example/inbox",
        });
        let result = parse_actor_document(&actor_json);
        assert_eq!(result.is_err(), true);
    }

    #[test]
    fn test_derive_visibility() {
        let public = AP_PUBLIC.to_string();
        let followers = "https://remote.example/users/alice/followers";

        let visibility = derive_visibility(&[public.clone()], &[], None);
        assert_eq!(visibility, Visibility::Public);

        let visibility = derive_visibility(&[], &[public], None);
        assert_eq!(visibility, Visibility::Unlisted);

        let visibility = derive_visibility(
            &[followers.to_string()],
            &[],
            Some(followers),
        );
        assert_eq!(visibility, Visibility::Followers);

        let visibility = derive_visibility(
            &["https://social.example/users/bob".to_string()],
            &[],
            Some(followers),
        );
        assert_eq!(visibility, Visibility::Direct);
    }

    #[test]
    fn test_parse_attachments() {
        let object = json!({
            "attachment": [
                {
                    "type": "Document",
                    "url": "https://remote.example/media/1.png",
                    "mediaType": "image/png",
                    "name": "a red square",
                },
                {"type": "Document"},
            ],
        });
        let attachments = parse_attachments(&object);
        let items = attachments.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["url"], "https://remote.example/media/1.png");
        assert_eq!(items[0]["description"], "a red square");
    }
}
