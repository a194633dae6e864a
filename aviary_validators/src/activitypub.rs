//! Structural validation of incoming activities
use serde_json::{Value as JsonValue};

use aviary_core::urls::{get_hostname, is_http_url};

use super::errors::ValidationError;

const OBJECT_ID_SIZE_MAX: usize = 2000;

const ACTOR_TYPES: [&str; 5] = [
    "Person",
    "Group",
    "Service",
    "Application",
    "Organization",
];

const CONTENT_TYPES: [&str; 8] = [
    "Note",
    "Article",
    "Page",
    "Question",
    "Event",
    "Audio",
    "Video",
    "Image",
];

pub fn validate_object_id(object_id: &str) -> Result<(), ValidationError> {
    if object_id.is_empty() {
        return Err(ValidationError("object ID is empty"));
    };
    if object_id.len() > OBJECT_ID_SIZE_MAX {
        return Err(ValidationError("object ID is too long"));
    };
    if !is_http_url(object_id) {
        return Err(ValidationError("invalid object ID"));
    };
    Ok(())
}

fn is_actor_object(activity: &JsonValue) -> bool {
    activity["type"].as_str()
        .is_some_and(|value| ACTOR_TYPES.contains(&value))
}

pub fn is_content_type(object_type: &str) -> bool {
    CONTENT_TYPES.contains(&object_type)
}

fn validate_actor(activity: &JsonValue) -> Result<(), ValidationError> {
    if let Some(actor_id) = activity["actor"].as_str() {
        return validate_object_id(actor_id)
            .map_err(|_| ValidationError("invalid 'actor' property"));
    };
    // The activity may itself be an actor document (e.g. an Update payload)
    if is_actor_object(activity) {
        let actor_id = activity["id"].as_str()
            .ok_or(ValidationError("actor object without ID"))?;
        validate_object_id(actor_id)?;
        let inbox = activity["inbox"].as_str()
            .ok_or(ValidationError("actor object without inbox"))?;
        validate_object_id(inbox)
            .map_err(|_| ValidationError("invalid actor inbox"))?;
        return Ok(());
    };
    Err(ValidationError("'actor' property is missing"))
}

fn is_object_reference(value: &JsonValue) -> bool {
    match value {
        JsonValue::String(object_id) => validate_object_id(object_id).is_ok(),
        JsonValue::Object(_) => true,
        _ => false,
    }
}

fn validate_object_property(
    activity: &JsonValue,
    activity_type: &str,
) -> Result<(), ValidationError> {
    let object = &activity["object"];
    match activity_type {
        "Create" | "Update" | "Delete" |
        "Like" | "Dislike" | "EmojiReact" |
        "Announce" | "Undo" |
        "Follow" | "Accept" | "Reject" => {
            if !is_object_reference(object) {
                return Err(ValidationError("invalid 'object' property"));
            };
        },
        "Flag" => {
            let is_valid = match object {
                JsonValue::Array(items) => {
                    items.iter().all(is_object_reference)
                },
                _ => is_object_reference(object),
            };
            if !is_valid {
                return Err(ValidationError("invalid 'object' property"));
            };
        },
        "Block" => {
            // Block target must be a bare actor ID
            let object_id = object.as_str()
                .ok_or(ValidationError("invalid 'object' property"))?;
            validate_object_id(object_id)
                .map_err(|_| ValidationError("invalid 'object' property"))?;
        },
        _ => (),
    };
    Ok(())
}

fn validate_embedded_object(
    object: &JsonValue,
) -> Result<(), ValidationError> {
    let Some(object_type) = object["type"].as_str() else {
        return Ok(());
    };
    if !is_content_type(object_type) {
        return Ok(());
    };
    let has_content = object["content"].as_str().is_some() ||
        object["summary"].as_str().is_some() ||
        object["name"].as_str().is_some() ||
        object["attachment"].as_array()
            .is_some_and(|items| !items.is_empty());
    if !has_content {
        return Err(ValidationError("content object is empty"));
    };
    Ok(())
}

/// Validates the overall structure of an activity.
/// Rules are intentionally minimal: anything type-specific beyond
/// presence checks belongs to the handlers.
pub fn validate_activity(
    activity: &JsonValue,
) -> Result<(), ValidationError> {
    let activity_type = activity["type"].as_str()
        .filter(|value| !value.is_empty())
        .ok_or(ValidationError("'type' property is missing"))?;
    match activity["id"].as_str() {
        Some(activity_id) => validate_object_id(activity_id)?,
        // Delete activities from some servers arrive without an ID
        None if activity_type == "Delete" => (),
        None => return Err(ValidationError("'id' property is missing")),
    };
    validate_actor(activity)?;
    validate_object_property(activity, activity_type)?;
    if activity["object"].is_object() {
        validate_embedded_object(&activity["object"])?;
    };
    Ok(())
}

/// Checks that the actor URI belongs to the expected host.
/// Callers use it to tie the activity author to the verified
/// signature identity.
pub fn validate_actor_domain(
    actor_uri: &str,
    expected_hostname: &str,
) -> Result<(), ValidationError> {
    let actor_hostname = get_hostname(actor_uri)
        .map_err(|_| ValidationError("invalid actor URI"))?;
    if actor_hostname != expected_hostname {
        return Err(ValidationError("actor hostname mismatch"));
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    #[test]
    fn test_validate_activity() {
        let activity = json!({
            "id": "https://remote.example/activities/1",
            "type": "Follow",
            "actor": "https://remote.example/users/alice",
            "object": "https://social.example/users/bob",
        });
        let result = validate_activity(&activity);
        assert_eq!(result.is_ok(), true);
    }

    #[test]
    fn test_validate_activity_missing_type() {
        let activity = json!({
            "id": "https://remote.example/activities/1",
            "actor": "https://remote.example/users/alice",
        });
        let result = validate_activity(&activity);
        assert_eq!(result.is_err(), true);
    }

    #[test]
    fn test_validate_activity_delete_without_id() {
        let activity = json!({
            "type": "Delete",
            "actor": "https://remote.example/users/alice",
            "object": "https://remote.example/objects/1",
        });
        let result = validate_activity(&activity);
        assert_eq!(result.is_ok(), true);
    }

    #[test]
    fn test_validate_activity_invalid_actor() {
        let activity = json!({
            "id": "https://remote.example/activities/1",
            "type": "Like",
            "actor": "not-a-url",
            "object": "https://social.example/objects/1",
        });
        let result = validate_activity(&activity);
        assert_eq!(result.is_err(), true);
    }

    #[test]
    fn test_validate_activity_actor_object() {
        // An actor document pushed via Update
        let activity = json!({
            "id": "https://remote.example/users/alice",
            "type": "Person",
            "inbox": "https://remote.example/users/alice/inbox",
        });
        let result = validate_activity(&activity);
        assert_eq!(result.is_ok(), true);
    }

    #[test]
    fn test_validate_activity_create_without_object() {
        let activity = json!({
            "id": "https://remote.example/activities/1",
            "type": "Create",
            "actor": "https://remote.example/users/alice",
        });
        let result = validate_activity(&activity);
        assert_eq!(result.is_err(), true);
    }

    #[test]
    fn test_validate_activity_block_requires_uri_object() {
        let activity = json!({
            "id": "https://remote.example/activities/1",
            "type": "Block",
            "actor": "https://remote.example/users/alice",
            "object": {"id": "https://social.example/users/bob"},
        });
        let result = validate_activity(&activity);
        assert_eq!(result.is_err(), true);
    }

    #[test]
    fn test_validate_activity_empty_note() {
        let activity = json!({
            "id": "https://remote.example/activities/1",
            "type": "Create",
            "actor": "https://remote.example/users/alice",
            "object": {
                "id": "https://remote.example/objects/1",
                "type": "Note",
            },
        });
        let result = validate_activity(&activity);
        assert_eq!(result.is_err(), true);
    }

    #[test]
    fn test_validate_activity_note_with_attachment_only() {
        let activity = json!({
            "id": "https://remote.example/activities/1",
            "type": "Create",
            "actor": "https://remote.example/users/alice",
            "object": {
                "id": "https://remote.example/objects/1",
                "type": "Note",
                "attachment": [{"type": "Document", "url": "https://remote.example/media/1.png"}],
            },
        });
        let result = validate_activity(&activity);
        assert_eq!(result.is_ok(), true);
    }

    #[test]
    fn test_validate_actor_domain() {
        let result = validate_actor_domain(
            "https://remote.example/users/alice",
            "remote.example",
        );
        assert_eq!(result.is_ok(), true);
        let result = validate_actor_domain(
            "https://remote.example/users/alice",
            "other.example",
        );
        assert_eq!(result.is_err(), true);
    }
}
