//! Instance-record-driven policy (domain blocks and rewrites)
use serde_json::{json, Value as JsonValue};

use aviary_fetch::constants::AP_PUBLIC;
use aviary_models::instances::types::DbInstance;

use crate::deserialization::parse_string_array;
use crate::vocabulary::{DELETE, FLAG, UPDATE};

/// Effective policy flags for a hostname
/// (merged across exact and wildcard records)
#[derive(Default)]
pub struct InstancePolicies {
    pub blocked: bool,
    pub media_removal: bool,
    pub media_nsfw: bool,
    pub federated_timeline_removal: bool,
    pub followers_only: bool,
    pub report_removal: bool,
    pub avatar_removal: bool,
    pub banner_removal: bool,
    pub reject_deletes: bool,
}

impl InstancePolicies {
    pub fn merge<'a>(
        instances: impl Iterator<Item = &'a DbInstance>,
    ) -> Self {
        let mut policies = Self::default();
        for instance in instances {
            policies.blocked |= instance.blocked;
            policies.media_removal |= instance.media_removal;
            policies.media_nsfw |= instance.media_nsfw;
            policies.federated_timeline_removal |=
                instance.federated_timeline_removal;
            policies.followers_only |= instance.followers_only;
            policies.report_removal |= instance.report_removal;
            policies.avatar_removal |= instance.avatar_removal;
            policies.banner_removal |= instance.banner_removal;
            policies.reject_deletes |= instance.reject_deletes;
        };
        policies
    }
}

/// Removes attached media from the embedded object
pub(super) fn strip_media(mut activity: JsonValue) -> JsonValue {
    if let Some(object) = activity["object"].as_object_mut() {
        object.remove("attachment");
        object.remove("icon");
        object.remove("image");
    };
    activity
}

fn mark_sensitive(mut activity: JsonValue) -> JsonValue {
    if let Some(object) = activity["object"].as_object_mut() {
        object.insert("sensitive".to_string(), json!(true));
    };
    activity
}

/// Removes the Public address from `to`, demoting the post to unlisted
fn remove_from_federated_timeline(mut activity: JsonValue) -> JsonValue {
    let mut to = parse_string_array(&activity["to"]);
    let mut cc = parse_string_array(&activity["cc"]);
    if to.iter().any(|item| item == AP_PUBLIC) {
        to.retain(|item| item != AP_PUBLIC);
        if !cc.iter().any(|item| item == AP_PUBLIC) {
            cc.push(AP_PUBLIC.to_string());
        };
        activity["to"] = json!(to);
        activity["cc"] = json!(cc);
    };
    activity
}

/// Restricts the audience to the actor's followers
fn force_followers_only(mut activity: JsonValue) -> JsonValue {
    let Some(actor_id) = activity["actor"].as_str() else {
        return activity;
    };
    let followers = format!("{}/followers", actor_id.trim_end_matches('/'));
    activity["to"] = json!([followers]);
    activity["cc"] = json!([]);
    activity
}

fn is_actor_update(activity: &JsonValue) -> bool {
    activity["type"].as_str() == Some(UPDATE) &&
        matches!(
            activity["object"]["type"].as_str(),
            Some("Person") | Some("Group") | Some("Service") |
            Some("Application") | Some("Organization"),
        )
}

fn strip_actor_images(
    mut activity: JsonValue,
    avatar: bool,
    banner: bool,
) -> JsonValue {
    if let Some(object) = activity["object"].as_object_mut() {
        if avatar {
            object.remove("icon");
        };
        if banner {
            object.remove("image");
        };
    };
    activity
}

pub(super) fn apply(
    policies: &InstancePolicies,
    activity: JsonValue,
) -> Result<JsonValue, String> {
    let activity_type = activity["type"].as_str().unwrap_or_default();
    if policies.blocked {
        // Deletes from blocked instances are still processed,
        // so local copies don't outlive their originals
        if activity_type != DELETE || policies.reject_deletes {
            return Err("blocked domain".to_string());
        };
    };
    if policies.report_removal && activity_type == FLAG {
        return Err("reports are not accepted".to_string());
    };
    let mut activity = activity;
    if policies.media_removal {
        activity = strip_media(activity);
    };
    if policies.media_nsfw {
        activity = mark_sensitive(activity);
    };
    if policies.federated_timeline_removal {
        activity = remove_from_federated_timeline(activity);
    };
    if policies.followers_only {
        activity = force_followers_only(activity);
    };
    if is_actor_update(&activity) &&
        (policies.avatar_removal || policies.banner_removal)
    {
        activity = strip_actor_images(
            activity,
            policies.avatar_removal,
            policies.banner_removal,
        );
    };
    Ok(activity)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    fn policies() -> InstancePolicies {
        InstancePolicies::default()
    }

    #[test]
    fn test_blocked_rejects_create() {
        let activity = json!({
            "type": "Create",
            "actor": "https://bad.example/users/evil",
            "object": {"type": "Note", "content": "hello"},
        });
        let blocked = InstancePolicies { blocked: true, ..policies() };
        let result = apply(&blocked, activity);
        assert_eq!(result.unwrap_err(), "blocked domain");
    }

    #[test]
    fn test_blocked_passes_delete() {
        let activity = json!({
            "type": "Delete",
            "actor": "https://bad.example/users/evil",
            "object": "https://bad.example/objects/1",
        });
        let blocked = InstancePolicies { blocked: true, ..policies() };
        let result = apply(&blocked, activity.clone());
        assert_eq!(result.is_ok(), true);

        let blocked = InstancePolicies {
            blocked: true,
            reject_deletes: true,
            ..policies()
        };
        let result = apply(&blocked, activity);
        assert_eq!(result.is_err(), true);
    }

    #[test]
    fn test_media_removal() {
        let activity = json!({
            "type": "Create",
            "object": {
                "type": "Note",
                "content": "hello",
                "attachment": [{"type": "Document"}],
            },
        });
        let media_removal = InstancePolicies {
            media_removal: true,
            ..policies()
        };
        let activity = apply(&media_removal, activity).unwrap();
        assert_eq!(activity["object"]["attachment"].is_null(), true);
        assert_eq!(activity["object"]["content"], "hello");
    }

    #[test]
    fn test_media_nsfw() {
        let activity = json!({
            "type": "Create",
            "object": {"type": "Note", "content": "hello"},
        });
        let nsfw = InstancePolicies { media_nsfw: true, ..policies() };
        let activity = apply(&nsfw, activity).unwrap();
        assert_eq!(activity["object"]["sensitive"], json!(true));
    }

    #[test]
    fn test_federated_timeline_removal() {
        let public = "https://www.w3.org/ns/activitystreams#Public";
        let activity = json!({
            "type": "Create",
            "to": [public],
            "cc": ["https://remote.example/users/alice/followers"],
            "object": {"type": "Note", "content": "hello"},
        });
        let ftl_removal = InstancePolicies {
            federated_timeline_removal: true,
            ..policies()
        };
        let activity = apply(&ftl_removal, activity).unwrap();
        let to = activity["to"].as_array().unwrap();
        assert_eq!(to.iter().any(|item| item == public), false);
        let cc = activity["cc"].as_array().unwrap();
        assert_eq!(cc.iter().any(|item| item == public), true);
    }

    #[test]
    fn test_followers_only() {
        let activity = json!({
            "type": "Create",
            "actor": "https://remote.example/users/alice",
            "to": ["https://www.w3.org/ns/activitystreams#Public"],
            "object": {"type": "Note", "content": "hello"},
        });
        let followers_only = InstancePolicies {
            followers_only: true,
            ..policies()
        };
        let activity = apply(&followers_only, activity).unwrap();
        assert_eq!(
            activity["to"],
            json!(["https://remote.example/users/alice/followers"]),
        );
    }

    #[test]
    fn test_report_removal() {
        let activity = json!({
            "type": "Flag",
            "actor": "https://remote.example/users/alice",
            "object": "https://social.example/users/bob",
        });
        let report_removal = InstancePolicies {
            report_removal: true,
            ..policies()
        };
        let result = apply(&report_removal, activity);
        assert_eq!(result.is_err(), true);
    }

    #[test]
    fn test_avatar_removal_on_actor_update() {
        let activity = json!({
            "type": "Update",
            "actor": "https://remote.example/users/alice",
            "object": {
                "type": "Person",
                "id": "https://remote.example/users/alice",
                "icon": {"type": "Image", "url": "https://remote.example/a.png"},
                "image": {"type": "Image", "url": "https://remote.example/b.png"},
            },
        });
        let avatar_removal = InstancePolicies {
            avatar_removal: true,
            ..policies()
        };
        let activity = apply(&avatar_removal, activity).unwrap();
        assert_eq!(activity["object"]["icon"].is_null(), true);
        assert_eq!(activity["object"]["image"].is_null(), false);
    }
}
