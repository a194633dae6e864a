use serde::Serialize;

use aviary_fetch::constants::AP_PUBLIC;

use crate::{
    contexts::{build_default_context, Context},
    identifiers::local_activity_id,
    vocabulary::{DELETE, TOMBSTONE},
};

#[derive(Serialize)]
pub struct Tombstone {
    pub id: String,

    #[serde(rename = "type")]
    pub object_type: String,
}

#[derive(Serialize)]
pub struct DeleteNote {
    #[serde(rename = "@context")]
    pub context: Context,

    #[serde(rename = "type")]
    pub activity_type: String,

    pub id: String,
    pub actor: String,
    pub object: Tombstone,

    pub to: Vec<String>,
}

pub fn build_delete_note(
    instance_url: &str,
    actor_id: &str,
    object_id: &str,
) -> DeleteNote {
    DeleteNote {
        context: build_default_context(),
        activity_type: DELETE.to_string(),
        id: local_activity_id(instance_url),
        actor: actor_id.to_string(),
        object: Tombstone {
            id: object_id.to_string(),
            object_type: TOMBSTONE.to_string(),
        },
        to: vec![AP_PUBLIC.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_delete_note() {
        let activity = build_delete_note(
            "https://social.example",
            "https://social.example/users/bob",
            "https://social.example/users/bob/statuses/1",
        );
        assert_eq!(activity.activity_type, "Delete");
        assert_eq!(activity.object.object_type, "Tombstone");
        assert_eq!(
            activity.object.id,
            "https://social.example/users/bob/statuses/1",
        );
    }
}
