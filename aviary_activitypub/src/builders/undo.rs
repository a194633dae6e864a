use serde::Serialize;
use serde_json::{Value as JsonValue};

use crate::{
    contexts::{build_default_context, Context},
    identifiers::local_activity_id,
    vocabulary::UNDO,
};

#[derive(Serialize)]
pub struct Undo {
    #[serde(rename = "@context")]
    pub context: Context,

    #[serde(rename = "type")]
    pub activity_type: String,

    pub id: String,
    pub actor: String,

    /// The undone activity, embedded or by ID
    pub object: JsonValue,

    pub to: Vec<String>,
}

pub fn build_undo(
    instance_url: &str,
    actor_id: &str,
    object: JsonValue,
    to: Vec<String>,
) -> Undo {
    Undo {
        context: build_default_context(),
        activity_type: UNDO.to_string(),
        id: local_activity_id(instance_url),
        actor: actor_id.to_string(),
        object,
        to,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    #[test]
    fn test_build_undo() {
        let activity = build_undo(
            "https://social.example",
            "https://social.example/actor",
            json!({
                "id": "https://social.example/activities/1",
                "type": "Follow",
                "actor": "https://social.example/actor",
                "object": "https://relay.example/actor",
            }),
            vec!["https://relay.example/actor".to_string()],
        );
        assert_eq!(activity.activity_type, "Undo");
        assert_eq!(activity.object["type"], "Follow");
    }
}
