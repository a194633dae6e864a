use serde::Serialize;

use crate::{
    contexts::{build_default_context, Context},
    identifiers::local_activity_id,
    vocabulary::FOLLOW,
};

#[derive(Serialize)]
pub struct Follow {
    #[serde(rename = "@context")]
    pub context: Context,

    #[serde(rename = "type")]
    pub activity_type: String,

    pub id: String,
    pub actor: String,
    pub object: String,

    pub to: Vec<String>,
}

pub fn build_follow(
    instance_url: &str,
    actor_id: &str,
    target_actor_id: &str,
) -> Follow {
    Follow {
        context: build_default_context(),
        activity_type: FOLLOW.to_string(),
        id: local_activity_id(instance_url),
        actor: actor_id.to_string(),
        object: target_actor_id.to_string(),
        to: vec![target_actor_id.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_follow() {
        let activity = build_follow(
            "https://social.example",
            "https://social.example/actor",
            "https://relay.example/actor",
        );
        assert_eq!(activity.activity_type, "Follow");
        assert_eq!(activity.id.starts_with("https://social.example/activities/"), true);
        assert_eq!(activity.object, "https://relay.example/actor");
        assert_eq!(activity.to, vec!["https://relay.example/actor"]);
    }
}
