use serde::Serialize;

use crate::{
    contexts::{build_default_context, Context},
    identifiers::local_activity_id,
    vocabulary::ACCEPT,
};

#[derive(Serialize)]
pub struct AcceptFollow {
    #[serde(rename = "@context")]
    pub context: Context,

    #[serde(rename = "type")]
    pub activity_type: String,

    pub id: String,
    pub actor: String,
    pub object: String,

    pub to: Vec<String>,
}

pub fn build_accept_follow(
    instance_url: &str,
    actor_id: &str,
    source_actor_id: &str,
    follow_activity_id: &str,
) -> AcceptFollow {
    // Accept(Follow) is idempotent so its ID can be random
    AcceptFollow {
        context: build_default_context(),
        activity_type: ACCEPT.to_string(),
        id: local_activity_id(instance_url),
        actor: actor_id.to_string(),
        object: follow_activity_id.to_string(),
        to: vec![source_actor_id.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTANCE_URL: &str = "https://social.example";

    #[test]
    fn test_build_accept_follow() {
        let follow_activity_id = "https://remote.example/activities/999";
        let follower_id = "https://remote.example/users/alice";
        let activity = build_accept_follow(
            INSTANCE_URL,
            "https://social.example/users/bob",
            follower_id,
            follow_activity_id,
        );

        assert_eq!(activity.id.starts_with(INSTANCE_URL), true);
        assert_eq!(activity.activity_type, "Accept");
        assert_eq!(activity.object, follow_activity_id);
        assert_eq!(activity.to, vec![follower_id]);
    }
}
