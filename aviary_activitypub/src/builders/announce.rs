use serde::Serialize;

use aviary_fetch::constants::AP_PUBLIC;

use crate::{
    contexts::{build_default_context, Context},
    identifiers::{local_activity_id, local_actor_followers},
    vocabulary::ANNOUNCE,
};

#[derive(Serialize)]
pub struct Announce {
    #[serde(rename = "@context")]
    pub context: Context,

    #[serde(rename = "type")]
    pub activity_type: String,

    pub id: String,
    pub actor: String,
    pub object: String,

    pub to: Vec<String>,
    pub cc: Vec<String>,
}

pub fn build_announce(
    instance_url: &str,
    actor_id: &str,
    object_id: &str,
) -> Announce {
    Announce {
        context: build_default_context(),
        activity_type: ANNOUNCE.to_string(),
        id: local_activity_id(instance_url),
        actor: actor_id.to_string(),
        object: object_id.to_string(),
        to: vec![AP_PUBLIC.to_string()],
        cc: vec![local_actor_followers(actor_id)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_announce() {
        let activity = build_announce(
            "https://social.example",
            "https://social.example/actor",
            "https://social.example/users/bob/statuses/1",
        );
        assert_eq!(activity.activity_type, "Announce");
        assert_eq!(activity.object, "https://social.example/users/bob/statuses/1");
        assert_eq!(activity.to, vec![AP_PUBLIC]);
    }
}
