use serde::Serialize;

use crate::{
    contexts::{build_default_context, Context},
    identifiers::local_activity_id,
    vocabulary::{DISLIKE, EMOJI_REACT, LIKE},
};

#[derive(Serialize)]
pub struct Like {
    #[serde(rename = "@context")]
    pub context: Context,

    #[serde(rename = "type")]
    pub activity_type: String,

    pub id: String,
    pub actor: String,
    pub object: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    pub to: Vec<String>,
}

fn build_reaction(
    instance_url: &str,
    activity_type: &str,
    actor_id: &str,
    object_id: &str,
    object_owner_id: &str,
    content: Option<String>,
) -> Like {
    Like {
        context: build_default_context(),
        activity_type: activity_type.to_string(),
        id: local_activity_id(instance_url),
        actor: actor_id.to_string(),
        object: object_id.to_string(),
        content,
        to: vec![object_owner_id.to_string()],
    }
}

pub fn build_like(
    instance_url: &str,
    actor_id: &str,
    object_id: &str,
    object_owner_id: &str,
) -> Like {
    build_reaction(instance_url, LIKE, actor_id, object_id, object_owner_id, None)
}

pub fn build_dislike(
    instance_url: &str,
    actor_id: &str,
    object_id: &str,
    object_owner_id: &str,
) -> Like {
    build_reaction(instance_url, DISLIKE, actor_id, object_id, object_owner_id, None)
}

pub fn build_emoji_react(
    instance_url: &str,
    actor_id: &str,
    object_id: &str,
    object_owner_id: &str,
    emoji: &str,
) -> Like {
    build_reaction(
        instance_url,
        EMOJI_REACT,
        actor_id,
        object_id,
        object_owner_id,
        Some(emoji.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_emoji_react() {
        let activity = build_emoji_react(
            "https://social.example",
            "https://social.example/users/bob",
            "https://remote.example/objects/1",
            "https://remote.example/users/alice",
            "🦀",
        );
        assert_eq!(activity.activity_type, "EmojiReact");
        assert_eq!(activity.content.as_deref(), Some("🦀"));
        assert_eq!(activity.to, vec!["https://remote.example/users/alice"]);
    }
}
