//! Construction of local object identifiers
use uuid::Uuid;

pub fn local_actor_id(instance_url: &str, username: &str) -> String {
    format!("{}/users/{}", instance_url, username)
}

pub fn local_community_id(instance_url: &str, slug: &str) -> String {
    format!("{}/c/{}", instance_url, slug)
}

pub fn local_instance_actor_id(instance_url: &str) -> String {
    format!("{}/actor", instance_url)
}

pub fn local_actor_inbox(actor_id: &str) -> String {
    format!("{}/inbox", actor_id)
}

pub fn local_actor_outbox(actor_id: &str) -> String {
    format!("{}/outbox", actor_id)
}

pub fn local_actor_followers(actor_id: &str) -> String {
    format!("{}/followers", actor_id)
}

pub fn local_actor_key_id(actor_id: &str) -> String {
    format!("{}#main-key", actor_id)
}

pub fn local_shared_inbox(instance_url: &str) -> String {
    format!("{}/inbox", instance_url)
}

pub fn local_message_id(
    instance_url: &str,
    username: &str,
    message_id: Uuid,
) -> String {
    format!("{}/users/{}/statuses/{}", instance_url, username, message_id)
}

pub fn local_community_post_id(
    instance_url: &str,
    slug: &str,
    message_id: Uuid,
) -> String {
    format!("{}/c/{}/posts/{}", instance_url, slug, message_id)
}

/// Create activities are identified by their object
pub fn local_create_activity_id(object_id: &str) -> String {
    format!("{}/activity", object_id)
}

pub fn local_activity_id(instance_url: &str) -> String {
    format!("{}/activities/{}", instance_url, Uuid::new_v4())
}

pub fn parse_local_actor_id(
    instance_url: &str,
    actor_id: &str,
) -> Option<String> {
    let prefix = format!("{}/users/", instance_url);
    let username = actor_id.strip_prefix(&prefix)?;
    if username.is_empty() || username.contains('/') {
        return None;
    };
    Some(username.to_string())
}

pub fn parse_local_community_id(
    instance_url: &str,
    actor_id: &str,
) -> Option<String> {
    let prefix = format!("{}/c/", instance_url);
    let slug = actor_id.strip_prefix(&prefix)?;
    if slug.is_empty() || slug.contains('/') {
        return None;
    };
    Some(slug.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTANCE_URL: &str = "https://social.example";

    #[test]
    fn test_local_actor_id() {
        let actor_id = local_actor_id(INSTANCE_URL, "bob");
        assert_eq!(actor_id, "https://social.example/users/bob");
        assert_eq!(
            local_actor_key_id(&actor_id),
            "https://social.example/users/bob#main-key",
        );
        assert_eq!(
            local_actor_followers(&actor_id),
            "https://social.example/users/bob/followers",
        );
    }

    #[test]
    fn test_local_message_id() {
        let message_id = Uuid::new_v4();
        let object_id = local_message_id(INSTANCE_URL, "bob", message_id);
        assert_eq!(
            object_id,
            format!("https://social.example/users/bob/statuses/{}", message_id),
        );
        assert_eq!(
            local_create_activity_id(&object_id),
            format!("{}/activity", object_id),
        );
    }

    #[test]
    fn test_parse_local_actor_id() {
        let username = parse_local_actor_id(
            INSTANCE_URL,
            "https://social.example/users/bob",
        );
        assert_eq!(username.as_deref(), Some("bob"));
        let username = parse_local_actor_id(
            INSTANCE_URL,
            "https://other.example/users/bob",
        );
        assert_eq!(username, None);
        let username = parse_local_actor_id(
            INSTANCE_URL,
            "https://social.example/users/bob/statuses/1",
        );
        assert_eq!(username, None);
    }

    #[test]
    fn test_parse_local_community_id() {
        let slug = parse_local_community_id(
            INSTANCE_URL,
            "https://social.example/c/rust",
        );
        assert_eq!(slug.as_deref(), Some("rust"));
        let slug = parse_local_community_id(
            INSTANCE_URL,
            "https://social.example/users/bob",
        );
        assert_eq!(slug, None);
    }
}
