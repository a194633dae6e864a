//! Actor documents served to other instances
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use aviary_models::actors::types::{ActorType, DbActor};

use crate::{
    contexts::{build_community_context, build_default_context, Context},
    identifiers::{
        local_actor_followers,
        local_actor_inbox,
        local_actor_key_id,
        local_actor_outbox,
        local_shared_inbox,
    },
    vocabulary::{APPLICATION, GROUP},
};

#[derive(Serialize)]
pub struct PublicKey {
    pub id: String,
    pub owner: String,

    #[serde(rename = "publicKeyPem")]
    pub public_key_pem: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorDocument {
    #[serde(rename = "@context")]
    pub context: Context,

    pub id: String,

    #[serde(rename = "type")]
    pub actor_type: String,

    pub preferred_username: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub inbox: String,
    pub outbox: String,
    pub followers: String,

    pub manually_approves_followers: bool,

    pub public_key: PublicKey,

    pub endpoints: JsonValue,
}

/// Builds the JSON-LD document for a local actor.
/// Group actors carry the Lemmy community vocabulary.
pub fn build_actor_document(
    instance_url: &str,
    actor_id: &str,
    actor: &DbActor,
    public_key_pem: &str,
) -> ActorDocument {
    let context = if actor.actor_type == ActorType::Group {
        build_community_context()
    } else {
        build_default_context()
    };
    let actor_name = actor.metadata["name"].as_str()
        .map(|value| value.to_string());
    ActorDocument {
        context,
        id: actor_id.to_string(),
        actor_type: actor.actor_type.keyword().to_string(),
        preferred_username: actor.username.clone(),
        name: actor_name,
        inbox: local_actor_inbox(actor_id),
        outbox: local_actor_outbox(actor_id),
        followers: local_actor_followers(actor_id),
        manually_approves_followers: actor.manually_approves_followers,
        public_key: PublicKey {
            id: local_actor_key_id(actor_id),
            owner: actor_id.to_string(),
            public_key_pem: public_key_pem.to_string(),
        },
        endpoints: json!({
            "sharedInbox": local_shared_inbox(instance_url),
        }),
    }
}

/// Builds the instance-level Application actor used for signed
/// fetches and relay operations
pub fn build_instance_actor_document(
    instance_url: &str,
    actor_id: &str,
    hostname: &str,
    public_key_pem: &str,
) -> ActorDocument {
    ActorDocument {
        context: build_default_context(),
        id: actor_id.to_string(),
        actor_type: APPLICATION.to_string(),
        preferred_username: hostname.to_string(),
        name: None,
        inbox: local_actor_inbox(actor_id),
        outbox: local_actor_outbox(actor_id),
        followers: local_actor_followers(actor_id),
        manually_approves_followers: true,
        public_key: PublicKey {
            id: local_actor_key_id(actor_id),
            owner: actor_id.to_string(),
            public_key_pem: public_key_pem.to_string(),
        },
        endpoints: json!({
            "sharedInbox": local_shared_inbox(instance_url),
        }),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;
    use super::*;

    fn local_actor(actor_type: ActorType) -> DbActor {
        DbActor {
            id: Uuid::new_v4(),
            uri: "https://social.example/users/bob".to_string(),
            username: "bob".to_string(),
            domain: "social.example".to_string(),
            actor_type,
            inbox_url: "https://social.example/users/bob/inbox".to_string(),
            shared_inbox_url: None,
            outbox_url: None,
            followers_url: None,
            public_key_pem: None,
            manually_approves_followers: false,
            is_local: true,
            last_fetched_at: None,
            metadata: json!({}),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_build_actor_document() {
        let actor = local_actor(ActorType::Person);
        let document = build_actor_document(
            "https://social.example",
            "https://social.example/users/bob",
            &actor,
            "-----BEGIN PUBLIC KEY-----\n...",
        );
        assert_eq!(document.actor_type, "Person");
        assert_eq!(document.preferred_username, "bob");
        assert_eq!(
            document.inbox,
            "https://social.example/users/bob/inbox",
        );
        assert_eq!(
            document.public_key.id,
            "https://social.example/users/bob#main-key",
        );
        assert_eq!(
            document.endpoints["sharedInbox"],
            "https://social.example/inbox",
        );
    }

    #[test]
    fn test_build_actor_document_group_context() {
        let actor = local_actor(ActorType::Group);
        let document = build_actor_document(
            "https://social.example",
            "https://social.example/c/rust",
            &actor,
            "-----BEGIN PUBLIC KEY-----\n...",
        );
        assert_eq!(document.actor_type, GROUP);
        let context_items = document.context.as_array().unwrap();
        assert_eq!(context_items.len(), 3);
    }
}
