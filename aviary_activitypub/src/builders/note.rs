//! Note and Question documents for outgoing messages
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value as JsonValue};

use aviary_core::media_type::guess_media_type;
use aviary_fetch::constants::AP_PUBLIC;
use aviary_models::{
    database::{DatabaseClient, DatabaseError},
    messages::queries::get_message_by_id,
    messages::types::{DbMessage, Visibility},
};

use crate::{
    content::sanitize_html,
    contexts::{build_default_context, Context},
    identifiers::{local_actor_followers, local_actor_id, local_message_id},
    vocabulary::{AUDIO, DOCUMENT, IMAGE, NOTE, QUESTION, VIDEO},
};

use super::mentions::Mention;

// Community context is inherited through reply chains,
// bounded against malformed graphs
const REPLY_CHAIN_DEPTH_MAX: u32 = 10;

#[derive(Serialize)]
pub struct ObjectAttachment {
    #[serde(rename = "type")]
    pub attachment_type: String,

    #[serde(rename = "mediaType", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,

    pub id: String,

    #[serde(rename = "type")]
    pub object_type: String,

    pub attributed_to: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,

    pub content: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub sensitive: bool,

    pub published: DateTime<Utc>,

    pub attachment: Vec<ObjectAttachment>,

    pub tag: Vec<Mention>,

    pub to: Vec<String>,
    pub cc: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
}

fn attachment_type_for(media_type: Option<&str>) -> &'static str {
    match media_type {
        Some(value) if value.starts_with("image/") => IMAGE,
        Some(value) if value.starts_with("video/") => VIDEO,
        Some(value) if value.starts_with("audio/") => AUDIO,
        _ => DOCUMENT,
    }
}

fn build_attachments(media: &JsonValue) -> Vec<ObjectAttachment> {
    let Some(items) = media.as_array() else {
        return vec![];
    };
    items.iter()
        .filter_map(|item| {
            let url = item["url"].as_str()?.to_string();
            let media_type = item["media_type"].as_str()
                .map(|value| value.to_string())
                .or(guess_media_type(&url).map(|value| value.to_string()));
            Some(ObjectAttachment {
                attachment_type:
                    attachment_type_for(media_type.as_deref()).to_string(),
                media_type,
                url,
                name: item["description"].as_str().map(|value| value.to_string()),
            })
        })
        .collect()
}

/// Derives `to`/`cc` from message visibility
pub fn build_audience(
    actor_id: &str,
    visibility: Visibility,
    community_uri: Option<&str>,
    mentions: &[Mention],
) -> (Vec<String>, Vec<String>) {
    let followers = local_actor_followers(actor_id);
    let (mut to, mut cc) = match visibility {
        Visibility::Public => {
            (vec![AP_PUBLIC.to_string()], vec![followers])
        },
        Visibility::Unlisted => {
            (vec![followers], vec![AP_PUBLIC.to_string()])
        },
        Visibility::Followers => (vec![followers], vec![]),
        Visibility::Direct => (vec![], vec![]),
    };
    if let Some(community_uri) = community_uri {
        to.push(community_uri.to_string());
    };
    for mention in mentions {
        if visibility == Visibility::Direct {
            to.push(mention.href.clone());
        } else if !to.contains(&mention.href) {
            cc.push(mention.href.clone());
        };
    };
    (to, cc)
}

pub struct ReplyContext {
    pub in_reply_to: Option<String>,
    pub community_uri: Option<String>,
}

/// Walks the reply chain to find the parent's object ID and the
/// community the thread belongs to
pub async fn get_reply_context(
    db_client: &impl DatabaseClient,
    message: &DbMessage,
) -> Result<ReplyContext, DatabaseError> {
    let mut in_reply_to = None;
    let mut community_uri = message.community_actor_uri.clone();
    let mut maybe_parent_id = message.reply_to_id;
    let mut depth = 0;
    while let Some(parent_id) = maybe_parent_id {
        if depth >= REPLY_CHAIN_DEPTH_MAX {
            break;
        };
        let parent = match get_message_by_id(db_client, parent_id).await {
            Ok(parent) => parent,
            Err(DatabaseError::NotFound(_)) => break,
            Err(other_error) => return Err(other_error),
        };
        if depth == 0 {
            in_reply_to = parent.activitypub_id.clone();
        };
        if community_uri.is_none() {
            community_uri = parent.community_actor_uri.clone();
        };
        if in_reply_to.is_some() && community_uri.is_some() {
            break;
        };
        maybe_parent_id = parent.reply_to_id;
        depth += 1;
    };
    Ok(ReplyContext { in_reply_to, community_uri })
}

#[allow(clippy::too_many_arguments)]
pub fn build_note(
    instance_url: &str,
    username: &str,
    message: &DbMessage,
    reply_context: &ReplyContext,
    mentions: Vec<Mention>,
    with_context: bool,
) -> Note {
    let actor_id = local_actor_id(instance_url, username);
    let object_id = message.activitypub_id.clone()
        .unwrap_or(local_message_id(instance_url, username, message.id));
    let (to, cc) = build_audience(
        &actor_id,
        message.visibility,
        reply_context.community_uri.as_deref(),
        &mentions,
    );
    Note {
        context: with_context.then(build_default_context),
        id: object_id,
        object_type: NOTE.to_string(),
        attributed_to: actor_id,
        in_reply_to: reply_context.in_reply_to.clone(),
        content: sanitize_html(&message.content),
        summary: message.content_warning.clone(),
        name: message.title.clone(),
        sensitive: message.sensitive,
        published: message.created_at,
        attachment: build_attachments(&message.media),
        tag: mentions,
        to,
        cc,
        audience: reply_context.community_uri.clone(),
    }
}

#[derive(Serialize)]
pub struct QuestionOption {
    #[serde(rename = "type")]
    pub option_type: String,

    pub name: String,

    pub replies: JsonValue,
}

/// A poll: a Note with answer options
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(flatten)]
    pub note: Note,

    pub one_of: Vec<QuestionOption>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

pub fn build_question(
    mut note: Note,
    options: Vec<String>,
    end_time: Option<DateTime<Utc>>,
) -> Question {
    note.object_type = QUESTION.to_string();
    let one_of = options.into_iter()
        .map(|name| QuestionOption {
            option_type: NOTE.to_string(),
            name,
            replies: serde_json::json!({
                "type": "Collection",
                "totalItems": 0,
            }),
        })
        .collect();
    Question { note, one_of, end_time }
}

#[cfg(test)]
pub(crate) mod tests {
    use serde_json::json;
    use uuid::Uuid;
    use super::*;

    const INSTANCE_URL: &str = "https://social.example";

    pub(crate) fn test_message(visibility: Visibility) -> DbMessage {
        DbMessage {
            id: Uuid::new_v4(),
            author_actor_id: Uuid::new_v4(),
            content: "<p>Hello world</p>".to_string(),
            visibility,
            activitypub_id: None,
            reply_to_id: None,
            reply_count: 0,
            like_count: 0,
            dislike_count: 0,
            share_count: 0,
            sensitive: false,
            content_warning: None,
            title: None,
            media: json!([]),
            community_actor_uri: None,
            edited_at: None,
            deleted_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_build_note_public() {
        let message = test_message(Visibility::Public);
        let reply_context = ReplyContext {
            in_reply_to: None,
            community_uri: None,
        };
        let note = build_note(
            INSTANCE_URL,
            "bob",
            &message,
            &reply_context,
            vec![],
            true,
        );
        assert_eq!(
            note.id,
            format!("{}/users/bob/statuses/{}", INSTANCE_URL, message.id),
        );
        assert_eq!(note.attributed_to, "https://social.example/users/bob");
        assert_eq!(note.to, vec![AP_PUBLIC.to_string()]);
        assert_eq!(
            note.cc,
            vec!["https://social.example/users/bob/followers".to_string()],
        );
    }

    #[test]
    fn test_build_audience_followers() {
        let (to, cc) = build_audience(
            "https://social.example/users/bob",
            Visibility::Followers,
            None,
            &[],
        );
        assert_eq!(
            to,
            vec!["https://social.example/users/bob/followers".to_string()],
        );
        assert_eq!(cc.is_empty(), true);
    }

    #[test]
    fn test_build_audience_community() {
        let (to, _) = build_audience(
            "https://social.example/users/bob",
            Visibility::Public,
            Some("https://lemmy.example/c/rust"),
            &[],
        );
        assert_eq!(to.contains(&AP_PUBLIC.to_string()), true);
        assert_eq!(to.contains(&"https://lemmy.example/c/rust".to_string()), true);
    }

    #[test]
    fn test_build_audience_mentions() {
        let mention = Mention {
            tag_type: "Mention".to_string(),
            href: "https://remote.example/users/alice".to_string(),
            name: "@alice@remote.example".to_string(),
        };
        let (_, cc) = build_audience(
            "https://social.example/users/bob",
            Visibility::Public,
            None,
            &[mention.clone()],
        );
        assert_eq!(cc.contains(&mention.href), true);

        let (to, _) = build_audience(
            "https://social.example/users/bob",
            Visibility::Direct,
            None,
            &[mention.clone()],
        );
        assert_eq!(to, vec![mention.href]);
    }

    #[test]
    fn test_build_question() {
        let message = test_message(Visibility::Public);
        let reply_context = ReplyContext {
            in_reply_to: None,
            community_uri: None,
        };
        let note = build_note(
            INSTANCE_URL,
            "bob",
            &message,
            &reply_context,
            vec![],
            false,
        );
        let question = build_question(
            note,
            vec!["yes".to_string(), "no".to_string()],
            None,
        );
        assert_eq!(question.note.object_type, "Question");
        assert_eq!(question.one_of.len(), 2);
        assert_eq!(question.one_of[0].name, "yes");

        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(value["type"], "Question");
        assert_eq!(value["oneOf"][1]["name"], "no");
    }

    #[test]
    fn test_build_attachments() {
        let media = json!([
            {"url": "https://files.example/a.png", "description": "alt text"},
            {"url": "https://files.example/b.mp4", "media_type": "video/mp4"},
        ]);
        let attachments = build_attachments(&media);
        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0].attachment_type, "Image");
        assert_eq!(attachments[0].media_type.as_deref(), Some("image/png"));
        assert_eq!(attachments[0].name.as_deref(), Some("alt text"));
        assert_eq!(attachments[1].attachment_type, "Video");
    }
}
