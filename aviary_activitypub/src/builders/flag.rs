use serde::Serialize;

use crate::{
    contexts::{build_default_context, Context},
    identifiers::local_activity_id,
    vocabulary::FLAG,
};

#[derive(Serialize)]
pub struct Flag {
    #[serde(rename = "@context")]
    pub context: Context,

    #[serde(rename = "type")]
    pub activity_type: String,

    pub id: String,
    pub actor: String,

    /// Reported actor and object IDs
    pub object: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    pub to: Vec<String>,
}

pub fn build_flag(
    instance_url: &str,
    actor_id: &str,
    object_ids: Vec<String>,
    content: Option<String>,
    remote_inbox_owner_id: &str,
) -> Flag {
    Flag {
        context: build_default_context(),
        activity_type: FLAG.to_string(),
        id: local_activity_id(instance_url),
        actor: actor_id.to_string(),
        object: object_ids,
        content,
        to: vec![remote_inbox_owner_id.to_string()],
    }
}
