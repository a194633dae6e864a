use serde::Serialize;

use crate::{
    contexts::{build_default_context, Context},
    identifiers::local_activity_id,
    vocabulary::REJECT,
};

#[derive(Serialize)]
pub struct RejectFollow {
    #[serde(rename = "@context")]
    pub context: Context,

    #[serde(rename = "type")]
    pub activity_type: String,

    pub id: String,
    pub actor: String,
    pub object: String,

    pub to: Vec<String>,
}

pub fn build_reject_follow(
    instance_url: &str,
    actor_id: &str,
    source_actor_id: &str,
    follow_activity_id: &str,
) -> RejectFollow {
    RejectFollow {
        context: build_default_context(),
        activity_type: REJECT.to_string(),
        id: local_activity_id(instance_url),
        actor: actor_id.to_string(),
        object: follow_activity_id.to_string(),
        to: vec![source_actor_id.to_string()],
    }
}
