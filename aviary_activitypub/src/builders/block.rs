use serde::Serialize;

use crate::{
    contexts::{build_default_context, Context},
    identifiers::local_activity_id,
    vocabulary::BLOCK,
};

#[derive(Serialize)]
pub struct Block {
    #[serde(rename = "@context")]
    pub context: Context,

    #[serde(rename = "type")]
    pub activity_type: String,

    pub id: String,
    pub actor: String,
    pub object: String,

    pub to: Vec<String>,
}

pub fn build_block(
    instance_url: &str,
    actor_id: &str,
    target_actor_id: &str,
) -> Block {
    Block {
        context: build_default_context(),
        activity_type: BLOCK.to_string(),
        id: local_activity_id(instance_url),
        actor: actor_id.to_string(),
        object: target_actor_id.to_string(),
        to: vec![target_actor_id.to_string()],
    }
}
