use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    contexts::{build_default_context, Context},
    identifiers::local_activity_id,
    vocabulary::UPDATE,
};

use super::note::Note;

#[derive(Serialize)]
pub struct UpdateNote {
    #[serde(rename = "@context")]
    pub context: Context,

    #[serde(rename = "type")]
    pub activity_type: String,

    pub id: String,
    pub actor: String,
    pub object: Note,

    pub updated: DateTime<Utc>,

    pub to: Vec<String>,
    pub cc: Vec<String>,
}

pub fn build_update_note(
    instance_url: &str,
    note: Note,
    updated: DateTime<Utc>,
) -> UpdateNote {
    UpdateNote {
        context: build_default_context(),
        activity_type: UPDATE.to_string(),
        id: local_activity_id(instance_url),
        actor: note.attributed_to.clone(),
        updated,
        to: note.to.clone(),
        cc: note.cc.clone(),
        object: note,
    }
}
