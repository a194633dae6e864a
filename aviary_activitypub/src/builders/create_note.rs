use serde::Serialize;

use aviary_models::database::DatabaseClient;
use aviary_models::messages::types::DbMessage;

use crate::{
    contexts::{build_default_context, Context},
    errors::HandlerError,
    handlers::HandlerContext,
    identifiers::local_create_activity_id,
    vocabulary::CREATE,
};

use super::mentions::resolve_mentions;
use super::note::{build_note, get_reply_context, Note};

#[derive(Serialize)]
pub struct CreateNote {
    #[serde(rename = "@context")]
    pub context: Context,

    #[serde(rename = "type")]
    pub activity_type: String,

    pub id: String,
    pub actor: String,
    pub object: Note,

    pub to: Vec<String>,
    pub cc: Vec<String>,
}

pub fn build_create_note(note: Note) -> CreateNote {
    CreateNote {
        context: build_default_context(),
        activity_type: CREATE.to_string(),
        id: local_create_activity_id(&note.id),
        actor: note.attributed_to.clone(),
        to: note.to.clone(),
        cc: note.cc.clone(),
        object: note,
    }
}

/// Builds the Create activity for a local message, resolving
/// mentions and the reply chain
pub async fn prepare_create_note(
    context: &HandlerContext<'_>,
    db_client: &impl DatabaseClient,
    username: &str,
    message: &DbMessage,
) -> Result<CreateNote, HandlerError> {
    let reply_context = get_reply_context(db_client, message).await?;
    let agent = context.agent();
    let mentions = resolve_mentions(
        &agent,
        context.object_cache(),
        &message.content,
    ).await;
    let note = build_note(
        context.instance().url(),
        username,
        message,
        &reply_context,
        mentions,
        false,
    );
    Ok(build_create_note(note))
}

#[cfg(test)]
mod tests {
    use aviary_models::messages::types::Visibility;
    use crate::builders::note::tests::test_message;
    use crate::builders::note::ReplyContext;
    use super::*;

    #[test]
    fn test_build_create_note() {
        let message = test_message(Visibility::Public);
        let reply_context = ReplyContext {
            in_reply_to: None,
            community_uri: None,
        };
        let note = build_note(
            "https://social.example",
            "bob",
            &message,
            &reply_context,
            vec![],
            false,
        );
        let create = build_create_note(note);
        assert_eq!(create.activity_type, "Create");
        assert_eq!(create.id, format!("{}/activity", create.object.id));
        assert_eq!(create.actor, create.object.attributed_to);
        assert_eq!(create.to, create.object.to);
    }
}
