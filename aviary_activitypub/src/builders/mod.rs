pub mod accept_follow;
pub mod actor_document;
pub mod announce;
pub mod block;
pub mod create_note;
pub mod delete_note;
pub mod flag;
pub mod follow;
pub mod like;
pub mod mentions;
pub mod note;
pub mod reject_follow;
pub mod undo;
pub mod update_note;
