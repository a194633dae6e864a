// https://www.w3.org/TR/activitystreams-vocabulary/

// Activity types
pub const ACCEPT: &str = "Accept";
pub const ANNOUNCE: &str = "Announce";
pub const BLOCK: &str = "Block";
pub const CREATE: &str = "Create";
pub const DELETE: &str = "Delete";
pub const DISLIKE: &str = "Dislike";
pub const EMOJI_REACT: &str = "EmojiReact";
pub const FLAG: &str = "Flag";
pub const FOLLOW: &str = "Follow";
pub const LIKE: &str = "Like";
pub const REJECT: &str = "Reject";
pub const UNDO: &str = "Undo";
pub const UPDATE: &str = "Update";

// Actor types
pub const APPLICATION: &str = "Application";
pub const GROUP: &str = "Group";
pub const ORGANIZATION: &str = "Organization";
pub const PERSON: &str = "Person";
pub const SERVICE: &str = "Service";

// Object types
pub const ARTICLE: &str = "Article";
pub const AUDIO: &str = "Audio";
pub const DOCUMENT: &str = "Document";
pub const EVENT: &str = "Event";
pub const IMAGE: &str = "Image";
pub const NOTE: &str = "Note";
pub const PAGE: &str = "Page";
pub const QUESTION: &str = "Question";
pub const TOMBSTONE: &str = "Tombstone";
pub const VIDEO: &str = "Video";

// Link types
pub const MENTION: &str = "Mention";

// Collections
pub const ORDERED_COLLECTION: &str = "OrderedCollection";
pub const ORDERED_COLLECTION_PAGE: &str = "OrderedCollectionPage";
