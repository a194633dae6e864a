use serde_json::{json, Value as JsonValue};

pub const AP_CONTEXT: &str = "https://www.w3.org/ns/activitystreams";
pub const W3ID_SECURITY_CONTEXT: &str = "https://w3id.org/security/v1";

pub type Context = JsonValue;

pub fn build_default_context() -> Context {
    json!([AP_CONTEXT, W3ID_SECURITY_CONTEXT])
}

/// Context for Group actors and community posts
/// (Lemmy extension vocabulary)
pub fn build_community_context() -> Context {
    json!([
        AP_CONTEXT,
        W3ID_SECURITY_CONTEXT,
        {
            "lemmy": "https://join-lemmy.org/ns#",
            "moderators": "lemmy:moderators",
            "postingRestrictedToMods": "lemmy:postingRestrictedToMods",
            "sensitive": "as:sensitive",
        },
    ])
}
