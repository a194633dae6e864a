pub const AP_MEDIA_TYPE: &str = "application/activity+json";
pub const AS_MEDIA_TYPE: &str =
    r#"application/ld+json; profile="https://www.w3.org/ns/activitystreams""#;

/// Accept header sent with every ActivityPub fetch
pub const AP_ACCEPT: &str = concat!(
    "application/activity+json, ",
    r#"application/ld+json; profile="https://www.w3.org/ns/activitystreams""#,
);

pub const AP_PUBLIC: &str = "https://www.w3.org/ns/activitystreams#Public";

pub const JRD_MEDIA_TYPE: &str = "application/jrd+json";
