//! Normalization applied after all user-configured policies
use serde_json::{json, Value as JsonValue};

use crate::deserialization::parse_string_array;

/// Brings audience properties into a canonical array shape so
/// handlers don't have to deal with string-or-array values.
pub(super) fn apply(mut activity: JsonValue) -> JsonValue {
    for property in ["to", "cc"] {
        if !activity[property].is_null() {
            let normalized = parse_string_array(&activity[property]);
            activity[property] = json!(normalized);
        };
    };
    activity
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    #[test]
    fn test_normalize_audience() {
        let activity = json!({
            "type": "Create",
            "to": "https://www.w3.org/ns/activitystreams#Public",
            "object": {"type": "Note", "content": "hello"},
        });
        let normalized = apply(activity);
        assert_eq!(
            normalized["to"],
            json!(["https://www.w3.org/ns/activitystreams#Public"]),
        );
        assert_eq!(normalized["cc"].is_null(), true);
    }
}
