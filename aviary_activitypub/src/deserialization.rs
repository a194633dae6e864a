//! Helpers for reading loosely-shaped ActivityStreams values
use serde::{Deserialize, Deserializer};
use serde_json::{Value as JsonValue};

/// Returns the ID of a value that may be an object or a bare ID
pub fn object_to_id(value: &JsonValue) -> Result<String, &'static str> {
    let object_id = match value {
        JsonValue::String(object_id) => object_id.to_string(),
        JsonValue::Object(_) => {
            value["id"].as_str()
                .ok_or("object ID is missing")?
                .to_string()
        },
        _ => return Err("unexpected object value"),
    };
    Ok(object_id)
}

/// Deserializes a value that may be an object or a bare ID into an ID
pub fn deserialize_into_object_id<'de, D>(
    deserializer: D,
) -> Result<String, D::Error>
    where D: Deserializer<'de>
{
    let value = JsonValue::deserialize(deserializer)?;
    let object_id = object_to_id(&value)
        .map_err(serde::de::Error::custom)?;
    Ok(object_id)
}

/// Reads a value that may be a string or an array of strings
pub fn parse_string_array(value: &JsonValue) -> Vec<String> {
    match value {
        JsonValue::String(item) => vec![item.to_string()],
        JsonValue::Array(items) => {
            items.iter()
                .filter_map(|item| object_to_id(item).ok())
                .collect()
        },
        _ => vec![],
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrArray {
    String(String),
    Array(Vec<JsonValue>),
}

/// Deserializes `to`/`cc` style audience properties
pub fn deserialize_string_array<'de, D>(
    deserializer: D,
) -> Result<Vec<String>, D::Error>
    where D: Deserializer<'de>
{
    let maybe_value: Option<StringOrArray> =
        Option::deserialize(deserializer)?;
    let items = match maybe_value {
        Some(StringOrArray::String(item)) => vec![item],
        Some(StringOrArray::Array(items)) => {
            items.iter()
                .filter_map(|item| object_to_id(item).ok())
                .collect()
        },
        None => vec![],
    };
    Ok(items)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    #[test]
    fn test_object_to_id() {
        let value = json!("https://social.example/objects/1");
        assert_eq!(
            object_to_id(&value).unwrap(),
            "https://social.example/objects/1",
        );
        let value = json!({"id": "https://social.example/objects/1"});
        assert_eq!(
            object_to_id(&value).unwrap(),
            "https://social.example/objects/1",
        );
        let value = json!(1);
        assert_eq!(object_to_id(&value).is_err(), true);
    }

    #[test]
    fn test_parse_string_array() {
        let value = json!("https://social.example/users/1");
        assert_eq!(
            parse_string_array(&value),
            vec!["https://social.example/users/1"],
        );
        let value = json!([
            "https://social.example/users/1",
            {"id": "https://social.example/users/2"},
        ]);
        assert_eq!(
            parse_string_array(&value),
            vec![
                "https://social.example/users/1",
                "https://social.example/users/2",
            ],
        );
    }

    #[test]
    fn test_deserialize_string_array() {
        #[derive(Deserialize)]
        struct TestObject {
            #[serde(default, deserialize_with = "deserialize_string_array")]
            to: Vec<String>,
        }
        let object: TestObject = serde_json::from_value(json!({
            "to": "https://www.w3.org/ns/activitystreams#Public",
        })).unwrap();
        assert_eq!(object.to.len(), 1);
        let object: TestObject = serde_json::from_value(json!({})).unwrap();
        assert_eq!(object.to.len(), 0);
    }
}
