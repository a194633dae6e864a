//! Paging through remote collections
use serde_json::{Value as JsonValue};

use super::{
    agent::FederationAgent,
    fetch::{fetch_object, FetchError, FetchObjectOptions, ObjectCache},
};

const COLLECTION: &str = "Collection";
const ORDERED_COLLECTION: &str = "OrderedCollection";
const COLLECTION_PAGE: &str = "CollectionPage";
const ORDERED_COLLECTION_PAGE: &str = "OrderedCollectionPage";

/// Result of a bounded collection traversal
#[derive(Debug)]
pub enum CollectionItems {
    /// All pages within bounds were retrieved
    Complete(Vec<JsonValue>),
    /// A later page failed after some items were collected
    Partial(Vec<JsonValue>),
}

impl CollectionItems {
    pub fn into_items(self) -> Vec<JsonValue> {
        match self {
            Self::Complete(items) | Self::Partial(items) => items,
        }
    }
}

fn is_collection_page(collection: &JsonValue) -> bool {
    matches!(
        collection["type"].as_str(),
        Some(COLLECTION_PAGE) | Some(ORDERED_COLLECTION_PAGE),
    )
}

fn is_collection(collection: &JsonValue) -> bool {
    is_collection_page(collection) || matches!(
        collection["type"].as_str(),
        Some(COLLECTION) | Some(ORDERED_COLLECTION),
    )
}

fn page_items(page: &JsonValue) -> Vec<JsonValue> {
    let items = if page["orderedItems"].is_array() {
        &page["orderedItems"]
    } else {
        &page["items"]
    };
    items.as_array().cloned().unwrap_or_default()
}

/// Gathers collection items, following `first` and `next` up to
/// `max_pages` pages or until `max_items` items are collected.
pub async fn fetch_collection_items(
    agent: &FederationAgent,
    cache: &ObjectCache,
    collection_id: &str,
    max_pages: usize,
    max_items: usize,
) -> Result<CollectionItems, FetchError> {
    let collection = fetch_object(
        agent,
        cache,
        collection_id,
        FetchObjectOptions::default(),
    ).await?;
    if !is_collection(&collection) {
        return Err(FetchError::InvalidJson(collection_id.to_string()));
    };

    let mut items = page_items(&collection);
    let mut page_count = 0;
    // A non-page collection points to its first page
    let mut next_page_id = if is_collection_page(&collection) {
        collection["next"].as_str().map(|val| val.to_string())
    } else {
        collection["first"].as_str().map(|val| val.to_string())
    };

    while let Some(page_id) = next_page_id {
        if page_count >= max_pages || items.len() >= max_items {
            break;
        };
        let page = match fetch_object(
            agent,
            cache,
            &page_id,
            FetchObjectOptions::default(),
        ).await {
            Ok(page) => page,
            Err(error) => {
                if items.is_empty() {
                    return Err(error);
                };
                log::warn!("collection page failed: {}", error);
                return Ok(CollectionItems::Partial(items));
            },
        };
        items.extend(page_items(&page));
        page_count += 1;
        next_page_id = page["next"].as_str().map(|val| val.to_string());
    };
    items.truncate(max_items);
    Ok(CollectionItems::Complete(items))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    #[test]
    fn test_page_items() {
        let page = json!({
            "type": "OrderedCollectionPage",
            "orderedItems": [{"id": "https://social.example/objects/1"}],
        });
        let items = page_items(&page);
        assert_eq!(items.len(), 1);

        let page = json!({
            "type": "CollectionPage",
            "items": ["https://social.example/objects/1"],
        });
        let items = page_items(&page);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_is_collection() {
        let collection = json!({"type": "OrderedCollection", "first": "..."});
        assert_eq!(is_collection(&collection), true);
        assert_eq!(is_collection_page(&collection), false);
        let not_collection = json!({"type": "Note"});
        assert_eq!(is_collection(&not_collection), false);
    }
}
