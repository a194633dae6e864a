//! WebFinger resolution
//! <https://webfinger.net/>
use serde::{Deserialize, Serialize};

use super::{
    agent::FederationAgent,
    constants::{AP_MEDIA_TYPE, AS_MEDIA_TYPE, JRD_MEDIA_TYPE},
    fetch::{fetch_json, FetchError, ObjectCache},
};

const WEBFINGER_SELF_RELATION: &str = "self";

#[derive(Clone, Deserialize, Serialize)]
pub struct Link {
    pub rel: String,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl Link {
    pub fn actor(actor_id: &str) -> Self {
        Self {
            rel: WEBFINGER_SELF_RELATION.to_string(),
            media_type: Some(AP_MEDIA_TYPE.to_string()),
            href: Some(actor_id.to_string()),
        }
    }
}

/// JSON Resource Descriptor
/// <https://datatracker.ietf.org/doc/html/rfc7033>
#[derive(Deserialize, Serialize)]
pub struct JsonResourceDescriptor {
    pub subject: String,
    pub links: Vec<Link>,
}

impl JsonResourceDescriptor {
    pub fn find_actor_id(&self) -> Option<String> {
        self.links.iter()
            .filter(|link| link.rel == WEBFINGER_SELF_RELATION)
            .find(|link| {
                matches!(
                    link.media_type.as_deref(),
                    Some(AP_MEDIA_TYPE) | Some(AS_MEDIA_TYPE),
                )
            })
            .and_then(|link| link.href.clone())
    }
}

/// Resolves an `acct:{username}@{domain}` handle to an actor ID
pub async fn resolve_actor_id(
    agent: &FederationAgent,
    cache: &ObjectCache,
    username: &str,
    domain: &str,
) -> Result<String, FetchError> {
    let acct_uri = format!("acct:{}@{}", username, domain);
    let webfinger_url = format!("https://{}/.well-known/webfinger", domain);
    let cache_key = format!("{}?resource={}", webfinger_url, acct_uri);
    if let Some(cached) = cache.get(&cache_key).await {
        let jrd: JsonResourceDescriptor = serde_json::from_value(cached)
            .map_err(|_| FetchError::InvalidJson(cache_key.clone()))?;
        return jrd.find_actor_id()
            .ok_or(FetchError::NotFound(acct_uri));
    };
    let jrd_value = fetch_json(
        agent,
        &webfinger_url,
        &[("resource", &acct_uri)],
        Some(JRD_MEDIA_TYPE),
    ).await?;
    let jrd: JsonResourceDescriptor =
        serde_json::from_value(jrd_value.clone())
            .map_err(|_| FetchError::InvalidJson(webfinger_url.clone()))?;
    cache.insert(&cache_key, jrd_value).await;
    jrd.find_actor_id()
        .ok_or(FetchError::NotFound(acct_uri))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    #[test]
    fn test_find_actor_id() {
        let jrd_value = json!({
            "subject": "acct:alice@social.example",
            "links": [
                {
                    "rel": "http://webfinger.net/rel/profile-page",
                    "type": "text/html",
                    "href": "https://social.example/@alice",
                },
                {
                    "rel": "self",
                    "type": "application/activity+json",
                    "href": "https://social.example/users/alice",
                },
            ],
        });
        let jrd: JsonResourceDescriptor =
            serde_json::from_value(jrd_value).unwrap();
        assert_eq!(
            jrd.find_actor_id().unwrap(),
            "https://social.example/users/alice",
        );
    }

    #[test]
    fn test_find_actor_id_profiled_media_type() {
        let jrd_value = json!({
            "subject": "acct:alice@social.example",
            "links": [
                {
                    "rel": "self",
                    "type": "application/ld+json; profile=\"https://www.w3.org/ns/activitystreams\"",
                    "href": "https://social.example/users/alice",
                },
            ],
        });
        let jrd: JsonResourceDescriptor =
            serde_json::from_value(jrd_value).unwrap();
        assert_eq!(
            jrd.find_actor_id().unwrap(),
            "https://social.example/users/alice",
        );
    }

    #[test]
    fn test_find_actor_id_no_self_link() {
        let jrd_value = json!({
            "subject": "acct:alice@social.example",
            "links": [],
        });
        let jrd: JsonResourceDescriptor =
            serde_json::from_value(jrd_value).unwrap();
        assert_eq!(jrd.find_actor_id(), None);
    }
}
