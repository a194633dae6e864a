//! Retrieving ActivityPub objects
use std::time::Duration;

use moka::future::Cache;
use reqwest::{header, Method, StatusCode};
use serde_json::{Value as JsonValue};
use thiserror::Error;

use aviary_core::http_signatures::create::HttpSignatureError;

use super::{
    agent::FederationAgent,
    constants::AP_ACCEPT,
    http_client::{
        create_http_client,
        describe_request_error,
        limited_response,
        sign_http_request,
        RedirectAction,
    },
};

/// Errors that may occur when fetching an object
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    SignatureError(#[from] HttpSignatureError),

    #[error("invalid URL")]
    UrlError,

    // Resource is gone (404 or 410); terminal
    #[error("resource not found: {0}")]
    NotFound(String),

    // Any other non-2xx status
    #[error("failed to fetch {0}: HTTP {1}")]
    FetchFailed(String, u16),

    // Transport-level failure
    #[error("{}", describe_request_error(.0))]
    HttpError(#[from] reqwest::Error),

    #[error("response size exceeds limit")]
    ResponseTooLarge,

    #[error("json parse error: {0}")]
    InvalidJson(String),
}

impl FetchError {
    /// Terminal errors should not be retried
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidJson(_) | Self::UrlError)
    }
}

/// Process-wide cache of fetched objects, keyed by URI.
/// Contents are advisory; a restart simply loses warm entries.
#[derive(Clone)]
pub struct ObjectCache {
    cache: Cache<String, JsonValue>,
}

impl ObjectCache {
    pub fn new(capacity: u64, ttl_seconds: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(Duration::from_secs(ttl_seconds))
            .build();
        Self { cache }
    }

    pub async fn get(&self, object_id: &str) -> Option<JsonValue> {
        self.cache.get(object_id).await
    }

    pub async fn insert(&self, object_id: &str, object: JsonValue) {
        self.cache.insert(object_id.to_string(), object).await;
    }

    pub async fn invalidate(&self, object_id: &str) {
        self.cache.invalidate(object_id).await;
    }
}

/// Options for `fetch_object`
#[derive(Default)]
pub struct FetchObjectOptions {
    /// Bypass the object cache
    pub skip_cache: bool,
}

async fn send_fetch_request(
    agent: &FederationAgent,
    object_id: &str,
    signed: bool,
) -> Result<reqwest::Response, FetchError> {
    let client = create_http_client(
        agent,
        agent.fetcher_timeout,
        RedirectAction::Follow,
    )?;
    let mut request_builder = client
        .get(object_id)
        .header(header::ACCEPT, AP_ACCEPT);
    if signed {
        if let Some(ref signer) = agent.signer {
            request_builder = sign_http_request(
                request_builder,
                Method::GET,
                object_id,
                None,
                signer,
            )?;
        };
    };
    let response = request_builder.send().await?;
    Ok(response)
}

fn error_for_status(
    object_id: &str,
    status: StatusCode,
) -> Option<FetchError> {
    if status.is_success() {
        return None;
    };
    let error = match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => {
            FetchError::NotFound(object_id.to_string())
        },
        _ => FetchError::FetchFailed(object_id.to_string(), status.as_u16()),
    };
    Some(error)
}

/// Sends GET request to fetch an ActivityPub object.
///
/// An unsigned request that is answered with 401 is retried with
/// an HTTP signature (secure mode instances require signed fetches).
pub async fn fetch_object(
    agent: &FederationAgent,
    cache: &ObjectCache,
    object_id: &str,
    options: FetchObjectOptions,
) -> Result<JsonValue, FetchError> {
    if !options.skip_cache {
        if let Some(cached) = cache.get(object_id).await {
            return Ok(cached);
        };
    };

    let mut response = send_fetch_request(
        agent,
        object_id,
        agent.sign_fetches,
    ).await?;
    if response.status() == StatusCode::UNAUTHORIZED &&
        !agent.sign_fetches &&
        agent.signer.is_some()
    {
        // Retry with a signed request
        response = send_fetch_request(agent, object_id, true).await?;
    };
    if let Some(error) = error_for_status(object_id, response.status()) {
        return Err(error);
    };

    let object_bytes = limited_response(response, agent.response_size_limit)
        .await?
        .ok_or(FetchError::ResponseTooLarge)?;
    let object_json: JsonValue = serde_json::from_slice(&object_bytes)
        .map_err(|_| FetchError::InvalidJson(object_id.to_string()))?;

    cache.insert(object_id, object_json.clone()).await;
    Ok(object_json)
}

/// Fetches the given object bypassing and refreshing the cache
pub async fn fetch_object_uncached(
    agent: &FederationAgent,
    cache: &ObjectCache,
    object_id: &str,
) -> Result<JsonValue, FetchError> {
    cache.invalidate(object_id).await;
    fetch_object(
        agent,
        cache,
        object_id,
        FetchObjectOptions { skip_cache: true },
    ).await
}

/// Fetches arbitrary JSON data (unsigned request)
pub async fn fetch_json(
    agent: &FederationAgent,
    url: &str,
    query: &[(&str, &str)],
    accept: Option<&str>,
) -> Result<JsonValue, FetchError> {
    const APPLICATION_JSON: &str = "application/json";
    let client = create_http_client(
        agent,
        agent.fetcher_timeout,
        RedirectAction::Follow,
    )?;
    let response = client
        .get(url)
        .query(query)
        .header(header::ACCEPT, accept.unwrap_or(APPLICATION_JSON))
        .send()
        .await?;
    if let Some(error) = error_for_status(url, response.status()) {
        return Err(error);
    };
    let data = limited_response(response, agent.response_size_limit)
        .await?
        .ok_or(FetchError::ResponseTooLarge)?;
    let object_json = serde_json::from_slice(&data)
        .map_err(|_| FetchError::InvalidJson(url.to_string()))?;
    Ok(object_json)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    #[tokio::test]
    async fn test_object_cache() {
        let cache = ObjectCache::new(10, 60);
        let object_id = "https://social.example/objects/1";
        assert_eq!(cache.get(object_id).await, None);
        cache.insert(object_id, json!({"id": object_id})).await;
        assert_eq!(
            cache.get(object_id).await,
            Some(json!({"id": object_id})),
        );
        cache.invalidate(object_id).await;
        assert_eq!(cache.get(object_id).await, None);
    }

    #[test]
    fn test_error_for_status() {
        let error = error_for_status(
            "https://social.example/objects/1",
            StatusCode::GONE,
        ).unwrap();
        assert!(matches!(error, FetchError::NotFound(_)));
        assert_eq!(error.is_terminal(), true);

        let error = error_for_status(
            "https://social.example/objects/1",
            StatusCode::INTERNAL_SERVER_ERROR,
        ).unwrap();
        assert!(matches!(error, FetchError::FetchFailed(_, 500)));
        assert_eq!(error.is_terminal(), false);

        let result = error_for_status(
            "https://social.example/objects/1",
            StatusCode::OK,
        );
        assert!(result.is_none());
    }
}
