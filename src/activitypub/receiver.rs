//! Inbox request processing.
//!
//! The handler path is the federation hot path: verify the signature,
//! check rate limits, stage the activity in memory and return. No
//! database write happens here.
use actix_web::HttpRequest;
use serde_json::{Value as JsonValue};
use thiserror::Error;

use aviary_activitypub::{
    authentication::{
        verify_actor_matches_signer,
        verify_signed_request,
        AuthenticationError,
    },
    deserialization::object_to_id,
    inbox_queue::EnqueueOutcome,
    state::FederationState,
};
use aviary_config::Config;
use aviary_core::{
    http_digest::ContentDigest,
    http_types::{header_map_adapter, method_adapter, uri_adapter},
    urls::get_hostname,
};
use aviary_models::database::{
    get_database_client,
    DatabaseConnectionPool,
    DatabaseError,
};

use crate::errors::HttpError;

#[derive(Debug, Error)]
pub enum InboxError {
    #[error("{0}")]
    ValidationError(&'static str),

    #[error(transparent)]
    AuthenticationError(#[from] AuthenticationError),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error(transparent)]
    DatabaseError(#[from] DatabaseError),
}

impl From<InboxError> for HttpError {
    fn from(error: InboxError) -> Self {
        match error {
            InboxError::ValidationError(message) => {
                HttpError::ValidationError(message.to_string())
            },
            InboxError::AuthenticationError(_) => {
                HttpError::AuthError("invalid signature")
            },
            InboxError::RateLimited => HttpError::RateLimited,
            InboxError::DatabaseError(db_error) => db_error.into(),
        }
    }
}

pub async fn receive_activity(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
    request: &HttpRequest,
    activity: &JsonValue,
    activity_digest: ContentDigest,
    client_ip: &str,
    recipient: Option<&str>,
) -> Result<EnqueueOutcome, InboxError> {
    let method = method_adapter(request.method());
    let uri = uri_adapter(request.uri());
    let headers = header_map_adapter(request.headers());

    let signer_uri = {
        let db_client_guard = get_database_client(db_pool).await?;
        let db_client = &**db_client_guard;
        let agent = aviary_activitypub::agent::build_federation_agent(
            &config.instance(),
        );
        verify_signed_request(
            db_client,
            &agent,
            &state.object_cache,
            &method,
            &uri,
            &headers,
            Some(activity_digest),
        ).await?
    };

    let signer_domain = get_hostname(&signer_uri)
        .map_err(|_| InboxError::ValidationError("invalid signer URI"))?;
    if !state.rate_limiter.check(client_ip, Some(&signer_domain)) {
        return Err(InboxError::RateLimited);
    };

    // The activity author must live on the signer's server
    let actor_uri = object_to_id(&activity["actor"])
        .map_err(|_| InboxError::ValidationError("invalid 'actor' property"))?;
    verify_actor_matches_signer(&actor_uri, &signer_uri)?;

    let outcome = state.inbox_queue.enqueue(
        activity.clone(),
        &actor_uri,
        recipient,
    );
    Ok(outcome)
}
