//! Authentication of incoming requests
use http::{HeaderMap, Method, Uri};
use thiserror::Error;

use aviary_core::{
    http_digest::ContentDigest,
    http_signatures::verify::{
        parse_http_signature,
        verify_http_signature,
        HttpSignatureVerificationError,
    },
};
use aviary_fetch::{agent::FederationAgent, fetch::ObjectCache};
use aviary_models::database::{DatabaseClient, DatabaseError};
use aviary_validators::activitypub::validate_actor_domain;

use super::{
    errors::HandlerError,
    keys::{
        get_verification_key,
        refresh_verification_key,
    },
};

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error(transparent)]
    SignatureError(#[from] HttpSignatureVerificationError),

    #[error("actor fetch failed")]
    ActorFetchFailed,

    #[error("actor hostname mismatch")]
    UnexpectedSigner,

    #[error(transparent)]
    DatabaseError(#[from] DatabaseError),
}

impl From<HandlerError> for AuthenticationError {
    fn from(error: HandlerError) -> Self {
        match error {
            HandlerError::DatabaseError(db_error) => Self::DatabaseError(db_error),
            _ => Self::ActorFetchFailed,
        }
    }
}

/// Verifies the HTTP signature of an inbox request.
///
/// Returns the URI of the actor that signed the request. Keys are
/// looked up in the signing key cache first; a failed verification
/// triggers a single throttled key refresh before giving up.
pub async fn verify_signed_request(
    db_client: &impl DatabaseClient,
    agent: &FederationAgent,
    cache: &ObjectCache,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    content_digest: Option<ContentDigest>,
) -> Result<String, AuthenticationError> {
    let signature_data = parse_http_signature(method, uri, headers)?;
    let key = get_verification_key(
        db_client,
        agent,
        cache,
        &signature_data.key_id,
    ).await?;
    match verify_http_signature(&signature_data, &key.public_key, content_digest) {
        Ok(()) => Ok(key.actor_uri),
        Err(HttpSignatureVerificationError::InvalidSignature)
            if key.can_refresh() =>
        {
            // The remote server may have rotated its key
            let key = refresh_verification_key(db_client, agent, cache, key)
                .await?;
            verify_http_signature(
                &signature_data,
                &key.public_key,
                content_digest,
            )?;
            Ok(key.actor_uri)
        },
        Err(other_error) => Err(other_error.into()),
    }
}

/// Ensures the activity's `actor` matches the signer's host
pub fn verify_actor_matches_signer(
    actor_uri: &str,
    signer_uri: &str,
) -> Result<(), AuthenticationError> {
    let signer_hostname = aviary_core::urls::get_hostname(signer_uri)
        .map_err(|_| AuthenticationError::UnexpectedSigner)?;
    validate_actor_domain(actor_uri, &signer_hostname)
        .map_err(|_| AuthenticationError::UnexpectedSigner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_actor_matches_signer() {
        let result = verify_actor_matches_signer(
            "https://remote.example/users/alice",
            "https://remote.example/users/alice",
        );
        assert_eq!(result.is_ok(), true);
        // Signed by a different server
        let result = verify_actor_matches_signer(
            "https://remote.example/users/alice",
            "https://evil.example/actor",
        );
        assert_eq!(result.is_err(), true);
    }
}
