//! Signing key lifecycle
use chrono::{Duration, Utc};

use aviary_core::crypto_rsa::{
    deserialize_rsa_public_key,
    generate_rsa_key,
    rsa_public_key_to_pkcs8_pem,
    rsa_secret_key_from_pem,
    rsa_secret_key_to_pkcs1_pem,
    RsaPublicKey,
    RsaSecretKey,
};
use aviary_core::urls::remove_fragment;
use aviary_fetch::{
    agent::FederationAgent,
    fetch::{fetch_object_uncached, FetchError, ObjectCache},
};
use aviary_models::{
    actors::types::DbActor,
    database::{DatabaseClient, DatabaseError},
    signing_keys::queries::{
        get_signing_key,
        get_signing_key_by_actor_id,
        upsert_signing_key,
    },
    signing_keys::types::DbSigningKey,
};

use super::errors::HandlerError;

// Remote keys are refetched at most once per interval
const MIN_REFETCH_INTERVAL: i64 = 300; // seconds

pub struct VerificationKey {
    pub key_id: String,
    pub actor_uri: String,
    pub public_key: RsaPublicKey,
    refreshable: bool,
}

impl VerificationKey {
    fn from_db(
        key_id: &str,
        actor_uri: &str,
        db_key: &DbSigningKey,
    ) -> Result<Self, HandlerError> {
        let public_key = deserialize_rsa_public_key(&db_key.public_key_pem)
            .map_err(|_| HandlerError::ServiceError("stored key is invalid"))?;
        let age = Utc::now() - db_key.updated_at;
        Ok(Self {
            key_id: key_id.to_string(),
            actor_uri: actor_uri.to_string(),
            public_key,
            refreshable: age > Duration::seconds(MIN_REFETCH_INTERVAL),
        })
    }

    pub fn can_refresh(&self) -> bool {
        self.refreshable
    }
}

async fn fetch_and_store_key(
    db_client: &impl DatabaseClient,
    agent: &FederationAgent,
    cache: &ObjectCache,
    key_id: &str,
    actor_uri: &str,
) -> Result<VerificationKey, HandlerError> {
    let actor_json = fetch_object_uncached(agent, cache, actor_uri).await?;
    let public_key_pem = actor_json["publicKey"]["publicKeyPem"].as_str()
        .ok_or(FetchError::InvalidJson(actor_uri.to_string()))?;
    let public_key = deserialize_rsa_public_key(public_key_pem)
        .map_err(|_| HandlerError::ValidationError(
            "remote public key is invalid".to_string(),
        ))?;
    upsert_signing_key(
        db_client,
        key_id,
        None,
        public_key_pem,
        None,
    ).await?;
    Ok(VerificationKey {
        key_id: key_id.to_string(),
        actor_uri: actor_uri.to_string(),
        public_key,
        refreshable: false,
    })
}

/// Loads the public key identified by `keyId`, fetching the owning
/// actor document when the key is not cached
pub async fn get_verification_key(
    db_client: &impl DatabaseClient,
    agent: &FederationAgent,
    cache: &ObjectCache,
    key_id: &str,
) -> Result<VerificationKey, HandlerError> {
    let actor_uri = remove_fragment(key_id)
        .map_err(|_| HandlerError::ValidationError("invalid key ID".to_string()))?;
    match get_signing_key(db_client, key_id).await {
        Ok(db_key) => VerificationKey::from_db(key_id, &actor_uri, &db_key),
        Err(DatabaseError::NotFound(_)) => {
            fetch_and_store_key(db_client, agent, cache, key_id, &actor_uri).await
        },
        Err(other_error) => Err(other_error.into()),
    }
}

/// Refetches a key after a verification failure.
/// Refetches are throttled; a recently refreshed key is returned as is.
pub async fn refresh_verification_key(
    db_client: &impl DatabaseClient,
    agent: &FederationAgent,
    cache: &ObjectCache,
    key: VerificationKey,
) -> Result<VerificationKey, HandlerError> {
    if !key.can_refresh() {
        return Ok(key);
    };
    fetch_and_store_key(
        db_client,
        agent,
        cache,
        &key.key_id,
        &key.actor_uri,
    ).await
}

/// Returns the signing key of a local actor, generating it on first use
pub async fn ensure_local_actor_key(
    db_client: &impl DatabaseClient,
    actor: &DbActor,
    key_id: &str,
) -> Result<RsaSecretKey, HandlerError> {
    match get_signing_key_by_actor_id(db_client, actor.id).await {
        Ok(db_key) => {
            let private_key_pem = db_key.private_key_pem
                .ok_or(HandlerError::ServiceError("local key without secret part"))?;
            let secret_key = rsa_secret_key_from_pem(&private_key_pem)
                .map_err(|_| HandlerError::ServiceError("stored key is invalid"))?;
            Ok(secret_key)
        },
        Err(DatabaseError::NotFound(_)) => {
            let secret_key = generate_rsa_key()
                .map_err(|_| HandlerError::ServiceError("failed to generate key"))?;
            let public_key = RsaPublicKey::from(&secret_key);
            let public_key_pem = rsa_public_key_to_pkcs8_pem(&public_key)
                .map_err(|_| HandlerError::ServiceError("failed to serialize key"))?;
            let private_key_pem = rsa_secret_key_to_pkcs1_pem(&secret_key)
                .map_err(|_| HandlerError::ServiceError("failed to serialize key"))?;
            upsert_signing_key(
                db_client,
                key_id,
                Some(actor.id),
                &public_key_pem,
                Some(&private_key_pem),
            ).await?;
            log::info!("generated signing key for {}", actor.uri);
            Ok(secret_key)
        },
        Err(other_error) => Err(other_error.into()),
    }
}
