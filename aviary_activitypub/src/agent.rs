use aviary_config::Instance;
use aviary_core::crypto_rsa::RsaSecretKey;
use aviary_fetch::agent::{FederationAgent, RequestSigner};

use super::identifiers::{local_actor_key_id, local_instance_actor_id};

const RESPONSE_SIZE_LIMIT: usize = 2_000_000;

/// Builds an agent that signs requests with the instance actor key
pub fn build_federation_agent(instance: &Instance) -> FederationAgent {
    let instance_actor_id = local_instance_actor_id(instance.url());
    let key_id = local_actor_key_id(&instance_actor_id);
    build_federation_agent_with_key(
        instance,
        instance.rsa_secret_key.clone(),
        key_id,
    )
}

pub fn build_federation_agent_with_key(
    instance: &Instance,
    secret_key: RsaSecretKey,
    key_id: String,
) -> FederationAgent {
    FederationAgent {
        user_agent: Some(instance.agent()),
        response_size_limit: RESPONSE_SIZE_LIMIT,
        fetcher_timeout: instance.federation.fetcher_timeout,
        deliverer_timeout: instance.federation.deliverer_timeout,
        sign_fetches: instance.federation.sign_fetches,
        signer: Some(RequestSigner { key: secret_key, key_id }),
    }
}
