use serde::Deserialize;

const fn default_federation_enabled() -> bool { true }
const fn default_sign_fetches() -> bool { false }
const fn default_fetcher_timeout() -> u64 { 10 }
const fn default_deliverer_timeout() -> u64 { 10 }
const fn default_reachability_timeout_days() -> u32 { 7 }
const fn default_max_collection_items() -> usize { 100 }
const fn default_max_collection_pages() -> usize { 5 }
const fn default_inbox_queue_batch_size() -> u32 { 20 }
const fn default_delivery_queue_batch_size() -> u32 { 10 }

#[derive(Clone, Deserialize)]
pub struct FederationConfig {
    #[serde(default = "default_federation_enabled")]
    pub enabled: bool,

    /// Sign all outgoing GET requests instead of retrying on 401
    #[serde(default = "default_sign_fetches")]
    pub sign_fetches: bool,

    #[serde(default = "default_fetcher_timeout")]
    pub fetcher_timeout: u64,
    #[serde(default = "default_deliverer_timeout")]
    pub deliverer_timeout: u64,

    /// Instances unreachable for longer than this are considered dead
    #[serde(default = "default_reachability_timeout_days")]
    pub reachability_timeout_days: u32,

    #[serde(default = "default_max_collection_items")]
    pub max_collection_items: usize,
    #[serde(default = "default_max_collection_pages")]
    pub max_collection_pages: usize,

    #[serde(default = "default_inbox_queue_batch_size")]
    pub inbox_queue_batch_size: u32,
    #[serde(default = "default_delivery_queue_batch_size")]
    pub delivery_queue_batch_size: u32,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            enabled: default_federation_enabled(),
            sign_fetches: default_sign_fetches(),
            fetcher_timeout: default_fetcher_timeout(),
            deliverer_timeout: default_deliverer_timeout(),
            reachability_timeout_days: default_reachability_timeout_days(),
            max_collection_items: default_max_collection_items(),
            max_collection_pages: default_max_collection_pages(),
            inbox_queue_batch_size: default_inbox_queue_batch_size(),
            delivery_queue_batch_size: default_delivery_queue_batch_size(),
        }
    }
}
