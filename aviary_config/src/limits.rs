use serde::Deserialize;

const fn default_max_per_minute() -> u32 { 20 }
const fn default_max_per_domain_per_minute() -> u32 { 40 }
const fn default_max_global_per_second() -> u32 { 8 }

/// Inbound rate limits (per IP, per actor domain, global)
#[derive(Clone, Deserialize)]
pub struct RateLimits {
    #[serde(default = "default_max_per_minute")]
    pub max_per_minute: u32,
    #[serde(default = "default_max_per_domain_per_minute")]
    pub max_per_domain_per_minute: u32,
    #[serde(default = "default_max_global_per_second")]
    pub max_global_per_second: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            max_per_minute: default_max_per_minute(),
            max_per_domain_per_minute: default_max_per_domain_per_minute(),
            max_global_per_second: default_max_global_per_second(),
        }
    }
}

const fn default_max_concurrent_per_domain() -> u32 { 2 }
const fn default_failure_threshold() -> u32 { 5 }
const fn default_base_backoff_ms() -> u64 { 2_000 }
const fn default_max_backoff_ms() -> u64 { 120_000 }

/// Per-domain delivery throttling
#[derive(Clone, Deserialize)]
pub struct ThrottlerLimits {
    #[serde(default = "default_max_concurrent_per_domain")]
    pub max_concurrent_per_domain: u32,
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for ThrottlerLimits {
    fn default() -> Self {
        Self {
            max_concurrent_per_domain: default_max_concurrent_per_domain(),
            failure_threshold: default_failure_threshold(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

const fn default_flush_interval_ms() -> u64 { 500 }
const fn default_max_batch_size() -> usize { 25 }
const fn default_insert_chunk_size() -> usize { 5 }
const fn default_max_queue_size() -> usize { 5_000 }

/// In-memory inbox staging queue
#[derive(Clone, Deserialize)]
pub struct InboxQueueLimits {
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default = "default_insert_chunk_size")]
    pub insert_chunk_size: usize,
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,
}

impl Default for InboxQueueLimits {
    fn default() -> Self {
        Self {
            flush_interval_ms: default_flush_interval_ms(),
            max_batch_size: default_max_batch_size(),
            insert_chunk_size: default_insert_chunk_size(),
            max_queue_size: default_max_queue_size(),
        }
    }
}

const fn default_max_throttle_snoozes() -> u32 { 3 }
const fn default_throttle_snooze_seconds() -> u32 { 30 }
const fn default_max_backoff_job_age_seconds() -> u32 { 120 }
const fn default_max_job_age_seconds() -> u32 { 600 }
const fn default_max_delivery_attempts() -> u32 { 10 }
const fn default_retry_batch_size() -> u32 { 500 }

/// Outbound delivery job policy
#[derive(Clone, Deserialize)]
pub struct DeliveryLimits {
    #[serde(default = "default_max_throttle_snoozes")]
    pub max_throttle_snoozes: u32,
    #[serde(default = "default_throttle_snooze_seconds")]
    pub throttle_snooze_seconds: u32,
    #[serde(default = "default_max_backoff_job_age_seconds")]
    pub max_backoff_job_age_seconds: u32,
    #[serde(default = "default_max_job_age_seconds")]
    pub max_job_age_seconds: u32,
    #[serde(default = "default_max_delivery_attempts")]
    pub max_delivery_attempts: u32,
    #[serde(default = "default_retry_batch_size")]
    pub retry_batch_size: u32,
}

impl Default for DeliveryLimits {
    fn default() -> Self {
        Self {
            max_throttle_snoozes: default_max_throttle_snoozes(),
            throttle_snooze_seconds: default_throttle_snooze_seconds(),
            max_backoff_job_age_seconds: default_max_backoff_job_age_seconds(),
            max_job_age_seconds: default_max_job_age_seconds(),
            max_delivery_attempts: default_max_delivery_attempts(),
            retry_batch_size: default_retry_batch_size(),
        }
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct Limits {
    #[serde(default)]
    pub rate_limits: RateLimits,
    #[serde(default)]
    pub throttler: ThrottlerLimits,
    #[serde(default)]
    pub inbox_queue: InboxQueueLimits,
    #[serde(default)]
    pub delivery: DeliveryLimits,
}
