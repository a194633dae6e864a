//! Process-wide federation state: in-memory caches and queues.
//! Everything here is advisory; correctness is maintained by
//! database constraints and the Delivery state machine.
use aviary_config::Config;
use aviary_fetch::fetch::ObjectCache;

use super::{
    inbox_queue::InboxQueue,
    queues::DeliveryJobTracker,
    rate_limiter::InboxRateLimiter,
    side_effects::SideEffectBus,
    throttler::DomainThrottler,
};

const OBJECT_CACHE_CAPACITY: u64 = 10_000;
const OBJECT_CACHE_TTL: u64 = 300; // seconds

#[derive(Clone)]
pub struct FederationState {
    pub object_cache: ObjectCache,
    pub side_effects: SideEffectBus,
    pub delivery_tracker: DeliveryJobTracker,
    pub throttler: DomainThrottler,
    pub inbox_queue: InboxQueue,
    pub rate_limiter: InboxRateLimiter,
}

impl FederationState {
    pub fn new(config: &Config) -> Self {
        Self {
            object_cache: ObjectCache::new(
                OBJECT_CACHE_CAPACITY,
                OBJECT_CACHE_TTL,
            ),
            side_effects: SideEffectBus::new(),
            delivery_tracker: DeliveryJobTracker::new(),
            throttler: DomainThrottler::new(config.limits.throttler.clone()),
            inbox_queue: InboxQueue::new(config.limits.inbox_queue.clone()),
            rate_limiter: InboxRateLimiter::new(
                config.limits.rate_limits.clone(),
            ),
        }
    }
}
