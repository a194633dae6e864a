//! Inbound rate limiting
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use aviary_config::RateLimits;

const MINUTE_BUCKET_SECONDS: u64 = 60;

#[derive(Clone, Eq, Hash, PartialEq)]
enum CounterKey {
    Ip(String, u64),
    Domain(String, u64),
    Global(u64),
}

impl CounterKey {
    fn bucket(&self) -> u64 {
        match self {
            Self::Ip(_, bucket) => *bucket,
            Self::Domain(_, bucket) => *bucket,
            Self::Global(bucket) => *bucket,
        }
    }
}

/// Counters bucketed by time window, swept periodically.
/// Contents are advisory and lost on restart.
#[derive(Clone)]
pub struct InboxRateLimiter {
    limits: RateLimits,
    counters: Arc<Mutex<HashMap<CounterKey, u32>>>,
}

fn now_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock should be after the epoch")
        .as_secs()
}

impl InboxRateLimiter {
    pub fn new(limits: RateLimits) -> Self {
        Self {
            limits,
            counters: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Counts a request; returns false if any limit is exceeded
    pub fn check(&self, ip: &str, actor_domain: Option<&str>) -> bool {
        let now = now_seconds();
        let minute_bucket = now / MINUTE_BUCKET_SECONDS;
        let mut counters = self.counters.lock()
            .expect("rate limiter lock should not be poisoned");

        let mut allowed = true;
        let ip_key = CounterKey::Ip(ip.to_string(), minute_bucket);
        let ip_count = counters.entry(ip_key).or_insert(0);
        *ip_count += 1;
        if *ip_count > self.limits.max_per_minute {
            allowed = false;
        };

        if let Some(domain) = actor_domain {
            let domain_key =
                CounterKey::Domain(domain.to_string(), minute_bucket);
            let domain_count = counters.entry(domain_key).or_insert(0);
            *domain_count += 1;
            if *domain_count > self.limits.max_per_domain_per_minute {
                allowed = false;
            };
        };

        let global_key = CounterKey::Global(now);
        let global_count = counters.entry(global_key).or_insert(0);
        *global_count += 1;
        if *global_count > self.limits.max_global_per_second {
            allowed = false;
        };

        allowed
    }

    /// Removes counters whose time bucket has passed
    pub fn sweep(&self) {
        let now = now_seconds();
        let minute_bucket = now / MINUTE_BUCKET_SECONDS;
        let mut counters = self.counters.lock()
            .expect("rate limiter lock should not be poisoned");
        counters.retain(|key, _| {
            match key {
                CounterKey::Global(_) => key.bucket() + 2 > now,
                _ => key.bucket() + 2 > minute_bucket,
            }
        });
    }

    #[cfg(test)]
    fn counter_count(&self) -> usize {
        self.counters.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> RateLimits {
        RateLimits {
            max_per_minute: 3,
            max_per_domain_per_minute: 5,
            max_global_per_second: 100,
        }
    }

    #[test]
    fn test_per_ip_limit() {
        let limiter = InboxRateLimiter::new(limits());
        for _ in 0..3 {
            assert_eq!(limiter.check("203.0.113.5", None), true);
        };
        assert_eq!(limiter.check("203.0.113.5", None), false);
        // Another IP is unaffected
        assert_eq!(limiter.check("203.0.113.6", None), true);
    }

    #[test]
    fn test_per_domain_limit() {
        let limiter = InboxRateLimiter::new(limits());
        for index in 0..5 {
            let ip = format!("203.0.113.{}", index);
            assert_eq!(limiter.check(&ip, Some("remote.example")), true);
        };
        assert_eq!(
            limiter.check("203.0.113.99", Some("remote.example")),
            false,
        );
    }

    #[test]
    fn test_sweep_removes_counters() {
        let limiter = InboxRateLimiter::new(limits());
        limiter.check("203.0.113.5", Some("remote.example"));
        assert!(limiter.counter_count() > 0);
        // Current buckets survive a sweep
        limiter.sweep();
        assert!(limiter.counter_count() > 0);
    }
}
