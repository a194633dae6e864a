//! Per-domain delivery throttling
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use aviary_config::ThrottlerLimits;

#[derive(Default)]
struct FailureRecord {
    count: u32,
    last_failure: Option<Instant>,
}

struct ThrottlerState {
    concurrent: HashMap<String, u32>,
    failures: HashMap<String, FailureRecord>,
}

/// Result of a slot acquisition attempt
#[derive(Debug, PartialEq)]
pub enum AcquireOutcome {
    Acquired,
    /// All slots for the domain are in use
    Throttled,
    /// The domain is failing; retry after the given number of milliseconds
    Backoff { remaining_ms: u64 },
}

/// In-memory concurrency gate with failure-driven backoff.
/// State is advisory: it is lost on restart and rebuilt from traffic.
#[derive(Clone)]
pub struct DomainThrottler {
    limits: ThrottlerLimits,
    state: Arc<Mutex<ThrottlerState>>,
}

impl DomainThrottler {
    pub fn new(limits: ThrottlerLimits) -> Self {
        Self {
            limits,
            state: Arc::new(Mutex::new(ThrottlerState {
                concurrent: HashMap::new(),
                failures: HashMap::new(),
            })),
        }
    }

    /// `base * 2^(failures - threshold)`, capped
    fn backoff_ms(&self, failure_count: u32) -> u64 {
        let exponent = failure_count
            .saturating_sub(self.limits.failure_threshold)
            .min(31);
        self.limits.base_backoff_ms
            .saturating_mul(2_u64.pow(exponent))
            .min(self.limits.max_backoff_ms)
    }

    pub fn acquire(&self, domain: &str) -> AcquireOutcome {
        let mut state = self.state.lock()
            .expect("throttler lock should not be poisoned");
        if let Some(record) = state.failures.get(domain) {
            if record.count >= self.limits.failure_threshold {
                if let Some(last_failure) = record.last_failure {
                    let backoff_ms = self.backoff_ms(record.count);
                    let elapsed_ms = last_failure.elapsed().as_millis() as u64;
                    if elapsed_ms < backoff_ms {
                        return AcquireOutcome::Backoff {
                            remaining_ms: backoff_ms - elapsed_ms,
                        };
                    };
                };
            };
        };
        let slots = state.concurrent.entry(domain.to_string()).or_insert(0);
        if *slots >= self.limits.max_concurrent_per_domain {
            return AcquireOutcome::Throttled;
        };
        *slots += 1;
        AcquireOutcome::Acquired
    }

    pub fn release(&self, domain: &str, success: bool) {
        let mut state = self.state.lock()
            .expect("throttler lock should not be poisoned");
        if let Some(slots) = state.concurrent.get_mut(domain) {
            *slots = slots.saturating_sub(1);
            if *slots == 0 {
                state.concurrent.remove(domain);
            };
        };
        let record = state.failures.entry(domain.to_string()).or_default();
        if success {
            record.count = record.count.saturating_sub(1);
            if record.count == 0 {
                state.failures.remove(domain);
            };
        } else {
            record.count += 1;
            record.last_failure = Some(Instant::now());
        };
    }

    /// Acquired slot count for a domain (used by tests and stats)
    pub fn in_flight(&self, domain: &str) -> u32 {
        let state = self.state.lock()
            .expect("throttler lock should not be poisoned");
        state.concurrent.get(domain).copied().unwrap_or(0)
    }
}

/// Releases the slot on drop so every exit path of the delivery
/// worker returns it, including early returns
pub struct DomainSlot {
    throttler: DomainThrottler,
    domain: String,
    success: bool,
    released: bool,
}

impl DomainSlot {
    pub fn new(throttler: DomainThrottler, domain: String) -> Self {
        Self {
            throttler,
            domain,
            success: false,
            released: false,
        }
    }

    pub fn succeed(mut self) {
        self.success = true;
        self.release();
    }

    pub fn fail(mut self) {
        self.success = false;
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.throttler.release(&self.domain, self.success);
        };
    }
}

impl Drop for DomainSlot {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> ThrottlerLimits {
        ThrottlerLimits {
            max_concurrent_per_domain: 2,
            failure_threshold: 5,
            base_backoff_ms: 2_000,
            max_backoff_ms: 120_000,
        }
    }

    #[test]
    fn test_acquire_respects_concurrency_limit() {
        let throttler = DomainThrottler::new(limits());
        assert_eq!(throttler.acquire("peer.example"), AcquireOutcome::Acquired);
        assert_eq!(throttler.acquire("peer.example"), AcquireOutcome::Acquired);
        assert_eq!(throttler.acquire("peer.example"), AcquireOutcome::Throttled);
        // Other domains are unaffected
        assert_eq!(throttler.acquire("other.example"), AcquireOutcome::Acquired);
        assert_eq!(throttler.in_flight("peer.example"), 2);

        throttler.release("peer.example", true);
        assert_eq!(throttler.acquire("peer.example"), AcquireOutcome::Acquired);
    }

    #[test]
    fn test_backoff_after_failures() {
        let throttler = DomainThrottler::new(limits());
        for _ in 0..5 {
            assert_eq!(
                throttler.acquire("dead.example"),
                AcquireOutcome::Acquired,
            );
            throttler.release("dead.example", false);
        };
        let outcome = throttler.acquire("dead.example");
        assert!(matches!(outcome, AcquireOutcome::Backoff { .. }));
    }

    #[test]
    fn test_success_decrements_failure_count() {
        let throttler = DomainThrottler::new(limits());
        for _ in 0..4 {
            throttler.acquire("flaky.example");
            throttler.release("flaky.example", false);
        };
        // One success keeps the domain below the threshold
        throttler.acquire("flaky.example");
        throttler.release("flaky.example", true);
        assert_eq!(
            throttler.acquire("flaky.example"),
            AcquireOutcome::Acquired,
        );
    }

    #[test]
    fn test_backoff_ms_monotonic() {
        let throttler = DomainThrottler::new(limits());
        assert_eq!(throttler.backoff_ms(5), 2_000);
        assert_eq!(throttler.backoff_ms(6), 4_000);
        assert_eq!(throttler.backoff_ms(7), 8_000);
        // Capped
        assert_eq!(throttler.backoff_ms(30), 120_000);
    }

    #[test]
    fn test_domain_slot_releases_on_drop() {
        let throttler = DomainThrottler::new(limits());
        throttler.acquire("peer.example");
        {
            let _slot = DomainSlot::new(
                throttler.clone(),
                "peer.example".to_string(),
            );
            // Dropped without an explicit outcome (e.g. on an error path)
        };
        assert_eq!(throttler.in_flight("peer.example"), 0);
    }
}
