pub mod agent;
pub mod authentication;
pub mod builders;
pub mod content;
pub mod contexts;
pub mod deliverer;
pub mod deserialization;
pub mod errors;
pub mod handlers;
pub mod identifiers;
pub mod importers;
pub mod inbox_queue;
pub mod keys;
pub mod mrf;
pub mod outbox;
pub mod pipeline;
pub mod publisher;
pub mod queues;
pub mod rate_limiter;
pub mod relay;
pub mod side_effects;
pub mod state;
pub mod throttler;
pub mod vocabulary;
