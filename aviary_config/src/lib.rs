mod config;
mod federation;
mod instance;
mod limits;
mod loader;
mod mrf;

pub use config::Config;
pub use federation::FederationConfig;
pub use instance::Instance;
pub use limits::{
    DeliveryLimits,
    InboxQueueLimits,
    Limits,
    RateLimits,
    ThrottlerLimits,
};
pub use loader::parse_config;
pub use mrf::{MrfConfig, MrfPolicyName};

pub const SOFTWARE_NAME: &str = "Aviary";
pub const SOFTWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct ConfigError(pub &'static str);
