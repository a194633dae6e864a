use log::Level as LogLevel;
use serde::Deserialize;

use aviary_core::crypto_rsa::RsaSecretKey;

use super::{
    federation::FederationConfig,
    instance::Instance,
    limits::Limits,
    mrf::MrfConfig,
    ConfigError,
};

fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_http_host() -> String { "127.0.0.1".to_string() }
fn default_http_port() -> u32 { 8370 }
fn default_db_pool_size() -> usize { 10 }

#[derive(Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    #[serde(default = "default_db_pool_size")]
    pub database_connection_pool_size: usize,

    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    #[serde(default = "default_http_host")]
    pub http_host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u32,

    /// Absolute base URL used in all generated identifiers
    pub instance_url: String,
    pub instance_title: Option<String>,

    /// Path to the instance RSA signing key (PKCS#1 PEM).
    /// The key is generated on first start if the file does not exist.
    pub instance_rsa_key_path: Option<String>,
    #[serde(skip)]
    pub instance_rsa_key: Option<RsaSecretKey>,

    #[serde(default)]
    pub federation: FederationConfig,

    #[serde(default)]
    pub mrf: MrfConfig,

    #[serde(default)]
    pub limits: Limits,
}

impl Config {
    pub fn instance(&self) -> Instance {
        Instance::from_config(self)
    }

    pub fn instance_url(&self) -> String {
        self.instance_url.trim_end_matches('/').to_string()
    }

    /// Bare host used for matching and WebFinger
    pub fn instance_domain(&self) -> String {
        aviary_core::urls::get_hostname(&self.instance_url)
            .expect("instance URL should be already validated")
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        aviary_core::urls::parse_http_url(&self.instance_url)
            .map_err(|_| ConfigError("invalid instance URL"))?;
        if self.database_url.is_empty() {
            return Err(ConfigError("database URL is not specified"));
        };
        Ok(())
    }
}
