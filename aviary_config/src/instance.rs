use aviary_core::{
    crypto_rsa::RsaSecretKey,
    urls::{get_hostname, parse_http_url},
};

use super::{
    config::Config,
    federation::FederationConfig,
    SOFTWARE_NAME,
    SOFTWARE_VERSION,
};

#[derive(Clone)]
pub struct Instance {
    url: String,
    hostname: String,
    pub federation: FederationConfig,
    pub rsa_secret_key: RsaSecretKey,
}

impl Instance {
    pub(crate) fn from_config(config: &Config) -> Self {
        parse_http_url(&config.instance_url)
            .expect("instance URL should be already validated");
        Self {
            url: config.instance_url.trim_end_matches('/').to_string(),
            hostname: get_hostname(&config.instance_url)
                .expect("instance URL should be already validated"),
            federation: config.federation.clone(),
            rsa_secret_key: config.instance_rsa_key.clone()
                .expect("instance RSA key should be already generated"),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns instance host name (without port number)
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn agent(&self) -> String {
        format!(
            "{name} {version}; {instance_url}",
            name=SOFTWARE_NAME,
            version=SOFTWARE_VERSION,
            instance_url=self.url,
        )
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Instance {
    pub fn for_test(url: &str) -> Self {
        use aviary_core::crypto_rsa::generate_weak_rsa_key;
        Self {
            url: url.trim_end_matches('/').to_string(),
            hostname: get_hostname(url).unwrap(),
            federation: FederationConfig {
                enabled: false,
                ..Default::default()
            },
            rsa_secret_key: generate_weak_rsa_key().unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_url_https_dns() {
        let instance = Instance::for_test("https://social.example/");

        assert_eq!(instance.url(), "https://social.example");
        assert_eq!(instance.hostname(), "social.example");
        assert_eq!(
            instance.agent(),
            format!("Aviary {}; https://social.example", SOFTWARE_VERSION),
        );
        // Test instance is private
        assert!(!instance.federation.enabled);
    }

    #[test]
    fn test_instance_url_http_ipv4_with_port() {
        let instance = Instance::for_test("http://1.2.3.4:3777/");

        assert_eq!(instance.url(), "http://1.2.3.4:3777");
        assert_eq!(instance.hostname(), "1.2.3.4");
    }
}
