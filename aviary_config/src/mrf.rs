use serde::Deserialize;

/// User-configurable MRF policies, applied in listed order.
/// The normalization policy is not listed here: it always runs last.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub enum MrfPolicyName {
    #[serde(rename = "simple")]
    Simple,
    #[serde(rename = "keyword")]
    Keyword,
    #[serde(rename = "media")]
    Media,
}

fn default_policies() -> Vec<MrfPolicyName> {
    vec![MrfPolicyName::Simple]
}

#[derive(Clone, Deserialize)]
pub struct MrfConfig {
    #[serde(default = "default_policies")]
    pub policies: Vec<MrfPolicyName>,

    /// Expose the policy list in NodeInfo metadata
    #[serde(default)]
    pub transparency: bool,

    /// Keywords rejected by the keyword policy
    #[serde(default)]
    pub keywords_reject: Vec<String>,
}

impl Default for MrfConfig {
    fn default() -> Self {
        Self {
            policies: default_policies(),
            transparency: false,
            keywords_reject: vec![],
        }
    }
}
