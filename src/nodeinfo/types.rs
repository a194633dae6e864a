// https://nodeinfo.diaspora.software/protocol.html
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use aviary_config::{Config, SOFTWARE_NAME, SOFTWARE_VERSION};

#[derive(Serialize)]
pub struct NodeInfoLink {
    rel: String,
    href: String,
}

#[derive(Serialize)]
pub struct NodeInfoDiscovery {
    links: Vec<NodeInfoLink>,
}

impl NodeInfoDiscovery {
    pub fn new(instance_url: &str) -> Self {
        let link = NodeInfoLink {
            rel: "http://nodeinfo.diaspora.software/ns/schema/2.1".to_string(),
            href: format!("{}/nodeinfo/2.1", instance_url),
        };
        Self { links: vec![link] }
    }
}

#[derive(Serialize)]
struct Software {
    name: String,
    version: String,
}

#[derive(Serialize)]
struct Services {
    inbound: Vec<String>,
    outbound: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo21 {
    version: String,
    software: Software,
    protocols: Vec<String>,
    services: Services,
    open_registrations: bool,
    metadata: JsonValue,
}

impl NodeInfo21 {
    pub fn new(config: &Config) -> Self {
        let mut metadata = json!({
            "nodeName": config.instance_title
                .clone()
                .unwrap_or(config.instance_domain()),
        });
        if config.mrf.transparency {
            let policies: Vec<String> = config.mrf.policies.iter()
                .map(|policy| format!("{:?}", policy))
                .collect();
            metadata["federation"] = json!({"mrf_policies": policies});
        };
        Self {
            version: "2.1".to_string(),
            software: Software {
                name: SOFTWARE_NAME.to_lowercase(),
                version: SOFTWARE_VERSION.to_string(),
            },
            protocols: vec!["activitypub".to_string()],
            services: Services { inbound: vec![], outbound: vec![] },
            open_registrations: false,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodeinfo_discovery() {
        let discovery = NodeInfoDiscovery::new("https://social.example");
        let value = serde_json::to_value(discovery).unwrap();
        assert_eq!(
            value["links"][0]["href"],
            "https://social.example/nodeinfo/2.1",
        );
    }
}
