//! Mention extraction and resolution
use regex::Regex;
use serde::Serialize;

use aviary_fetch::{
    agent::FederationAgent,
    fetch::ObjectCache,
    webfinger::resolve_actor_id,
};

use crate::vocabulary::MENTION;

const MENTION_RE: &str =
    r"@(?P<username>[A-Za-z0-9_.]+)@(?P<domain>[A-Za-z0-9.-]+\.[A-Za-z]{2,})";

#[derive(Clone, Serialize)]
pub struct Mention {
    #[serde(rename = "type")]
    pub tag_type: String,
    pub href: String,
    pub name: String,
}

/// Returns `(username, domain)` pairs mentioned in a text
pub fn extract_mentions(text: &str) -> Vec<(String, String)> {
    let mention_re = Regex::new(MENTION_RE).expect("regexp should be valid");
    let mut mentions = vec![];
    for caps in mention_re.captures_iter(text) {
        let pair = (caps["username"].to_string(), caps["domain"].to_string());
        if !mentions.contains(&pair) {
            mentions.push(pair);
        };
    };
    mentions
}

/// Resolves mentioned handles through WebFinger.
/// Handles that fail to resolve are skipped.
pub async fn resolve_mentions(
    agent: &FederationAgent,
    cache: &ObjectCache,
    text: &str,
) -> Vec<Mention> {
    let mut resolved = vec![];
    for (username, domain) in extract_mentions(text) {
        match resolve_actor_id(agent, cache, &username, &domain).await {
            Ok(actor_id) => {
                resolved.push(Mention {
                    tag_type: MENTION.to_string(),
                    href: actor_id,
                    name: format!("@{}@{}", username, domain),
                });
            },
            Err(error) => {
                log::warn!(
                    "failed to resolve mention @{}@{}: {}",
                    username,
                    domain,
                    error,
                );
            },
        };
    };
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_mentions() {
        let text = "hello @alice@remote.example and @bob@peer.example!";
        let mentions = extract_mentions(text);
        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[0].0, "alice");
        assert_eq!(mentions[0].1, "remote.example");
        assert_eq!(mentions[1].0, "bob");
        assert_eq!(mentions[1].1, "peer.example");
    }

    #[test]
    fn test_extract_mentions_dedup() {
        let text = "@alice@remote.example @alice@remote.example";
        let mentions = extract_mentions(text);
        assert_eq!(mentions.len(), 1);
    }

    #[test]
    fn test_extract_mentions_none() {
        let text = "no mentions here, not even an email@ sign";
        let mentions = extract_mentions(text);
        assert_eq!(mentions.len(), 0);
    }
}
