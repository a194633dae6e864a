//! Message Rewrite Facility: a chain of policies that may reject
//! or rewrite incoming activities
mod normalize;
mod simple;

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::{Value as JsonValue};
use wildmatch::WildMatch;

use aviary_config::{Config, MrfPolicyName};
use aviary_models::{
    database::{DatabaseClient, DatabaseError},
    instances::queries::get_instances_with_policies,
    instances::types::DbInstance,
};

use super::vocabulary::{BLOCK, DELETE, UNDO};

pub use simple::InstancePolicies;

/// Outcome of the policy chain
#[derive(Debug)]
pub enum MrfOutcome {
    Accept(JsonValue),
    Reject(String),
}

type PolicyResult = Result<JsonValue, String>;

/// Matches a stored domain pattern against a hostname.
/// `*.example.com` matches `sub.example.com` but not `example.com`.
pub fn domain_matches(pattern: &str, hostname: &str) -> bool {
    if pattern == hostname {
        return true;
    };
    if pattern.starts_with("*.") {
        return WildMatch::new(pattern).matches(hostname);
    };
    false
}

pub struct FederationFilter {
    policies: Vec<MrfPolicyName>,
    keywords_reject: Vec<String>,
    instances: Vec<DbInstance>,
}

impl FederationFilter {
    pub async fn init(
        config: &Config,
        db_client: &impl DatabaseClient,
    ) -> Result<Self, DatabaseError> {
        let instances = get_instances_with_policies(db_client).await?;
        Ok(Self {
            policies: config.mrf.policies.clone(),
            keywords_reject: config.mrf.keywords_reject.clone(),
            instances,
        })
    }

    #[cfg(test)]
    pub(crate) fn for_test(
        policies: Vec<MrfPolicyName>,
        instances: Vec<DbInstance>,
    ) -> Self {
        Self { policies, keywords_reject: vec![], instances }
    }

    /// Collects policy flags from all records matching the hostname
    fn instance_policies(&self, hostname: &str) -> InstancePolicies {
        let matching = self.instances.iter()
            .filter(|instance| domain_matches(&instance.domain, hostname));
        InstancePolicies::merge(matching)
    }

    fn run_policy(
        &self,
        policy: MrfPolicyName,
        activity: JsonValue,
        actor_hostname: &str,
    ) -> PolicyResult {
        let applied = catch_unwind(AssertUnwindSafe(|| {
            match policy {
                MrfPolicyName::Simple => {
                    let policies = self.instance_policies(actor_hostname);
                    simple::apply(&policies, activity.clone())
                },
                MrfPolicyName::Keyword => {
                    apply_keyword_policy(&self.keywords_reject, activity.clone())
                },
                MrfPolicyName::Media => {
                    Ok(simple::strip_media(activity.clone()))
                },
            }
        }));
        match applied {
            Ok(result) => result,
            Err(_) => {
                // A faulty policy must not poison the pipeline
                log::error!("MRF policy {:?} panicked", policy);
                Ok(activity)
            },
        }
    }

    /// Applies the policy chain to an activity.
    /// Undo, Block and Delete bypass every user-configured policy
    /// other than the instance policy, so state-removing activities
    /// keep flowing even on heavily filtered instances.
    pub fn apply(
        &self,
        activity: JsonValue,
        actor_hostname: &str,
    ) -> MrfOutcome {
        let activity_type = activity["type"].as_str().unwrap_or_default();
        let is_state_removal = matches!(activity_type, UNDO | BLOCK | DELETE);
        let mut current = activity;
        for policy in &self.policies {
            if is_state_removal && *policy != MrfPolicyName::Simple {
                continue;
            };
            match self.run_policy(*policy, current, actor_hostname) {
                Ok(rewritten) => current = rewritten,
                Err(reason) => return MrfOutcome::Reject(reason),
            };
        };
        let normalized = normalize::apply(current);
        MrfOutcome::Accept(normalized)
    }
}

fn apply_keyword_policy(
    keywords: &[String],
    activity: JsonValue,
) -> PolicyResult {
    let content = activity["object"]["content"].as_str()
        .or(activity["object"]["summary"].as_str())
        .unwrap_or_default()
        .to_lowercase();
    for keyword in keywords {
        if content.contains(&keyword.to_lowercase()) {
            return Err(format!("keyword match: {}", keyword));
        };
    };
    Ok(activity)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;
    use super::*;

    fn blocked_instance(domain: &str) -> DbInstance {
        DbInstance {
            id: Uuid::new_v4(),
            domain: domain.to_string(),
            blocked: true,
            silenced: false,
            media_removal: false,
            media_nsfw: false,
            federated_timeline_removal: false,
            followers_only: false,
            report_removal: false,
            avatar_removal: false,
            banner_removal: false,
            reject_deletes: false,
            unreachable_since: None,
            failure_count: 0,
            nodeinfo: None,
            policy_applied_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_apply_chain_blocked_domain() {
        let filter = FederationFilter::for_test(
            vec![aviary_config::MrfPolicyName::Simple],
            vec![blocked_instance("bad.example")],
        );
        let activity = json!({
            "id": "https://bad.example/activities/1",
            "type": "Create",
            "actor": "https://bad.example/users/evil",
            "object": {"type": "Note", "content": "hello"},
        });
        match filter.apply(activity.clone(), "bad.example") {
            MrfOutcome::Reject(reason) => assert_eq!(reason, "blocked domain"),
            MrfOutcome::Accept(_) => panic!("activity should be rejected"),
        };
        // Unrelated domains pass
        match filter.apply(activity, "good.example") {
            MrfOutcome::Accept(_) => (),
            MrfOutcome::Reject(_) => panic!("activity should be accepted"),
        };
    }

    #[test]
    fn test_apply_chain_wildcard_record() {
        let filter = FederationFilter::for_test(
            vec![aviary_config::MrfPolicyName::Simple],
            vec![blocked_instance("*.bad.example")],
        );
        let activity = json!({
            "id": "https://sub.bad.example/activities/1",
            "type": "Like",
            "actor": "https://sub.bad.example/users/evil",
            "object": "https://social.example/objects/1",
        });
        match filter.apply(activity.clone(), "sub.bad.example") {
            MrfOutcome::Reject(_) => (),
            MrfOutcome::Accept(_) => panic!("subdomain should be blocked"),
        };
        // The bare parent domain does not match the wildcard
        match filter.apply(activity, "bad.example") {
            MrfOutcome::Accept(_) => (),
            MrfOutcome::Reject(_) => panic!("parent domain should pass"),
        };
    }

    #[test]
    fn test_apply_normalizes_audience() {
        let filter = FederationFilter::for_test(vec![], vec![]);
        let activity = json!({
            "id": "https://remote.example/activities/1",
            "type": "Create",
            "actor": "https://remote.example/users/alice",
            "to": "https://www.w3.org/ns/activitystreams#Public",
            "object": {"type": "Note", "content": "hello"},
        });
        match filter.apply(activity, "remote.example") {
            MrfOutcome::Accept(normalized) => {
                assert_eq!(normalized["to"].is_array(), true);
            },
            MrfOutcome::Reject(_) => panic!("activity should be accepted"),
        };
    }

    #[test]
    fn test_domain_matches() {
        assert_eq!(domain_matches("bad.example", "bad.example"), true);
        assert_eq!(domain_matches("bad.example", "sub.bad.example"), false);
        assert_eq!(domain_matches("*.bad.example", "sub.bad.example"), true);
        assert_eq!(domain_matches("*.bad.example", "bad.example"), false);
        assert_eq!(domain_matches("*.bad.example", "other.example"), false);
    }

    #[test]
    fn test_apply_keyword_policy() {
        let keywords = vec!["spamword".to_string()];
        let activity = json!({
            "type": "Create",
            "object": {"content": "<p>Just a post</p>"},
        });
        let result = apply_keyword_policy(&keywords, activity);
        assert_eq!(result.is_ok(), true);

        let activity = json!({
            "type": "Create",
            "object": {"content": "<p>buy SPAMWORD now</p>"},
        });
        let result = apply_keyword_policy(&keywords, activity);
        assert_eq!(result.is_err(), true);
    }
}
