use chrono::{DateTime, Duration, Utc};
use serde_json::{Value as JsonValue};
use uuid::Uuid;

const BACKOFF_BASE_SECONDS: i64 = 60;
const BACKOFF_MAX_SECONDS: i64 = 86_400; // 1 day

#[derive(Clone)]
pub struct DbInstance {
    pub id: Uuid,
    pub domain: String,
    pub blocked: bool,
    pub silenced: bool,
    pub media_removal: bool,
    pub media_nsfw: bool,
    pub federated_timeline_removal: bool,
    pub followers_only: bool,
    pub report_removal: bool,
    pub avatar_removal: bool,
    pub banner_removal: bool,
    pub reject_deletes: bool,
    pub unreachable_since: Option<DateTime<Utc>>,
    pub failure_count: i32,
    pub nodeinfo: Option<JsonValue>,
    pub policy_applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DbInstance {
    pub(crate) fn try_from_row(
        row: &tokio_postgres::Row,
    ) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            domain: row.try_get("domain")?,
            blocked: row.try_get("blocked")?,
            silenced: row.try_get("silenced")?,
            media_removal: row.try_get("media_removal")?,
            media_nsfw: row.try_get("media_nsfw")?,
            federated_timeline_removal:
                row.try_get("federated_timeline_removal")?,
            followers_only: row.try_get("followers_only")?,
            report_removal: row.try_get("report_removal")?,
            avatar_removal: row.try_get("avatar_removal")?,
            banner_removal: row.try_get("banner_removal")?,
            reject_deletes: row.try_get("reject_deletes")?,
            unreachable_since: row.try_get("unreachable_since")?,
            failure_count: row.try_get("failure_count")?,
            nodeinfo: row.try_get("nodeinfo")?,
            policy_applied_at: row.try_get("policy_applied_at")?,
            created_at: row.try_get("created_at")?,
        })
    }

    pub fn has_mrf_policies(&self) -> bool {
        self.blocked ||
            self.silenced ||
            self.media_removal ||
            self.media_nsfw ||
            self.federated_timeline_removal ||
            self.followers_only ||
            self.report_removal ||
            self.avatar_removal ||
            self.banner_removal
    }

    /// An instance is reachable if it never failed, or if it has not been
    /// failing for longer than the reachability timeout.
    pub fn is_reachable(&self, reachability_timeout_days: u32) -> bool {
        match self.unreachable_since {
            Some(unreachable_since) => {
                let timeout =
                    Duration::days(reachability_timeout_days.into());
                unreachable_since + timeout > Utc::now()
            },
            None => true,
        }
    }

    /// `min(60 s * 2^(failure_count - 1), 1 day)`
    pub fn backoff_duration(&self) -> Duration {
        if self.failure_count <= 0 {
            return Duration::zero();
        };
        let exponent = u32::try_from(self.failure_count - 1)
            .unwrap_or(u32::MAX)
            .min(31);
        let seconds = BACKOFF_BASE_SECONDS
            .saturating_mul(2_i64.pow(exponent))
            .min(BACKOFF_MAX_SECONDS);
        Duration::seconds(seconds)
    }

    pub fn should_retry(&self) -> bool {
        match self.unreachable_since {
            Some(unreachable_since) => {
                unreachable_since + self.backoff_duration() <= Utc::now()
            },
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance_with_failures(
        failure_count: i32,
        unreachable_since: Option<DateTime<Utc>>,
    ) -> DbInstance {
        DbInstance {
            id: Uuid::new_v4(),
            domain: "social.example".to_string(),
            blocked: false,
            silenced: false,
            media_removal: false,
            media_nsfw: false,
            federated_timeline_removal: false,
            followers_only: false,
            report_removal: false,
            avatar_removal: false,
            banner_removal: false,
            reject_deletes: false,
            unreachable_since,
            failure_count,
            nodeinfo: None,
            policy_applied_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_backoff_duration() {
        let instance = instance_with_failures(1, None);
        assert_eq!(instance.backoff_duration(), Duration::seconds(60));
        let instance = instance_with_failures(4, None);
        assert_eq!(instance.backoff_duration(), Duration::seconds(480));
        // Capped at one day
        let instance = instance_with_failures(20, None);
        assert_eq!(instance.backoff_duration(), Duration::seconds(86_400));
        // Monotonic up to the cap
        for failure_count in 2..25 {
            let current = instance_with_failures(failure_count, None);
            let previous = instance_with_failures(failure_count - 1, None);
            assert!(current.backoff_duration() >= previous.backoff_duration());
        };
    }

    #[test]
    fn test_is_reachable() {
        let instance = instance_with_failures(0, None);
        assert_eq!(instance.is_reachable(7), true);
        let instance = instance_with_failures(
            3,
            Some(Utc::now() - Duration::days(2)),
        );
        assert_eq!(instance.is_reachable(7), true);
        let instance = instance_with_failures(
            30,
            Some(Utc::now() - Duration::days(8)),
        );
        assert_eq!(instance.is_reachable(7), false);
    }

    #[test]
    fn test_should_retry() {
        let instance = instance_with_failures(0, None);
        assert_eq!(instance.should_retry(), true);
        // Within backoff window
        let instance = instance_with_failures(
            5,
            Some(Utc::now() - Duration::seconds(10)),
        );
        assert_eq!(instance.should_retry(), false);
        // Backoff elapsed
        let instance = instance_with_failures(
            1,
            Some(Utc::now() - Duration::seconds(120)),
        );
        assert_eq!(instance.should_retry(), true);
    }
}
