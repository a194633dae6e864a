use chrono::{DateTime, Utc};
use serde_json::{Value as JsonValue};
use uuid::Uuid;

use crate::database::{
    int_enum::{int_enum_from_sql, int_enum_to_sql},
    DatabaseTypeError,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActorType {
    Person,
    Group,
    Organization,
    Service,
    Application,
}

impl ActorType {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let actor_type = match keyword {
            "Person" => Self::Person,
            "Group" => Self::Group,
            "Organization" => Self::Organization,
            "Service" => Self::Service,
            "Application" => Self::Application,
            _ => return None,
        };
        Some(actor_type)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::Group => "Group",
            Self::Organization => "Organization",
            Self::Service => "Service",
            Self::Application => "Application",
        }
    }
}

impl From<ActorType> for i16 {
    fn from(value: ActorType) -> i16 {
        match value {
            ActorType::Person => 1,
            ActorType::Group => 2,
            ActorType::Organization => 3,
            ActorType::Service => 4,
            ActorType::Application => 5,
        }
    }
}

impl TryFrom<i16> for ActorType {
    type Error = DatabaseTypeError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        let actor_type = match value {
            1 => Self::Person,
            2 => Self::Group,
            3 => Self::Organization,
            4 => Self::Service,
            5 => Self::Application,
            _ => return Err(DatabaseTypeError),
        };
        Ok(actor_type)
    }
}

int_enum_from_sql!(ActorType);
int_enum_to_sql!(ActorType);

#[derive(Clone)]
pub struct DbActor {
    pub id: Uuid,
    pub uri: String,
    pub username: String,
    pub domain: String,
    pub actor_type: ActorType,
    pub inbox_url: String,
    pub shared_inbox_url: Option<String>,
    pub outbox_url: Option<String>,
    pub followers_url: Option<String>,
    pub public_key_pem: Option<String>,
    pub manually_approves_followers: bool,
    pub is_local: bool,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub metadata: JsonValue,
    pub created_at: DateTime<Utc>,
}

impl DbActor {
    pub(crate) fn try_from_row(
        row: &tokio_postgres::Row,
    ) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            uri: row.try_get("uri")?,
            username: row.try_get("username")?,
            domain: row.try_get("domain")?,
            actor_type: row.try_get("actor_type")?,
            inbox_url: row.try_get("inbox_url")?,
            shared_inbox_url: row.try_get("shared_inbox_url")?,
            outbox_url: row.try_get("outbox_url")?,
            followers_url: row.try_get("followers_url")?,
            public_key_pem: row.try_get("public_key_pem")?,
            manually_approves_followers:
                row.try_get("manually_approves_followers")?,
            is_local: row.try_get("is_local")?,
            last_fetched_at: row.try_get("last_fetched_at")?,
            metadata: row.try_get("metadata")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Field set accepted by actor create/update queries
pub struct ActorData {
    pub uri: String,
    pub username: String,
    pub domain: String,
    pub actor_type: ActorType,
    pub inbox_url: String,
    pub shared_inbox_url: Option<String>,
    pub outbox_url: Option<String>,
    pub followers_url: Option<String>,
    pub public_key_pem: Option<String>,
    pub manually_approves_followers: bool,
    pub is_local: bool,
    pub metadata: JsonValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_type_from_keyword() {
        assert_eq!(ActorType::from_keyword("Person"), Some(ActorType::Person));
        assert_eq!(ActorType::from_keyword("Group"), Some(ActorType::Group));
        assert_eq!(ActorType::from_keyword("Note"), None);
    }

    #[test]
    fn test_actor_type_int_round_trip() {
        for actor_type in [
            ActorType::Person,
            ActorType::Group,
            ActorType::Organization,
            ActorType::Service,
            ActorType::Application,
        ] {
            let int_value = i16::from(actor_type);
            assert_eq!(ActorType::try_from(int_value).unwrap(), actor_type);
        };
    }
}
