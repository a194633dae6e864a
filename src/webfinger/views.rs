// https://webfinger.net/
use actix_web::{get, web, HttpResponse};
use serde::Deserialize;

use aviary_activitypub::identifiers::{local_actor_id, local_community_id};
use aviary_config::Config;
use aviary_fetch::constants::JRD_MEDIA_TYPE;
use aviary_fetch::webfinger::{JsonResourceDescriptor, Link};
use aviary_models::{
    actors::queries::get_local_actor_by_username,
    actors::types::ActorType,
    database::{get_database_client, DatabaseConnectionPool},
};

use crate::errors::HttpError;

#[derive(Deserialize)]
pub struct WebfingerQueryParams {
    pub resource: String,
}

fn parse_acct_uri(resource: &str) -> Result<(String, String), HttpError> {
    let acct = resource.strip_prefix("acct:")
        .ok_or(HttpError::ValidationError(
            "unsupported resource type".to_string(),
        ))?;
    let (username, hostname) = acct.split_once('@')
        .ok_or(HttpError::ValidationError(
            "invalid acct resource".to_string(),
        ))?;
    Ok((username.to_string(), hostname.to_string()))
}

#[get("/.well-known/webfinger")]
pub async fn webfinger_view(
    config: web::Data<Config>,
    db_pool: web::Data<DatabaseConnectionPool>,
    query_params: web::Query<WebfingerQueryParams>,
) -> Result<HttpResponse, HttpError> {
    let (username, hostname) = parse_acct_uri(&query_params.resource)?;
    if hostname != config.instance_domain() {
        // Wrong instance
        return Err(HttpError::NotFoundError("user"));
    };
    let db_client_guard = get_database_client(&db_pool).await?;
    let db_client = &**db_client_guard;
    let actor = get_local_actor_by_username(db_client, &username).await?;
    let actor_id = if actor.actor_type == ActorType::Group {
        local_community_id(&config.instance_url(), &actor.username)
    } else {
        local_actor_id(&config.instance_url(), &actor.username)
    };
    let jrd = JsonResourceDescriptor {
        subject: query_params.resource.clone(),
        links: vec![Link::actor(&actor_id)],
    };
    let response = HttpResponse::Ok()
        .content_type(JRD_MEDIA_TYPE)
        .json(jrd);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_acct_uri() {
        let (username, hostname) =
            parse_acct_uri("acct:bob@social.example").unwrap();
        assert_eq!(username, "bob");
        assert_eq!(hostname, "social.example");
        let result = parse_acct_uri("https://social.example/users/bob");
        assert_eq!(result.is_err(), true);
    }
}
