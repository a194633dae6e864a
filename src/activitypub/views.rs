use actix_web::{
    dev::ConnectionInfo,
    get,
    post,
    web,
    HttpRequest,
    HttpResponse,
};
use serde_json::{Value as JsonValue};

use aviary_activitypub::{
    builders::actor_document::{
        build_actor_document,
        build_instance_actor_document,
    },
    identifiers::{
        local_actor_id,
        local_actor_key_id,
        local_community_id,
        local_instance_actor_id,
    },
    keys::ensure_local_actor_key,
    state::FederationState,
};
use aviary_config::Config;
use aviary_core::{
    crypto_rsa::{rsa_public_key_to_pkcs8_pem, RsaPublicKey},
    http_digest::ContentDigest,
};
use aviary_fetch::constants::AP_MEDIA_TYPE;
use aviary_models::{
    actors::queries::get_local_actor_by_username,
    actors::types::ActorType,
    database::{get_database_client, DatabaseConnectionPool},
};

use crate::errors::HttpError;

use super::receiver::receive_activity;

fn parse_activity(request_body: &web::Bytes) -> Result<JsonValue, HttpError> {
    let activity: JsonValue = serde_json::from_slice(request_body)
        .map_err(|_| HttpError::ValidationError("invalid activity".to_string()))?;
    Ok(activity)
}

async fn handle_inbox_request(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    state: &FederationState,
    connection_info: &ConnectionInfo,
    request: &HttpRequest,
    request_body: web::Bytes,
    recipient: Option<&str>,
) -> Result<HttpResponse, HttpError> {
    if !config.federation.enabled {
        return Err(HttpError::PermissionError);
    };
    let activity = parse_activity(&request_body)?;
    let activity_type = activity["type"].as_str().unwrap_or("Unknown");
    log::info!("received in {}: {}", request.uri().path(), activity_type);
    log::debug!("activity: {}", activity);

    let activity_digest = ContentDigest::new(&request_body);
    drop(request_body);

    let client_ip = connection_info.realip_remote_addr().unwrap_or("unknown");
    let outcome = receive_activity(
        config,
        db_pool,
        state,
        request,
        &activity,
        activity_digest,
        client_ip,
        recipient,
    ).await
        .map_err(|error| {
            log::warn!(
                "failed to accept activity ({}): {}",
                error,
                activity,
            );
            HttpError::from(error)
        })?;
    log::debug!("inbox outcome: {:?}", outcome);
    Ok(HttpResponse::Accepted().finish())
}

#[post("/inbox")]
async fn shared_inbox(
    config: web::Data<Config>,
    db_pool: web::Data<DatabaseConnectionPool>,
    state: web::Data<FederationState>,
    connection_info: ConnectionInfo,
    request: HttpRequest,
    request_body: web::Bytes,
) -> Result<HttpResponse, HttpError> {
    handle_inbox_request(
        &config,
        &db_pool,
        &state,
        &connection_info,
        &request,
        request_body,
        None,
    ).await
}

#[post("/users/{username}/inbox")]
async fn actor_inbox(
    config: web::Data<Config>,
    db_pool: web::Data<DatabaseConnectionPool>,
    state: web::Data<FederationState>,
    connection_info: ConnectionInfo,
    request: HttpRequest,
    username: web::Path<String>,
    request_body: web::Bytes,
) -> Result<HttpResponse, HttpError> {
    // The addressed actor must exist
    {
        let db_client_guard = get_database_client(&db_pool).await?;
        let db_client = &**db_client_guard;
        get_local_actor_by_username(db_client, &username).await?;
    };
    handle_inbox_request(
        &config,
        &db_pool,
        &state,
        &connection_info,
        &request,
        request_body,
        Some(&username),
    ).await
}

async fn actor_document_response(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
    username: &str,
    expected_type: Option<ActorType>,
) -> Result<HttpResponse, HttpError> {
    let db_client_guard = get_database_client(db_pool).await?;
    let db_client = &**db_client_guard;
    let actor = get_local_actor_by_username(db_client, username).await?;
    if let Some(expected_type) = expected_type {
        if actor.actor_type != expected_type {
            return Err(HttpError::NotFoundError("actor"));
        };
    };
    let instance_url = config.instance_url();
    let actor_id = if actor.actor_type == ActorType::Group {
        local_community_id(&instance_url, &actor.username)
    } else {
        local_actor_id(&instance_url, &actor.username)
    };
    let key_id = local_actor_key_id(&actor_id);
    let secret_key = ensure_local_actor_key(db_client, &actor, &key_id).await
        .map_err(|error| HttpError::InternalError(error.to_string()))?;
    let public_key_pem =
        rsa_public_key_to_pkcs8_pem(&RsaPublicKey::from(&secret_key))
            .map_err(|error| HttpError::InternalError(error.to_string()))?;
    let document = build_actor_document(
        &instance_url,
        &actor_id,
        &actor,
        &public_key_pem,
    );
    let response = HttpResponse::Ok()
        .content_type(AP_MEDIA_TYPE)
        .json(document);
    Ok(response)
}

// Serves the actor used for signed fetches and relay operations
#[get("/actor")]
async fn instance_actor_view(
    config: web::Data<Config>,
) -> Result<HttpResponse, HttpError> {
    let instance = config.instance();
    let actor_id = local_instance_actor_id(&config.instance_url());
    let public_key_pem = rsa_public_key_to_pkcs8_pem(
        &RsaPublicKey::from(&instance.rsa_secret_key),
    ).map_err(|error| HttpError::InternalError(error.to_string()))?;
    let document = build_instance_actor_document(
        &config.instance_url(),
        &actor_id,
        instance.hostname(),
        &public_key_pem,
    );
    let response = HttpResponse::Ok()
        .content_type(AP_MEDIA_TYPE)
        .json(document);
    Ok(response)
}

#[get("/users/{username}")]
async fn actor_view(
    config: web::Data<Config>,
    db_pool: web::Data<DatabaseConnectionPool>,
    username: web::Path<String>,
) -> Result<HttpResponse, HttpError> {
    actor_document_response(&config, &db_pool, &username, None).await
}

#[get("/c/{slug}")]
async fn community_view(
    config: web::Data<Config>,
    db_pool: web::Data<DatabaseConnectionPool>,
    slug: web::Path<String>,
) -> Result<HttpResponse, HttpError> {
    actor_document_response(
        &config,
        &db_pool,
        &slug,
        Some(ActorType::Group),
    ).await
}

pub fn activitypub_services() -> actix_web::Scope {
    web::scope("")
        .service(shared_inbox)
        .service(actor_inbox)
        .service(instance_actor_view)
        .service(actor_view)
        .service(community_view)
}
