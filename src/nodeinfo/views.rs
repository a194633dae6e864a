use actix_web::{get, web, HttpResponse};

use aviary_config::Config;

use crate::errors::HttpError;

use super::types::{NodeInfo21, NodeInfoDiscovery};

#[get("/.well-known/nodeinfo")]
pub async fn nodeinfo_discovery_view(
    config: web::Data<Config>,
) -> Result<HttpResponse, HttpError> {
    let discovery = NodeInfoDiscovery::new(&config.instance_url());
    let response = HttpResponse::Ok().json(discovery);
    Ok(response)
}

#[get("/nodeinfo/2.1")]
pub async fn nodeinfo_view(
    config: web::Data<Config>,
) -> Result<HttpResponse, HttpError> {
    let nodeinfo = NodeInfo21::new(&config);
    let response = HttpResponse::Ok().json(nodeinfo);
    Ok(response)
}
