use actix_web::{
    middleware::Logger as ActixLogger,
    web,
    App,
    HttpServer,
};

use aviary_activitypub::state::FederationState;
use aviary_config::Config;
use aviary_models::database::DatabaseConnectionPool;

use crate::activitypub::views::activitypub_services;
use crate::nodeinfo::views as nodeinfo;
use crate::webfinger::views as webfinger;

pub async fn run_server(
    config: Config,
    db_pool: DatabaseConnectionPool,
    state: FederationState,
) -> std::io::Result<()> {
    let num_workers = std::cmp::max(num_cpus::get(), 4);
    let http_socket_addr = format!("{}:{}", config.http_host, config.http_port);
    log::info!("listening on {}", http_socket_addr);
    let http_server = HttpServer::new(move || {
        App::new()
            .wrap(ActixLogger::new("%r : %s : %{r}a"))
            .app_data(web::PayloadConfig::default().limit(2_000_000))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(state.clone()))
            .service(webfinger::webfinger_view)
            .service(nodeinfo::nodeinfo_discovery_view)
            .service(nodeinfo::nodeinfo_view)
            .service(activitypub_services())
    })
        .workers(num_workers)
        .bind(http_socket_addr)?;
    http_server.run().await
}
