mod activitypub;
mod errors;
mod logger;
mod nodeinfo;
mod server;
mod webfinger;

use aviary_activitypub::{inbox_queue::start_flusher, state::FederationState};
use aviary_config::parse_config;
use aviary_models::database::{
    connect::create_pool,
    get_database_client,
    migrate::apply_migrations,
};
use aviary_workers::workers::start_workers;

use logger::configure_logger;
use server::run_server;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let (config, config_path) = parse_config()
        .unwrap_or_else(|error| panic!("configuration error: {}", error));
    configure_logger(config.log_level);
    log::info!("config loaded from {}", config_path);

    let db_pool = create_pool(
        &config.database_url,
        config.database_connection_pool_size,
    );
    {
        let mut db_client = get_database_client(&db_pool).await
            .expect("failed to connect to database");
        apply_migrations(&mut db_client).await
            .expect("failed to apply migrations");
    };

    let state = FederationState::new(&config);
    start_flusher(state.inbox_queue.clone(), db_pool.clone());
    start_workers(config.clone(), db_pool.clone(), state.clone());

    run_server(config, db_pool, state).await
}
