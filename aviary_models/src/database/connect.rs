use deadpool_postgres::Pool;

pub fn create_pool(
    database_url: &str,
    pool_size: usize,
) -> Pool {
    let database_config = database_url.parse()
        .expect("invalid database URL");
    let manager = deadpool_postgres::Manager::new(
        database_config,
        tokio_postgres::NoTls,
    );
    Pool::builder(manager)
        .max_size(pool_size)
        .build()
        .expect("failed to build connection pool")
}
