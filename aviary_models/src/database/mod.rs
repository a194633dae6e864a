pub mod connect;
pub mod errors;
pub mod int_enum;
pub mod migrate;

pub type DatabaseConnectionPool = deadpool_postgres::Pool;

pub trait DatabaseClient: tokio_postgres::GenericClient + Sync {}
impl<T: tokio_postgres::GenericClient + Sync> DatabaseClient for T {}

pub use errors::{
    catch_unique_violation,
    DatabaseError,
    DatabaseTypeError,
};

pub async fn get_database_client(
    db_pool: &DatabaseConnectionPool,
) -> Result<deadpool_postgres::Client, DatabaseError> {
    // Returns wrapped client
    // https://github.com/bikeshedder/deadpool/issues/56
    let client = db_pool.get().await?;
    Ok(client)
}
