use refinery::embed_migrations;

use super::errors::DatabaseError;

embed_migrations!("migrations");

pub async fn apply_migrations(
    db_client: &mut tokio_postgres::Client,
) -> Result<(), DatabaseError> {
    let runner = migrations::runner();
    let report = runner.run_async(db_client).await
        .expect("failed to apply migrations");
    for migration in report.applied_migrations() {
        log::info!("applied migration: {}", migration);
    };
    Ok(())
}
