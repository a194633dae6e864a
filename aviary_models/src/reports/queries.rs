use uuid::Uuid;

use crate::database::{DatabaseClient, DatabaseError};

use super::types::DbReport;

pub async fn create_report(
    db_client: &impl DatabaseClient,
    reporter_actor_uri: &str,
    target_actor_id: Option<Uuid>,
    message_ids: &[Uuid],
    content: &str,
) -> Result<DbReport, DatabaseError> {
    let report_id = Uuid::new_v4();
    let row = db_client.query_one(
        "
        INSERT INTO report (
            id,
            reporter_actor_uri,
            target_actor_id,
            message_ids,
            content
        )
        VALUES ($1, $2, $3, $4, $5)
        RETURNING report.*
        ",
        &[
            &report_id,
            &reporter_actor_uri,
            &target_actor_id,
            &message_ids,
            &content,
        ],
    ).await?;
    let report = DbReport::try_from_row(&row)?;
    Ok(report)
}
