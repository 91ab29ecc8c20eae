use super::{ConnectorRow, ConnectorStatus, DbPool};
use crate::utils::error::WorkerError;

/// C6: the connector status state machine (spec §4.6). The worker only
/// ever drives the four transitions below; `Disabled`/`UnableToProcess` are
/// the control plane's to set and must survive an untouched read here.
pub struct ConnectorTracker {
    pool: DbPool,
}

impl ConnectorTracker {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> Result<Option<ConnectorRow>, WorkerError> {
        let row = sqlx::query_as::<_, ConnectorRow>(
            r#"SELECT id, name, connector_type, connector_specific_config, refresh_freq,
                      user_id, tenant_id, status, last_successful_index_date,
                      total_docs_indexed, creation_date, last_update, deleted_date
               FROM connectors WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(self.pool.get_pool())
        .await?;

        Ok(row)
    }

    /// On job start, after the document row is confirmed to exist (spec
    /// §4.6, §4.7 step 3).
    pub async fn start_processing(&self, connector_id: i64) -> Result<(), WorkerError> {
        sqlx::query(
            r#"UPDATE connectors SET status = $2, last_update = now() WHERE id = $1"#,
        )
        .bind(connector_id)
        .bind(ConnectorStatus::Processing)
        .execute(self.pool.get_pool())
        .await?;

        Ok(())
    }

    /// On job success (spec §4.6): `total_docs_indexed` is the number of
    /// chunks inserted into the vector store, per spec §9's Open Question
    /// resolution — never the extracted-item count.
    pub async fn complete_successfully(
        &self,
        connector_id: i64,
        entities_inserted: i64,
    ) -> Result<(), WorkerError> {
        sqlx::query(
            r#"UPDATE connectors
               SET status = $3,
                   last_successful_index_date = now(),
                   total_docs_indexed = $2,
                   last_update = now()
               WHERE id = $1"#,
        )
        .bind(connector_id)
        .bind(entities_inserted)
        .bind(ConnectorStatus::CompletedSuccessfully)
        .execute(self.pool.get_pool())
        .await?;

        Ok(())
    }

    /// On job exception or deadline overrun (spec §4.6).
    pub async fn complete_with_errors(&self, connector_id: i64) -> Result<(), WorkerError> {
        sqlx::query(
            r#"UPDATE connectors SET status = $2, last_update = now()
               WHERE id = $1"#,
        )
        .bind(connector_id)
        .bind(ConnectorStatus::CompletedWithErrors)
        .execute(self.pool.get_pool())
        .await?;

        Ok(())
    }
}
