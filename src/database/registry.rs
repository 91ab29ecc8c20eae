use uuid::Uuid;

use super::{DbPool, DocumentRow};
use crate::utils::error::WorkerError;

/// C5: the relational document registry. Generalizes the teacher's
/// `Repository` query style (raw `sqlx::query`/`query_as`, explicit
/// transactions) from its single `rag_document_chunks` table onto the
/// `documents` table spec §6 describes.
pub struct DocumentRegistry {
    pool: DbPool,
}

impl DocumentRegistry {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Spec §4.5 invariant: the parent row always exists by the time a job
    /// reaches the dispatcher (created by the enqueue side). `None` means a
    /// bad job (poison).
    pub async fn select(&self, id: i64) -> Result<Option<DocumentRow>, WorkerError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"SELECT id, parent_id, connector_id, source_id, url, signature,
                      chunking_session, analyzed, creation_date, last_update
               FROM documents WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(self.pool.get_pool())
        .await?;

        Ok(row)
    }

    /// Inserts one child document row under `parent_id`, tagged with the
    /// run's `chunking_session` and `analyzed = true` (spec §4.5, §3).
    pub async fn insert_child(
        &self,
        parent: &DocumentRow,
        source_id: &str,
        url: &str,
        chunking_session: Uuid,
    ) -> Result<i64, WorkerError> {
        let row: (i64,) = sqlx::query_as(
            r#"INSERT INTO documents
                   (parent_id, connector_id, source_id, url, chunking_session, analyzed,
                    creation_date, last_update)
               VALUES ($1, $2, $3, $4, $5, true, now(), now())
               RETURNING id"#,
        )
        .bind(parent.id)
        .bind(parent.connector_id)
        .bind(source_id)
        .bind(url)
        .bind(chunking_session)
        .fetch_one(self.pool.get_pool())
        .await?;

        Ok(row.0)
    }

    /// Wipes every child of `parent_id` (spec §4.5: "children for that
    /// parent are wiped via `delete_by_parent` then repopulated"). Returns
    /// the number of rows removed.
    pub async fn delete_by_parent(&self, parent_id: i64) -> Result<u64, WorkerError> {
        let result = sqlx::query("DELETE FROM documents WHERE parent_id = $1")
            .bind(parent_id)
            .execute(self.pool.get_pool())
            .await?;

        Ok(result.rows_affected())
    }

    /// Marks `id` analyzed with a fresh chunking session (non-empty
    /// extraction path, spec §4.5).
    pub async fn mark_analyzed(
        &self,
        id: i64,
        chunking_session: Uuid,
    ) -> Result<(), WorkerError> {
        sqlx::query(
            r#"UPDATE documents
               SET analyzed = true, chunking_session = $2, last_update = now()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(chunking_session)
        .execute(self.pool.get_pool())
        .await?;

        Ok(())
    }

    /// Marks `id` unanalyzed (empty-extraction path, spec §4.5/§4.7 step 7):
    /// no children are created and no vector-store writes happen.
    pub async fn mark_unanalyzed(&self, id: i64) -> Result<(), WorkerError> {
        sqlx::query(
            r#"UPDATE documents SET analyzed = false, last_update = now() WHERE id = $1"#,
        )
        .bind(id)
        .execute(self.pool.get_pool())
        .await?;

        Ok(())
    }

    /// True when every row sharing `chunking_session` traces back to
    /// `parent_id` — the no-orphans testable property (spec §8).
    pub async fn session_is_self_contained(
        &self,
        parent_id: i64,
        chunking_session: Uuid,
    ) -> Result<bool, WorkerError> {
        let row: (i64,) = sqlx::query_as(
            r#"SELECT COUNT(*) FROM documents
               WHERE chunking_session = $1 AND parent_id <> $2"#,
        )
        .bind(chunking_session)
        .bind(parent_id)
        .fetch_one(self.pool.get_pool())
        .await?;

        Ok(row.0 == 0)
    }
}
