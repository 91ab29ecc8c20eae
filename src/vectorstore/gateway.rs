use async_trait::async_trait;
use milvus::client::Client;
use milvus::collection::SearchOption;
use milvus::index::{IndexParams, IndexType, MetricType};
use milvus::schema::{CollectionSchemaBuilder, FieldSchema};
use milvus::value::Value;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::VectorStoreConfig;
use crate::document::chunker::MAX_STORE_BYTES;
use crate::utils::error::WorkerError;

const VECTOR_FIELD: &str = "vector";
const ID_FIELD: &str = "id";
const DOCUMENT_ID_FIELD: &str = "document_id";
const PARENT_ID_FIELD: &str = "parent_id";
const CONTENT_FIELD: &str = "content";
const SEARCH_EF: u32 = 64;

/// A chunk about to be inserted (spec §4.4 `InsertChunks`), already carrying
/// its embedding from C3.
#[derive(Debug, Clone)]
pub struct ChunkRow {
    pub document_id: i64,
    pub parent_id: i64,
    pub content: String,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub content: String,
    pub distance: f32,
}

/// C4: idempotent-replace vector store gateway, grounded in
/// `original_source/.../milvus_db.py`'s operation sequence (connect, ensure
/// schema/index, load, insert, flush) but fixing the Open Question spec §9
/// flags: `replace_document` deletes by primary key, it never calls
/// `utility.drop_collection`.
#[async_trait]
pub trait VectorStoreGateway: Send + Sync {
    /// Reads the vector field's configured dimension for `collection`, or
    /// `None` if the collection does not yet exist. The read side of spec
    /// §3/§6/§9's dimension contract — `ensure_collection` uses this itself,
    /// and the dispatcher calls it up front so a dimension-mismatched job
    /// can be rejected as poison before any connector-status transition.
    async fn collection_dimension(&self, collection: &str) -> Result<Option<i32>, WorkerError>;
    async fn ensure_collection(&self, collection: &str, dimension: i32) -> Result<(), WorkerError>;
    async fn replace_document(&self, collection: &str, document_id: i64) -> Result<u64, WorkerError>;
    async fn insert_chunks(&self, collection: &str, rows: Vec<ChunkRow>) -> Result<(), WorkerError>;
    async fn search(
        &self,
        collection: &str,
        query_vector: Vec<f32>,
        k: usize,
    ) -> Result<Vec<SearchHit>, WorkerError>;
}

pub struct MilvusGateway {
    client: Client,
    index_type: IndexType,
    metric_type: MetricType,
}

impl MilvusGateway {
    pub async fn connect(config: &VectorStoreConfig) -> Result<Self, WorkerError> {
        let url = format!("http://{}:{}", config.host, config.port);
        let client = Client::new(&url)
            .await
            .map_err(|e| WorkerError::VectorStore(format!("failed to connect to milvus: {e}")))?;

        Ok(Self {
            client,
            index_type: parse_index_type(&config.index_type),
            metric_type: parse_metric_type(&config.metric_type),
        })
    }
}

#[async_trait]
impl VectorStoreGateway for MilvusGateway {
    /// `None` when the collection does not exist; `Some(dim)` read off the
    /// `vector` field's schema otherwise. Best-effort against
    /// `milvus-sdk-rust`'s `describe_collection`/`FieldSchema` shape (see
    /// DESIGN.md's "Remaining open items" — no verified call site for this
    /// crate exists in the retrieval pack).
    async fn collection_dimension(&self, collection: &str) -> Result<Option<i32>, WorkerError> {
        if !self
            .client
            .has_collection(collection)
            .await
            .map_err(|e| WorkerError::VectorStore(format!("has_collection failed: {e}")))?
        {
            return Ok(None);
        }

        let schema = self
            .client
            .describe_collection(collection)
            .await
            .map_err(|e| WorkerError::VectorStore(format!("describe_collection failed: {e}")))?;

        let dim = schema
            .fields()
            .iter()
            .find(|field| field.name() == VECTOR_FIELD)
            .and_then(|field| field.dim())
            .map(|dim| dim as i32);

        Ok(dim)
    }

    /// Idempotent create: returns `Ok(())` immediately if the collection
    /// already exists with a matching dimension (spec §4.4.2). A dimension
    /// mismatch against an existing collection is a bad-job error (spec §9's
    /// Open Question resolution) — this is the last-resort check if the
    /// dispatcher's own up-front check (`JobProcessor::process`) is ever
    /// bypassed, so `ensure_collection` alone is never enough to corrupt an
    /// existing collection's vectors.
    async fn ensure_collection(&self, collection: &str, dimension: i32) -> Result<(), WorkerError> {
        if let Some(existing_dim) = self.collection_dimension(collection).await? {
            if existing_dim != dimension {
                return Err(WorkerError::PoisonMessage(format!(
                    "collection {collection} has dimension {existing_dim} but job requested {dimension}"
                )));
            }

            debug!(collection, dimension, "collection already exists with matching dimension");
            return Ok(());
        }

        let schema = CollectionSchemaBuilder::new(collection, "ingestion pipeline chunks")
            .add_field(FieldSchema::new_primary_int64(ID_FIELD, true))
            .add_field(FieldSchema::new_int64(DOCUMENT_ID_FIELD))
            .add_field(FieldSchema::new_int64(PARENT_ID_FIELD))
            .add_field(FieldSchema::new_json(CONTENT_FIELD))
            .add_field(FieldSchema::new_float_vector(VECTOR_FIELD, dimension as i64))
            .build()
            .map_err(|e| WorkerError::VectorStore(format!("failed to build schema: {e}")))?;

        self.client
            .create_collection(schema, None)
            .await
            .map_err(|e| WorkerError::VectorStore(format!("create_collection failed: {e}")))?;

        let index_params = IndexParams::new(
            format!("{collection}_vector_idx"),
            self.index_type,
            self.metric_type,
            Default::default(),
        );

        self.client
            .create_index(collection, VECTOR_FIELD, index_params)
            .await
            .map_err(|e| WorkerError::VectorStore(format!("create_index failed: {e}")))?;

        self.client
            .load_collection(collection, None)
            .await
            .map_err(|e| WorkerError::VectorStore(format!("load_collection failed: {e}")))?;

        info!(collection, dimension, "collection created and loaded");
        Ok(())
    }

    /// Spec §4.4.1: query primary keys matching `document_id == id OR
    /// parent_id == id`, delete by that id list, flush. A no-op (`Ok(0)`)
    /// when the collection does not yet exist.
    async fn replace_document(&self, collection: &str, document_id: i64) -> Result<u64, WorkerError> {
        if !self
            .client
            .has_collection(collection)
            .await
            .map_err(|e| WorkerError::VectorStore(format!("has_collection failed: {e}")))?
        {
            return Ok(0);
        }

        let expr = format!(
            "{DOCUMENT_ID_FIELD} == {document_id} or {PARENT_ID_FIELD} == {document_id}"
        );

        let matched = self
            .client
            .query(collection, &expr, &[ID_FIELD])
            .await
            .map_err(|e| WorkerError::VectorStore(format!("query for replace failed: {e}")))?;

        let ids: Vec<i64> = matched
            .into_iter()
            .find(|col| col.name() == ID_FIELD)
            .map(|col| col.as_i64_slice().to_vec())
            .unwrap_or_default();

        if ids.is_empty() {
            return Ok(0);
        }

        let delete_expr = format!(
            "{ID_FIELD} in [{}]",
            ids.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")
        );

        self.client
            .delete(collection, &delete_expr)
            .await
            .map_err(|e| WorkerError::VectorStore(format!("delete failed: {e}")))?;

        self.client
            .flush(vec![collection.to_string()])
            .await
            .map_err(|e| WorkerError::VectorStore(format!("flush after delete failed: {e}")))?;

        debug!(collection, document_id, deleted = ids.len(), "replaced document");
        Ok(ids.len() as u64)
    }

    /// Spec §4.4.3: truncate each `content` to the hard store limit, wrap
    /// as `{"content": "<text>"}`, bulk-insert as a single batch, flush.
    async fn insert_chunks(&self, collection: &str, rows: Vec<ChunkRow>) -> Result<(), WorkerError> {
        if rows.is_empty() {
            return Ok(());
        }

        let count = rows.len();
        let mut document_ids = Vec::with_capacity(count);
        let mut parent_ids = Vec::with_capacity(count);
        let mut contents = Vec::with_capacity(count);
        let mut vectors = Vec::with_capacity(count);

        for row in rows {
            let truncated = crate::document::chunker::truncate_to_store_limit(&row.content);
            debug_assert!(truncated.len() <= MAX_STORE_BYTES);

            document_ids.push(row.document_id);
            parent_ids.push(row.parent_id);
            contents.push(json!({ "content": truncated }));
            vectors.push(row.vector);
        }

        let fields = vec![
            Value::from_i64_column(DOCUMENT_ID_FIELD, document_ids),
            Value::from_i64_column(PARENT_ID_FIELD, parent_ids),
            Value::from_json_column(CONTENT_FIELD, contents),
            Value::from_float_vector_column(VECTOR_FIELD, vectors),
        ];

        self.client
            .insert(collection, fields, None)
            .await
            .map_err(|e| WorkerError::VectorStore(format!("insert failed: {e}")))?;

        self.client
            .flush(vec![collection.to_string()])
            .await
            .map_err(|e| WorkerError::VectorStore(format!("flush after insert failed: {e}")))?;

        debug!(collection, inserted = count, "inserted chunks");
        Ok(())
    }

    /// Spec §4.4.4: ANN search with `{metric: COSINE, ef: 64}`, default k=10
    /// handled by the caller.
    async fn search(
        &self,
        collection: &str,
        query_vector: Vec<f32>,
        k: usize,
    ) -> Result<Vec<SearchHit>, WorkerError> {
        let option = SearchOption::new()
            .metric_type(self.metric_type)
            .extra_param("ef", SEARCH_EF)
            .output_fields(vec![CONTENT_FIELD.to_string()]);

        let results = self
            .client
            .search(collection, vec![query_vector], VECTOR_FIELD, k as i32, &option)
            .await
            .map_err(|e| WorkerError::VectorStore(format!("search failed: {e}")))?;

        let hits = results
            .into_iter()
            .map(|hit| SearchHit {
                content: hit.field(CONTENT_FIELD).map(|v| v.to_string()).unwrap_or_default(),
                distance: hit.score,
            })
            .collect();

        Ok(hits)
    }
}

fn parse_index_type(value: &str) -> IndexType {
    match value.to_uppercase().as_str() {
        "DISKANN" => IndexType::DISKANN,
        "HNSW" => IndexType::HNSW,
        "IVF_FLAT" => IndexType::IvfFlat,
        other => {
            warn!(index_type = other, "unknown index type, defaulting to DISKANN");
            IndexType::DISKANN
        }
    }
}

fn parse_metric_type(value: &str) -> MetricType {
    match value.to_uppercase().as_str() {
        "COSINE" => MetricType::Cosine,
        "L2" => MetricType::L2,
        "IP" => MetricType::IP,
        other => {
            warn!(metric_type = other, "unknown metric type, defaulting to COSINE");
            MetricType::Cosine
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_index_and_metric_types() {
        assert!(matches!(parse_index_type("diskann"), IndexType::DISKANN));
        assert!(matches!(parse_metric_type("cosine"), MetricType::Cosine));
    }

    #[test]
    fn falls_back_to_defaults_for_unknown_values() {
        assert!(matches!(parse_index_type("bogus"), IndexType::DISKANN));
        assert!(matches!(parse_metric_type("bogus"), MetricType::Cosine));
    }
}
