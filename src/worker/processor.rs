use std::sync::Arc;
use std::time::Duration;

use prost::Message as _;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::broker::DeliveredMessage;
use crate::config::Settings;
use crate::database::{ConnectorTracker, DocumentRegistry, DocumentRow};
use crate::document::chunker::LineBoundedChunker;
use crate::document::extract::{
    self, ExtractDeps, HeadlessRenderer, JobMessage, TranscriptService,
};
use crate::document::loader::BlobStore;
use crate::embedding::EmbeddingProvider;
use crate::pb::job::Job as JobProto;
use crate::utils::error::WorkerError;
use crate::utils::metrics::{Metrics, Timer};
use crate::vectorstore::{ChunkRow, VectorStoreGateway};

use super::deadline::Deadline;

/// What a successfully-decided job produced, for logging/metrics — every
/// variant here is an ack (spec §4.7 step 9, §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// document_id invalid or its document row is missing (spec §7 kind 4).
    /// Acked, connector untouched, never redelivered.
    Poison,
    /// Extraction returned zero items (spec §7 kind 3). Not an error: the
    /// parent row is marked `analyzed = false` and the connector still
    /// completes successfully with zero entities.
    EmptyExtraction,
    /// Non-empty extraction, chunked, embedded, and written.
    Indexed { items: usize, chunks_inserted: u64 },
}

/// C7: the job dispatcher, grounded in the teacher's
/// `DocumentProcessor::process_document`/`process_document_internal` split
/// (outer method owns status transitions and logging, inner method owns
/// extract→chunk→embed→write) generalized to spec §4.7 step-for-step.
pub struct JobProcessor {
    settings: Settings,
    registry: Arc<DocumentRegistry>,
    connectors: Arc<ConnectorTracker>,
    vector_store: Arc<dyn VectorStoreGateway>,
    embedder: Arc<dyn EmbeddingProvider>,
    http: reqwest::Client,
    blob_store: Arc<dyn BlobStore>,
    headless: Option<Arc<dyn HeadlessRenderer>>,
    transcript_service: Option<Arc<dyn TranscriptService>>,
    metrics: Metrics,
}

impl JobProcessor {
    pub fn new(
        settings: Settings,
        registry: Arc<DocumentRegistry>,
        connectors: Arc<ConnectorTracker>,
        vector_store: Arc<dyn VectorStoreGateway>,
        embedder: Arc<dyn EmbeddingProvider>,
        blob_store: Arc<dyn BlobStore>,
        headless: Option<Arc<dyn HeadlessRenderer>>,
        transcript_service: Option<Arc<dyn TranscriptService>>,
    ) -> Self {
        Self::with_metrics(
            settings,
            registry,
            connectors,
            vector_store,
            embedder,
            blob_store,
            headless,
            transcript_service,
            Metrics::new(),
        )
    }

    /// Same as [`JobProcessor::new`], sharing a [`Metrics`] handle with the
    /// supervisor so `WorkerSupervisor::run`'s shutdown summary reflects
    /// per-job counters rather than only fetch-loop counters.
    #[allow(clippy::too_many_arguments)]
    pub fn with_metrics(
        settings: Settings,
        registry: Arc<DocumentRegistry>,
        connectors: Arc<ConnectorTracker>,
        vector_store: Arc<dyn VectorStoreGateway>,
        embedder: Arc<dyn EmbeddingProvider>,
        blob_store: Arc<dyn BlobStore>,
        headless: Option<Arc<dyn HeadlessRenderer>>,
        transcript_service: Option<Arc<dyn TranscriptService>>,
        metrics: Metrics,
    ) -> Self {
        Self {
            settings,
            registry,
            connectors,
            vector_store,
            embedder,
            http: reqwest::Client::new(),
            blob_store,
            headless,
            transcript_service,
            metrics,
        }
    }

    /// Decodes `raw`'s payload and decides ack vs nak (spec §4.8: the
    /// subscriber never acks, only the handler does). A payload that fails
    /// to decode, or decodes into an invalid job, is acked here as poison —
    /// it can never succeed on redelivery.
    pub async fn handle(&self, raw: DeliveredMessage) {
        if raw.num_delivered() > 1 {
            self.metrics.increment_messages_redelivered();
        }

        let job = match JobProto::decode(raw.payload())
            .map_err(|e| WorkerError::PoisonMessage(format!("malformed job payload: {e}")))
            .and_then(JobMessage::from_proto)
        {
            Ok(job) => job,
            Err(e) => {
                self.metrics.increment_messages_poison();
                error!(error = %e, "poison message: rejecting without processing");
                if let Err(ack_err) = raw.ack().await {
                    error!(error = %ack_err, "failed to ack poison message");
                }
                return;
            }
        };

        let document_id = job.document_id;
        let timer = Timer::new();

        match self.process(&job).await {
            Ok(Outcome::Poison) => {
                self.metrics.increment_messages_poison();
                info!(document_id, "poison job: document row missing, acking");
                if let Err(e) = raw.ack().await {
                    error!(error = %e, document_id, "failed to ack poison job");
                } else {
                    self.metrics.increment_messages_acked();
                }
            }
            Ok(outcome) => {
                self.record_outcome_metrics(&outcome, timer.elapsed());
                info!(document_id, ?outcome, "job completed, acking");
                if let Err(e) = raw.ack().await {
                    error!(error = %e, document_id, "failed to ack completed job");
                } else {
                    self.metrics.increment_messages_acked();
                }
            }
            Err(e) => {
                self.metrics.increment_documents_failed();
                error!(error = %e, document_id, "job failed, naking for redelivery");
                if let Err(nak_err) = raw.nak().await {
                    error!(error = %nak_err, document_id, "failed to nak failed job");
                } else {
                    self.metrics.increment_messages_naked();
                }
            }
        }
    }

    fn record_outcome_metrics(&self, outcome: &Outcome, elapsed: Duration) {
        self.metrics.add_processing_time(elapsed);
        match outcome {
            Outcome::Poison => {}
            Outcome::EmptyExtraction => {
                self.metrics.increment_documents_empty();
                self.metrics.increment_documents_processed();
            }
            Outcome::Indexed { chunks_inserted, .. } => {
                self.metrics.increment_documents_processed();
                self.metrics.add_chunks_inserted(*chunks_inserted);
                self.metrics.add_embeddings_generated(*chunks_inserted);
            }
        }
    }

    /// Spec §4.7 steps 1-9. Returns `Ok(Outcome::Poison)` rather than `Err`
    /// for the one case that must still be acked without a connector-status
    /// transition: a missing document row.
    pub async fn process(&self, job: &JobMessage) -> Result<Outcome, WorkerError> {
        let Some(parent) = self.registry.select(job.document_id).await? else {
            warn!(document_id = job.document_id, "document row not found");
            return Ok(Outcome::Poison);
        };

        if let Some(existing_dim) = self
            .vector_store
            .collection_dimension(&job.collection_name)
            .await?
        {
            if existing_dim != job.model_dimension {
                warn!(
                    document_id = job.document_id,
                    collection = %job.collection_name,
                    existing_dim,
                    requested_dim = job.model_dimension,
                    "model_dimension does not match collection, acking as poison"
                );
                return Ok(Outcome::Poison);
            }
        }

        self.connectors.start_processing(parent.connector_id).await?;

        let deadline = Deadline::new(
            Duration::from_secs(self.settings.broker.ack_wait_seconds),
            self.settings.worker.deadline_threshold_ratio,
        );

        match self.process_inner(job, &parent, &deadline).await {
            Ok(outcome) => Ok(outcome),
            Err(WorkerError::PoisonMessage(reason)) => {
                warn!(
                    document_id = job.document_id,
                    connector_id = parent.connector_id,
                    reason,
                    "job turned poison mid-processing, acking without marking connector failed"
                );
                Ok(Outcome::Poison)
            }
            Err(e) => {
                if let Err(status_err) = self.connectors.complete_with_errors(parent.connector_id).await {
                    error!(error = %status_err, connector_id = parent.connector_id, "failed to record failure status");
                }
                Err(e)
            }
        }
    }

    async fn process_inner(
        &self,
        job: &JobMessage,
        parent: &DocumentRow,
        deadline: &Deadline,
    ) -> Result<Outcome, WorkerError> {
        deadline.check()?;

        let deps = ExtractDeps {
            http: &self.http,
            blob_store: self.blob_store.as_ref(),
            headless: self.headless.as_deref(),
            transcript_service: self.transcript_service.as_deref(),
            max_crawl_depth: self.settings.worker.max_crawl_depth,
            max_crawl_pages: self.settings.worker.max_crawl_pages,
        };

        let items = extract::extract(job, &deps).await?;

        if items.is_empty() {
            self.registry.mark_unanalyzed(parent.id).await?;
            self.connectors.complete_successfully(parent.connector_id, 0).await?;
            return Ok(Outcome::EmptyExtraction);
        }

        self.vector_store
            .replace_document(&job.collection_name, job.document_id)
            .await?;
        self.vector_store
            .ensure_collection(&job.collection_name, job.model_dimension)
            .await?;
        self.registry.delete_by_parent(parent.id).await?;

        let chunking_session = Uuid::new_v4();
        let chunker = LineBoundedChunker::new(
            self.settings.chunking.size,
            self.settings.chunking.overlap,
        );

        let mut staged: Vec<ChunkRow> = Vec::new();
        let mut total_inserted: u64 = 0;

        for item in &items {
            deadline.check()?;

            let child_id = self
                .registry
                .insert_child(parent, &item.reference, &item.reference, chunking_session)
                .await?;

            for chunk in chunker.split(&item.content, &item.reference) {
                deadline.check()?;

                let vector = self.embedder.embed(&chunk.content, &job.model_name).await?;
                staged.push(ChunkRow {
                    document_id: child_id,
                    parent_id: job.document_id,
                    content: chunk.content,
                    vector,
                });

                if staged.len() >= self.settings.worker.bulk_batch_size {
                    total_inserted += self.flush_batch(&job.collection_name, &mut staged).await?;
                }
            }
        }

        total_inserted += self.flush_batch(&job.collection_name, &mut staged).await?;

        self.registry.mark_analyzed(parent.id, chunking_session).await?;
        self.connectors
            .complete_successfully(parent.connector_id, total_inserted as i64)
            .await?;

        Ok(Outcome::Indexed {
            items: items.len(),
            chunks_inserted: total_inserted,
        })
    }

    /// Shared with [`super::WorkerSupervisor`] so its shutdown summary
    /// includes per-job counters alongside fetch-loop counters.
    pub fn metrics(&self) -> Metrics {
        self.metrics.clone()
    }

    async fn flush_batch(&self, collection: &str, staged: &mut Vec<ChunkRow>) -> Result<u64, WorkerError> {
        if staged.is_empty() {
            return Ok(0);
        }

        let batch = std::mem::take(staged);
        let count = batch.len() as u64;
        self.vector_store.insert_chunks(collection, batch).await?;
        Ok(count)
    }
}
