use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use ingest_worker::broker::JetStreamSubscriber;
use ingest_worker::database::{ConnectorTracker, DbPool, DocumentRegistry};
use ingest_worker::document::loader::NullBlobStore;
use ingest_worker::embedding::GrpcEmbeddingClient;
use ingest_worker::utils::logger;
use ingest_worker::vectorstore::MilvusGateway;
use ingest_worker::worker::{JobProcessor, WorkerSupervisor};
use ingest_worker::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    logger::init_logger()?;

    info!("starting ingest worker");

    let settings = Settings::load()?;
    info!("configuration loaded");

    let db_pool = DbPool::new(&settings.database).await?;
    info!("database pool established");

    let registry = Arc::new(DocumentRegistry::new(db_pool.clone()));
    let connectors = Arc::new(ConnectorTracker::new(db_pool));

    let vector_store = Arc::new(MilvusGateway::connect(&settings.vector_store).await?);
    info!("vector store connected");

    let embedder = Arc::new(GrpcEmbeddingClient::connect(&settings.embedding).await?);
    info!("embedding client connected");

    // The blob store, headless renderer, and YT transcript service are
    // external collaborators this crate does not own (spec §1). No
    // production implementation is wired in here; a deployment that needs
    // PDF/DOC/TXT/MD or YT ingestion provides its own `BlobStore` /
    // `HeadlessRenderer` / `TranscriptService` and swaps them in below.
    let blob_store = Arc::new(NullBlobStore);

    let processor = Arc::new(JobProcessor::new(
        settings.clone(),
        registry,
        connectors,
        vector_store,
        embedder,
        blob_store,
        None,
        None,
    ));

    let subscriber = JetStreamSubscriber::connect(&settings.broker).await?;
    info!("broker subscriber ready");

    let supervisor = WorkerSupervisor::new(settings, subscriber, processor);
    supervisor.run().await
}
