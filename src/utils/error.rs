use thiserror::Error;

/// Crate-wide error type. Variants map onto spec §7's error kinds; the job
/// dispatcher (`worker::processor`) is the only place that turns one of
/// these into an ack/nak/connector-status decision.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Kind 4: poison message — ack without processing, never redelivered.
    #[error("poison message: {0}")]
    PoisonMessage(String),

    /// Kind 2: job exceeded its ack-wait budget mid-processing.
    #[error("deadline exceeded after {0:?}")]
    DeadlineExceeded(std::time::Duration),

    /// Kind 1: extractor-level failure (HTTP, blob store, transcript API).
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// Kind 1: remote embedding RPC failure.
    #[error("embedding request failed: {0}")]
    Embedding(String),

    /// Kind 1/5: vector store gateway failure (connect, insert, delete).
    #[error("vector store error: {0}")]
    VectorStore(String),

    /// Kind 1: broker (work-queue) connect/fetch/publish failure.
    #[error("broker error: {0}")]
    Broker(String),

    /// Blob store fetch failure (bucket/object not found, transport error).
    #[error("blob store error: {0}")]
    Blob(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Kind 6: unrecoverable bootstrap failure (settings, initial pool connect).
    #[error("bootstrap failure: {0}")]
    Bootstrap(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for WorkerError {
    fn from(err: anyhow::Error) -> Self {
        WorkerError::Unknown(err.to_string())
    }
}
