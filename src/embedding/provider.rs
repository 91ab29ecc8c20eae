use async_trait::async_trait;

use crate::utils::error::WorkerError;

/// C3's contract (spec §4.3): a single unary call, one piece of text in,
/// one dense vector out. The teacher's batched `EmbeddingProvider` (a
/// `Vec<String> -> Vec<Vec<f32>>` request/response pair against a local
/// `llama-server` subprocess) is generalized down to this one-at-a-time
/// shape because the remote `Embed` RPC (spec §6) is unary per chunk; the
/// dispatcher (`worker::processor`) calls it once per chunk instead of
/// batching client-side.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, content: &str, model: &str) -> Result<Vec<f32>, WorkerError>;
}
