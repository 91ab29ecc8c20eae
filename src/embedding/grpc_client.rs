use async_trait::async_trait;
use tonic::transport::Channel;
use tracing::debug;

use crate::config::EmbeddingConfig;
use crate::pb::embed::embed_client::EmbedClient;
use crate::pb::embed::EmbedRequest;
use crate::utils::error::WorkerError;

use super::provider::EmbeddingProvider;

/// C3's production implementation: a `tonic`-generated unary client against
/// the remote embedding host (spec §4.3, §6), replacing the teacher's
/// `LlamaServerManager` subprocess-HTTP client wholesale — there is no
/// local model process to spawn or health-poll any more (see DESIGN.md).
///
/// The channel is opened once at construction and reused across calls
/// within a worker process, configured for the 100 MiB send/recv frame
/// size spec §4.3/§6 requires for large chunk payloads. No retry at this
/// layer; a failed RPC becomes `WorkerError::Embedding` and propagates to
/// the dispatcher as a job-level failure.
pub struct GrpcEmbeddingClient {
    client: EmbedClient<Channel>,
}

impl GrpcEmbeddingClient {
    pub async fn connect(config: &EmbeddingConfig) -> Result<Self, WorkerError> {
        let endpoint = format!("http://{}:{}", config.grpc_host, config.grpc_port);

        let channel = Channel::from_shared(endpoint)
            .map_err(|e| WorkerError::Embedding(format!("invalid embedder endpoint: {e}")))?
            .connect()
            .await
            .map_err(|e| WorkerError::Embedding(format!("failed to connect to embedder: {e}")))?;

        let client = EmbedClient::new(channel)
            .max_decoding_message_size(config.max_frame_bytes)
            .max_encoding_message_size(config.max_frame_bytes);

        Ok(Self { client })
    }
}

#[async_trait]
impl EmbeddingProvider for GrpcEmbeddingClient {
    async fn embed(&self, content: &str, model: &str) -> Result<Vec<f32>, WorkerError> {
        let mut client = self.client.clone();

        let request = tonic::Request::new(EmbedRequest {
            content: content.to_string(),
            model: model.to_string(),
        });

        let response = client
            .get_embedding(request)
            .await
            .map_err(|e| WorkerError::Embedding(format!("GetEmbedding rpc failed: {e}")))?
            .into_inner();

        debug!(model, dimension = response.vector.len(), "embedded chunk");
        Ok(response.vector)
    }
}
