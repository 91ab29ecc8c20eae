pub mod grpc_client;
pub mod provider;

pub use grpc_client::GrpcEmbeddingClient;
pub use provider::EmbeddingProvider;
