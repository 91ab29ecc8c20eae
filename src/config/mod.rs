pub mod settings;

pub use settings::{
    BrokerConfig, ChunkStrategy, ChunkingConfig, DatabaseConfig, EmbeddingConfig, ReadinessConfig,
    Settings, VectorStoreConfig, WorkerConfig,
};
