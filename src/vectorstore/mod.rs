pub mod gateway;

pub use gateway::{ChunkRow, MilvusGateway, SearchHit, VectorStoreGateway};
