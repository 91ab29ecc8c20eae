pub mod chunker;
pub mod extract;
pub mod loader;
pub mod parser;

pub use chunker::{LineBoundedChunker, TextChunk};
pub use extract::{ExtractedItem, JobMessage, SourceKind};
pub use loader::{BlobRef, BlobStore, NullBlobStore};
