pub mod broker;
pub mod config;
pub mod database;
pub mod document;
pub mod embedding;
pub mod utils;
pub mod vectorstore;
pub mod worker;

/// Generated protobuf client/message types (spec §6, `proto/job.proto` and
/// `proto/embed.proto`), compiled by `build.rs` via `tonic-build`.
pub mod pb {
    pub mod job {
        include!(concat!(env!("OUT_DIR"), "/job.rs"));
    }
    pub mod embed {
        include!(concat!(env!("OUT_DIR"), "/embed.rs"));
    }
}

pub use config::Settings;
pub use utils::error::WorkerError;
