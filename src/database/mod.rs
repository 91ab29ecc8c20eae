pub mod connector;
pub mod models;
pub mod pool;
pub mod registry;

pub use connector::ConnectorTracker;
pub use models::*;
pub use pool::DbPool;
pub use registry::DocumentRegistry;
