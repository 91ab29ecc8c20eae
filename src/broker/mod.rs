pub mod publisher;
pub mod subscriber;

pub use publisher::JobPublisher;
pub use subscriber::{DeliveredMessage, JetStreamSubscriber};

use async_nats::jetstream::stream::{Config as StreamConfig, RetentionPolicy};
use async_nats::jetstream::{self, Context};
use tracing::{debug, warn};

use crate::config::BrokerConfig;
use crate::utils::error::WorkerError;

/// Ensures a work-queue-retention stream exists for `config.subject`,
/// shared by both ends of the broker protocol (spec §4.8, §4.10: publisher
/// and subscriber agree on the same stream/retention shape). If a stream
/// already exists under a different configuration, it is torn down and
/// recreated — mirroring the Python subscriber's `BadRequestError`
/// delete+recreate branch.
pub(crate) async fn ensure_stream(
    context: &Context,
    config: &BrokerConfig,
) -> Result<jetstream::stream::Stream, WorkerError> {
    let desired = StreamConfig {
        name: config.stream_name.clone(),
        subjects: vec![config.subject.clone()],
        retention: RetentionPolicy::WorkQueue,
        ..Default::default()
    };

    match context.get_stream(&config.stream_name).await {
        Ok(mut existing) => {
            let info = existing
                .info()
                .await
                .map_err(|e| WorkerError::Broker(format!("failed to read stream info: {e}")))?;

            if info.config.retention == desired.retention && info.config.subjects == desired.subjects {
                debug!(stream = %config.stream_name, "stream already configured correctly");
                return Ok(existing);
            }

            warn!(
                stream = %config.stream_name,
                "stream exists with a different configuration, recreating"
            );
            context
                .delete_stream(&config.stream_name)
                .await
                .map_err(|e| WorkerError::Broker(format!("failed to delete stale stream: {e}")))?;

            context
                .create_stream(desired)
                .await
                .map_err(|e| WorkerError::Broker(format!("failed to recreate stream: {e}")))
        }
        Err(_) => context
            .create_stream(desired)
            .await
            .map_err(|e| WorkerError::Broker(format!("failed to create stream: {e}"))),
    }
}
