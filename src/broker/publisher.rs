use std::time::Duration;

use async_nats::jetstream::{self, Context};
use prost::Message as _;
use tracing::{error, info};

use super::ensure_stream;
use crate::config::BrokerConfig;
use crate::document::extract::JobMessage;
use crate::utils::error::WorkerError;

/// C10: the enqueue side. Same stream/retention shape as the subscriber
/// (spec §4.10) — publishing and consuming only ever differ in which end of
/// the durable consumer they touch.
pub struct JobPublisher {
    context: Context,
    subject: String,
}

impl JobPublisher {
    pub async fn connect(config: &BrokerConfig) -> Result<Self, WorkerError> {
        let client = async_nats::ConnectOptions::new()
            .connection_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .max_reconnects(config.max_reconnect_attempts)
            .retry_on_initial_connect()
            .connect(&config.url)
            .await
            .map_err(|e| WorkerError::Broker(format!("failed to connect to broker: {e}")))?;

        let context = jetstream::new(client);
        ensure_stream(&context, config).await?;

        Ok(Self {
            context,
            subject: config.subject.clone(),
        })
    }

    /// Publishes one job. No local queueing or retry on failure (spec
    /// §4.10) — a `NoResponders` error or publish timeout is surfaced to
    /// the caller to decide.
    pub async fn publish(&self, job: &JobMessage) -> Result<(), WorkerError> {
        let proto = job.to_proto();
        let payload = proto.encode_to_vec();

        let ack = self
            .context
            .publish(self.subject.clone(), payload.into())
            .await
            .map_err(|e| {
                error!(error = %e, "failed to publish job");
                WorkerError::Broker(format!("publish failed: {e}"))
            })?;

        ack.await
            .map_err(|e| WorkerError::Broker(format!("publish was not acknowledged: {e}")))?;

        info!(document_id = job.document_id, "job published");
        Ok(())
    }
}
