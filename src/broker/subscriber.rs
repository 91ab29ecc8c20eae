use std::time::Duration;

use async_nats::jetstream::consumer::{pull::Config as PullConfig, AckPolicy, DeliverPolicy};
use async_nats::jetstream;
use futures::StreamExt;
use tracing::info;

use super::ensure_stream;
use crate::config::BrokerConfig;
use crate::utils::error::WorkerError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
const DURABLE_NAME: &str = "worker";

/// One delivered, still-unacked message. Spec §4.8 invariant: the
/// subscriber itself never acks — it hands this to the dispatcher's
/// handler (C7, `worker::processor`), which decodes the payload and decides
/// ack vs nak, including for a payload that fails to decode at all (a
/// poison message must still be acked, so decoding happens downstream of
/// here rather than inside `fetch_one`).
pub struct DeliveredMessage {
    message: jetstream::Message,
}

impl DeliveredMessage {
    pub fn payload(&self) -> &[u8] {
        &self.message.payload
    }

    /// 1 for a first delivery, >1 once JetStream has redelivered it.
    /// Falls back to 1 if the broker didn't attach delivery metadata.
    pub fn num_delivered(&self) -> u64 {
        self.message.info().map(|info| info.delivered).unwrap_or(1)
    }

    pub async fn ack(self) -> Result<(), WorkerError> {
        self.message
            .ack()
            .await
            .map_err(|e| WorkerError::Broker(format!("ack failed: {e}")))
    }

    pub async fn nak(self) -> Result<(), WorkerError> {
        self.message
            .ack_with(jetstream::AckKind::Nak(None))
            .await
            .map_err(|e| WorkerError::Broker(format!("nak failed: {e}")))
    }
}

/// C8: durable pull-consumer work-queue subscriber, grounded in
/// `original_source/.../jetstream_event_subscriber.py`'s
/// connect-ensure-stream-ensure-consumer-fetch-loop shape, replacing the
/// teacher's Postgres LISTEN/NOTIFY listener (see DESIGN.md) since
/// LISTEN/NOTIFY cannot express ack/nak/redelivery.
pub struct JetStreamSubscriber {
    client: async_nats::Client,
    consumer: jetstream::consumer::Consumer<PullConfig>,
}

impl JetStreamSubscriber {
    pub async fn connect(config: &BrokerConfig) -> Result<Self, WorkerError> {
        let client = async_nats::ConnectOptions::new()
            .connection_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .max_reconnects(config.max_reconnect_attempts)
            .retry_on_initial_connect()
            .connect(&config.url)
            .await
            .map_err(|e| WorkerError::Broker(format!("failed to connect to broker: {e}")))?;

        let context = jetstream::new(client.clone());
        let stream = ensure_stream(&context, config).await?;
        let consumer = ensure_consumer(&stream, config).await?;

        info!(stream = %config.stream_name, subject = %config.subject, "subscriber ready");
        Ok(Self { client, consumer })
    }

    /// One fetch-dispatch cycle (spec §5): fetch exactly one message with a
    /// short broker-side timeout. `Ok(None)` on a fetch timeout — the
    /// caller's outer loop just continues.
    pub async fn fetch_one(&self) -> Result<Option<DeliveredMessage>, WorkerError> {
        let mut batch = self
            .consumer
            .fetch()
            .max_messages(1)
            .expires(FETCH_TIMEOUT)
            .messages()
            .await
            .map_err(|e| WorkerError::Broker(format!("fetch failed: {e}")))?;

        let Some(next) = batch.next().await else {
            return Ok(None);
        };

        let message = next.map_err(|e| WorkerError::Broker(format!("message delivery error: {e}")))?;
        Ok(Some(DeliveredMessage { message }))
    }

    /// Exposed so `worker::supervisor` can log a dead connection rather than
    /// silently looping a fetch retry against a broker that's unreachable.
    pub fn connection_state(&self) -> async_nats::connection::State {
        self.client.connection_state()
    }
}

/// Durable pull consumer with explicit ack, mandatory with
/// `RetentionPolicy::WorkQueue` (spec §4.8).
async fn ensure_consumer(
    stream: &jetstream::stream::Stream,
    config: &BrokerConfig,
) -> Result<jetstream::consumer::Consumer<PullConfig>, WorkerError> {
    let consumer_config = PullConfig {
        durable_name: Some(DURABLE_NAME.to_string()),
        ack_policy: AckPolicy::Explicit,
        ack_wait: Duration::from_secs(config.ack_wait_seconds),
        max_deliver: config.max_deliver,
        deliver_policy: DeliverPolicy::All,
        ..Default::default()
    };

    stream
        .get_or_create_consumer(DURABLE_NAME, consumer_config)
        .await
        .map_err(|e| WorkerError::Broker(format!("failed to create consumer: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_timeout_is_bounded_below_typical_ack_wait() {
        assert!(FETCH_TIMEOUT < Duration::from_secs(3600));
    }
}
