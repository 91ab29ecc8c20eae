pub mod deadline;
pub mod processor;

pub use processor::{JobProcessor, Outcome};

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::broker::JetStreamSubscriber;
use crate::config::Settings;
use crate::utils::metrics::Metrics;

/// C9: the supervisor. Grounded in the teacher's `Worker::run` shape (spawn
/// the fetch loop, race it against a shutdown signal, expose health) but
/// rebuilt around a pull-based fetch-dispatch cycle instead of a
/// notification channel plus in-memory task queue — JetStream's durable
/// consumer already is the queue (spec §4.8/§4.9), so there is nothing left
/// for an in-process queue to buffer.
pub struct WorkerSupervisor {
    settings: Settings,
    subscriber: JetStreamSubscriber,
    processor: Arc<JobProcessor>,
    metrics: Metrics,
}

impl WorkerSupervisor {
    pub fn new(settings: Settings, subscriber: JetStreamSubscriber, processor: Arc<JobProcessor>) -> Self {
        let metrics = processor.metrics();
        Self {
            settings,
            subscriber,
            processor,
            metrics,
        }
    }

    /// Runs the readiness probe and the fetch-dispatch loop until SIGINT,
    /// per spec §4.9. The readiness route always returns 200 — this process
    /// is "ready" as long as it is alive to answer, matching the teacher
    /// family's single `/healthz` convention; actual broker health is
    /// exposed only through logs/metrics, not through the probe.
    pub async fn run(self) -> anyhow::Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let readiness_handle = tokio::spawn(spawn_readiness_probe(
            self.settings.readiness.port,
            shutdown_rx.clone(),
        ));

        let fetch_loop = self.fetch_dispatch_loop(shutdown_rx);

        tokio::select! {
            result = fetch_loop => {
                if let Err(e) = result {
                    error!(error = %e, "fetch-dispatch loop exited with an error");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received shutdown signal");
            }
        }

        let _ = shutdown_tx.send(true);
        let _ = readiness_handle.await;

        self.metrics.print_summary();
        info!("worker stopped");
        Ok(())
    }

    /// Spec §5: fetch exactly one message, dispatch it, repeat. A fetch
    /// timeout (`Ok(None)`) is the steady-state idle case, not an error.
    async fn fetch_dispatch_loop(&self, mut shutdown_rx: watch::Receiver<bool>) -> anyhow::Result<()> {
        loop {
            if *shutdown_rx.borrow() {
                return Ok(());
            }

            tokio::select! {
                fetched = self.subscriber.fetch_one() => {
                    match fetched {
                        Ok(Some(message)) => {
                            self.metrics.increment_messages_fetched();
                            self.processor.handle(message).await;
                        }
                        Ok(None) => {}
                        Err(e) => {
                            warn!(
                                error = %e,
                                state = ?self.subscriber.connection_state(),
                                "fetch failed, backing off before retry"
                            );
                            tokio::time::sleep(Duration::from_secs(
                                self.settings.broker.reconnect_wait_seconds,
                            ))
                            .await;
                        }
                    }
                }
                _ = shutdown_rx.changed() => {
                    return Ok(());
                }
            }
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn spawn_readiness_probe(port: u16, mut shutdown_rx: watch::Receiver<bool>) {
    let app = Router::new().route("/healthz", get(healthz));

    let addr = format!("0.0.0.0:{port}");
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, addr, "failed to bind readiness probe");
            return;
        }
    };

    info!(addr, "readiness probe listening");

    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = shutdown_rx.changed().await;
    });

    if let Err(e) = serve.await {
        error!(error = %e, "readiness probe exited with an error");
    }
}
