use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    documents_processed: AtomicU64,
    documents_failed: AtomicU64,
    documents_empty: AtomicU64,
    chunks_inserted: AtomicU64,
    total_processing_time_ms: AtomicU64,
    embeddings_generated: AtomicU64,
    messages_fetched: AtomicU64,
    messages_acked: AtomicU64,
    messages_naked: AtomicU64,
    messages_poison: AtomicU64,
    messages_redelivered: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                documents_processed: AtomicU64::new(0),
                documents_failed: AtomicU64::new(0),
                documents_empty: AtomicU64::new(0),
                chunks_inserted: AtomicU64::new(0),
                total_processing_time_ms: AtomicU64::new(0),
                embeddings_generated: AtomicU64::new(0),
                messages_fetched: AtomicU64::new(0),
                messages_acked: AtomicU64::new(0),
                messages_naked: AtomicU64::new(0),
                messages_poison: AtomicU64::new(0),
                messages_redelivered: AtomicU64::new(0),
            }),
        }
    }

    pub fn increment_documents_processed(&self) {
        self.inner
            .documents_processed
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_documents_failed(&self) {
        self.inner.documents_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_documents_empty(&self) {
        self.inner.documents_empty.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_chunks_inserted(&self, count: u64) {
        self.inner.chunks_inserted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_processing_time(&self, duration: Duration) {
        self.inner
            .total_processing_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn add_embeddings_generated(&self, count: u64) {
        self.inner
            .embeddings_generated
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_messages_fetched(&self) {
        self.inner.messages_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_messages_acked(&self) {
        self.inner.messages_acked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_messages_naked(&self) {
        self.inner.messages_naked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_messages_poison(&self) {
        self.inner.messages_poison.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_messages_redelivered(&self) {
        self.inner
            .messages_redelivered
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_documents_processed(&self) -> u64 {
        self.inner.documents_processed.load(Ordering::Relaxed)
    }

    pub fn get_documents_failed(&self) -> u64 {
        self.inner.documents_failed.load(Ordering::Relaxed)
    }

    pub fn get_chunks_inserted(&self) -> u64 {
        self.inner.chunks_inserted.load(Ordering::Relaxed)
    }

    pub fn get_total_processing_time_ms(&self) -> u64 {
        self.inner.total_processing_time_ms.load(Ordering::Relaxed)
    }

    pub fn get_average_processing_time_ms(&self) -> f64 {
        let processed = self.get_documents_processed();
        if processed == 0 {
            return 0.0;
        }

        self.get_total_processing_time_ms() as f64 / processed as f64
    }

    pub fn print_summary(&self) {
        println!("\n=== METRICS SUMMARY ===");
        println!("Documents Processed: {}", self.get_documents_processed());
        println!("Documents Failed: {}", self.get_documents_failed());
        println!(
            "Documents Empty: {}",
            self.inner.documents_empty.load(Ordering::Relaxed)
        );
        println!("Chunks Inserted: {}", self.get_chunks_inserted());
        println!(
            "Embeddings Generated: {}",
            self.inner.embeddings_generated.load(Ordering::Relaxed)
        );
        println!(
            "Messages Fetched/Acked/Naked/Poison/Redelivered: {}/{}/{}/{}/{}",
            self.inner.messages_fetched.load(Ordering::Relaxed),
            self.inner.messages_acked.load(Ordering::Relaxed),
            self.inner.messages_naked.load(Ordering::Relaxed),
            self.inner.messages_poison.load(Ordering::Relaxed),
            self.inner.messages_redelivered.load(Ordering::Relaxed),
        );
        println!(
            "Average Processing Time: {:.2}ms",
            self.get_average_processing_time_ms()
        );
        println!("=========================\n");
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Measures wall-clock elapsed against a job's `ack_wait` budget.
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
