use crate::utils::error::WorkerError;
use async_trait::async_trait;

/// External collaborator seam for the JS-rendering fallback the BS4-style
/// crawler defers to when the primary HTML parse yields no text (spec §4.2,
/// `original_source/.../spider_selenium.py`). No production implementation
/// ships in this crate — the headless browser binary itself is out of scope
/// (spec §1) — so `document::extract::url::UrlExtractor` is constructed with
/// `headless: None` by default and the fallback path is a deliberate gap,
/// not a bug.
#[async_trait]
pub trait HeadlessRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String, WorkerError>;
}

/// External collaborator for the YouTube transcript retriever (spec §1, §4.2).
#[async_trait]
pub trait TranscriptService: Send + Sync {
    async fn fetch_transcript(&self, video_id: &str) -> Result<Vec<TranscriptSegment>, WorkerError>;
}

#[derive(Debug, Clone)]
pub struct TranscriptSegment {
    pub text: String,
}
