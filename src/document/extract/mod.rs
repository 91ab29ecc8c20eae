pub mod collaborators;
pub mod pdf_doc;
pub mod txt_md;
pub mod url;
pub mod yt;

pub use collaborators::{HeadlessRenderer, TranscriptService, TranscriptSegment};

use crate::pb::job::FileType;
use crate::utils::error::WorkerError;

/// One extracted unit of text, tagged with a human-readable reference that
/// survives into `TextChunk::reference` and ultimately the vector store's
/// `content` payload (spec §4.1, §4.4). For a URL crawl, `reference` is the
/// page URL; for PDF/DOC, the reconstructed section heading; for TXT/MD, the
/// source document name; for YT, the video id.
#[derive(Debug, Clone)]
pub struct ExtractedItem {
    pub reference: String,
    pub content: String,
}

/// Mirrors `job.proto`'s `FileType` enum as the in-process dispatch key.
/// Deliberately a single `match` over this enum rather than a boxed trait
/// object per source type (redesign flag: the teacher's per-provider trait
/// object indirection bought nothing here since the match has exactly six
/// arms and never grows at runtime).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Url,
    Pdf,
    Doc,
    Txt,
    Md,
    Yt,
}

impl SourceKind {
    pub fn from_proto(file_type: i32) -> Result<Self, WorkerError> {
        match FileType::try_from(file_type)
            .map_err(|_| WorkerError::PoisonMessage(format!("unknown file_type: {file_type}")))?
        {
            FileType::Url => Ok(Self::Url),
            FileType::Pdf => Ok(Self::Pdf),
            FileType::Doc => Ok(Self::Doc),
            FileType::Txt => Ok(Self::Txt),
            FileType::Md => Ok(Self::Md),
            FileType::Yt => Ok(Self::Yt),
        }
    }

    pub fn to_proto(self) -> FileType {
        match self {
            Self::Url => FileType::Url,
            Self::Pdf => FileType::Pdf,
            Self::Doc => FileType::Doc,
            Self::Txt => FileType::Txt,
            Self::Md => FileType::Md,
            Self::Yt => FileType::Yt,
        }
    }
}

/// The decoded, validated form of the wire `Job` message (spec §6). A poison
/// message (missing `document_id`, unknown `file_type`, empty `url` for a
/// URL/YT job) is rejected here, before any extractor runs, so the processor
/// can tell "this job can never succeed" apart from "this attempt failed".
#[derive(Debug, Clone)]
pub struct JobMessage {
    pub url: String,
    pub site_map: String,
    pub search_for_sitemap: bool,
    pub document_id: i64,
    pub connector_id: i64,
    pub file_type: SourceKind,
    pub url_recursive: bool,
    pub collection_name: String,
    pub model_name: String,
    pub model_dimension: i32,
    pub tenant_id: Option<i64>,
    pub user_id: Option<i64>,
}

impl JobMessage {
    pub fn from_proto(job: crate::pb::job::Job) -> Result<Self, WorkerError> {
        if job.document_id <= 0 {
            return Err(WorkerError::PoisonMessage(
                "document_id must be positive".to_string(),
            ));
        }

        let file_type = SourceKind::from_proto(job.file_type)?;

        if matches!(file_type, SourceKind::Url) && job.url.trim().is_empty() {
            return Err(WorkerError::PoisonMessage(
                "url jobs require a non-empty url".to_string(),
            ));
        }

        if job.collection_name.trim().is_empty() {
            return Err(WorkerError::PoisonMessage(
                "collection_name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            url: job.url,
            site_map: job.site_map,
            search_for_sitemap: job.search_for_sitemap,
            document_id: job.document_id,
            connector_id: job.connector_id,
            file_type,
            url_recursive: job.url_recursive,
            collection_name: job.collection_name,
            model_name: job.model_name,
            model_dimension: job.model_dimension,
            tenant_id: job.tenant_id,
            user_id: job.user_id,
        })
    }

    pub fn to_proto(&self) -> crate::pb::job::Job {
        crate::pb::job::Job {
            url: self.url.clone(),
            site_map: self.site_map.clone(),
            search_for_sitemap: self.search_for_sitemap,
            document_id: self.document_id,
            connector_id: self.connector_id,
            file_type: self.file_type.to_proto() as i32,
            url_recursive: self.url_recursive,
            collection_name: self.collection_name.clone(),
            model_name: self.model_name.clone(),
            model_dimension: self.model_dimension,
            tenant_id: self.tenant_id,
            user_id: self.user_id,
        }
    }
}

/// Collaborators the extractor dispatch needs but does not own (spec §1
/// excludes the blob store, the headless renderer and the YT transcript
/// service from this crate's scope).
pub struct ExtractDeps<'a> {
    pub http: &'a reqwest::Client,
    pub blob_store: &'a dyn crate::document::loader::BlobStore,
    pub headless: Option<&'a dyn HeadlessRenderer>,
    pub transcript_service: Option<&'a dyn TranscriptService>,
    pub max_crawl_depth: usize,
    pub max_crawl_pages: usize,
}

/// Extracts raw text items for `job`, dispatching on `job.file_type` (spec
/// §4.2). This is C2: the only thing downstream chunking cares about is the
/// `Vec<ExtractedItem>` it returns.
pub async fn extract(
    job: &JobMessage,
    deps: &ExtractDeps<'_>,
) -> Result<Vec<ExtractedItem>, WorkerError> {
    match job.file_type {
        SourceKind::Url => {
            url::extract(
                job,
                deps.http,
                deps.headless,
                deps.max_crawl_depth,
                deps.max_crawl_pages,
            )
            .await
        }
        SourceKind::Pdf | SourceKind::Doc => {
            pdf_doc::extract(job, deps.blob_store).await
        }
        SourceKind::Txt | SourceKind::Md => {
            txt_md::extract(job, deps.blob_store).await
        }
        SourceKind::Yt => yt::extract(job, deps.transcript_service).await,
    }
}
