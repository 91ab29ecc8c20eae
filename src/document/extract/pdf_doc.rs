use super::{ExtractedItem, JobMessage, SourceKind};
use crate::document::loader::{validate_bytes, BlobRef, BlobStore};
use crate::document::parser::{docx_to_text, pdf_to_text, reconstruct_headings, split_markdown_by_heading};
use crate::utils::error::WorkerError;

const MAX_BLOB_SIZE_MB: u64 = 100;

/// Fetches the blob referenced by `job.url`, converts it to a heading-aware
/// markdown reconstruction, and splits on headings into one
/// `ExtractedItem` per section — reference `"<source>#section-<n>"` (spec
/// §4.2).
pub async fn extract(
    job: &JobMessage,
    blob_store: &dyn BlobStore,
) -> Result<Vec<ExtractedItem>, WorkerError> {
    let blob_ref = BlobRef::parse(&job.url)?;
    let bytes = blob_store.fetch(&blob_ref).await?;
    validate_bytes(&bytes, MAX_BLOB_SIZE_MB)?;

    let raw_text = match job.file_type {
        SourceKind::Pdf => pdf_to_text(&bytes)?,
        SourceKind::Doc => docx_to_text(&bytes)?,
        other => {
            return Err(WorkerError::Extraction(format!(
                "pdf_doc extractor invoked for unsupported file_type {other:?}"
            )))
        }
    };

    let markdown = reconstruct_headings(&raw_text);
    let sections = split_markdown_by_heading(&markdown);
    let source = blob_ref.filename();

    Ok(sections
        .into_iter()
        .enumerate()
        .map(|(i, (_heading, body))| ExtractedItem {
            reference: format!("{source}#section-{}", i + 1),
            content: body,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FakeBlobStore(Vec<u8>);

    #[async_trait]
    impl BlobStore for FakeBlobStore {
        async fn fetch(&self, _reference: &BlobRef) -> Result<Vec<u8>, WorkerError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn rejects_malformed_blob_reference() {
        let job = JobMessage {
            url: "not-a-blob-ref".to_string(),
            site_map: String::new(),
            search_for_sitemap: false,
            document_id: 1,
            connector_id: 1,
            file_type: SourceKind::Pdf,
            url_recursive: false,
            collection_name: "docs".to_string(),
            model_name: "m".to_string(),
            model_dimension: 768,
            tenant_id: None,
            user_id: None,
        };
        let store = FakeBlobStore(Vec::new());
        assert!(extract(&job, &store).await.is_err());
    }
}
