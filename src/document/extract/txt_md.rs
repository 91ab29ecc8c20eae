use super::{ExtractedItem, JobMessage, SourceKind};
use crate::document::loader::{validate_bytes, BlobRef, BlobStore};
use crate::document::parser::{decode_text, markdown_to_plain_text};
use crate::utils::error::WorkerError;

const MAX_BLOB_SIZE_MB: u64 = 100;

/// Fetches the whole file referenced by `job.url` and emits it as a single
/// `ExtractedItem`, flattening markdown for `Md` jobs (spec §4.2).
pub async fn extract(
    job: &JobMessage,
    blob_store: &dyn BlobStore,
) -> Result<Vec<ExtractedItem>, WorkerError> {
    let blob_ref = BlobRef::parse(&job.url)?;
    let bytes = blob_store.fetch(&blob_ref).await?;
    validate_bytes(&bytes, MAX_BLOB_SIZE_MB)?;

    let (decoded, _encoding) = decode_text(&bytes);
    let content = match job.file_type {
        SourceKind::Md => markdown_to_plain_text(&decoded),
        SourceKind::Txt => decoded,
        other => {
            return Err(WorkerError::Extraction(format!(
                "txt_md extractor invoked for unsupported file_type {other:?}"
            )))
        }
    };

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    Ok(vec![ExtractedItem {
        reference: blob_ref.filename().to_string(),
        content,
    }])
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

    fn job(file_type: SourceKind) -> JobMessage {
        JobMessage {
            url: "fs:bucket:notes-readme.txt".to_string(),
            site_map: String::new(),
            search_for_sitemap: false,
            document_id: 1,
            connector_id: 1,
            file_type,
            url_recursive: false,
            collection_name: "docs".to_string(),
            model_name: "m".to_string(),
            model_dimension: 768,
            tenant_id: None,
            user_id: None,
        }
    }

    #[tokio::test]
    async fn plain_text_passes_through_unchanged() {
        let store = FakeBlobStore(b"hello world".to_vec());
        let items = extract(&job(SourceKind::Txt), &store).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content, "hello world");
        assert_eq!(items[0].reference, "readme.txt");
    }

    #[tokio::test]
    async fn markdown_is_flattened() {
        let store = FakeBlobStore(b"# Title\n\nSome **bold** text".to_vec());
        let items = extract(&job(SourceKind::Md), &store).await.unwrap();
        assert_eq!(items.len(), 1);
        assert!(!items[0].content.contains('#'));
        assert!(!items[0].content.contains("**"));
    }

    #[tokio::test]
    async fn blank_content_yields_no_items() {
        let store = FakeBlobStore(b"   \n  ".to_vec());
        let items = extract(&job(SourceKind::Txt), &store).await.unwrap();
        assert!(items.is_empty());
    }
}
