use crate::utils::error::WorkerError;
use async_trait::async_trait;
use mime_guess::mime;
use tracing::debug;

/// A parsed `<scheme>:<bucket>:<object>` blob reference (spec §6). Filenames
/// are recovered as the suffix after the last `-` in `object`, matching the
/// downloader's documented convention verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef {
    pub scheme: String,
    pub bucket: String,
    pub object: String,
}

impl BlobRef {
    pub fn parse(reference: &str) -> Result<Self, WorkerError> {
        let parts: Vec<&str> = reference.splitn(3, ':').collect();
        let [scheme, bucket, object] = parts.as_slice() else {
            return Err(WorkerError::Blob(format!(
                "malformed blob reference: {reference:?}"
            )));
        };

        if bucket.is_empty() || object.is_empty() {
            return Err(WorkerError::Blob(format!(
                "malformed blob reference: {reference:?}"
            )));
        }

        Ok(Self {
            scheme: scheme.to_string(),
            bucket: bucket.to_string(),
            object: object.to_string(),
        })
    }

    pub fn filename(&self) -> &str {
        self.object.rsplit('-').next().unwrap_or(&self.object)
    }

    pub fn detect_mime(&self) -> String {
        mime_guess::from_path(self.filename())
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}

/// External collaborator seam (spec §1 excludes "the blob object store used
/// to fetch source files" itself): the PDF/DOC extractor depends on this
/// trait, not a concrete client, so a production blob store can be wired in
/// without touching extraction logic.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn fetch(&self, reference: &BlobRef) -> Result<Vec<u8>, WorkerError>;
}

/// Validates a fetched blob's size before it is handed to a parser.
pub fn validate_bytes(bytes: &[u8], max_size_mb: u64) -> Result<(), WorkerError> {
    let size_mb = bytes.len() as u64 / 1024 / 1024;
    if size_mb > max_size_mb {
        return Err(WorkerError::Extraction(format!(
            "blob too large: {size_mb} MB (max: {max_size_mb} MB)"
        )));
    }

    debug!(bytes = bytes.len(), "validated blob size");
    Ok(())
}

/// Default [`BlobStore`] wired in when no production blob client is
/// configured. The real object store (S3-compatible bucket, per spec §1) is
/// an external collaborator outside this crate's scope, same as
/// [`crate::document::extract::HeadlessRenderer`]; this stub keeps
/// PDF/DOC/TXT/MD jobs on a well-defined error path (`WorkerError::Blob`,
/// kind 1 — transient infra, nak/redeliver) instead of leaving the
/// dispatcher with no `BlobStore` to construct at all.
pub struct NullBlobStore;

#[async_trait]
impl BlobStore for NullBlobStore {
    async fn fetch(&self, reference: &BlobRef) -> Result<Vec<u8>, WorkerError> {
        Err(WorkerError::Blob(format!(
            "no blob store configured for reference {reference:?}"
        )))
    }
}

/// Whether the mime type implies a supported text-bearing document.
pub fn is_supported_mime(essence: &str) -> bool {
    essence.starts_with("text/")
        || essence == mime::APPLICATION_PDF.essence_str()
        || essence
            == "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        || essence == "application/msword"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scheme_bucket_object() {
        let parsed = BlobRef::parse("s3:my-bucket:2024-report-final.pdf").unwrap();
        assert_eq!(parsed.scheme, "s3");
        assert_eq!(parsed.bucket, "my-bucket");
        assert_eq!(parsed.object, "2024-report-final.pdf");
        assert_eq!(parsed.filename(), "final.pdf");
    }

    #[test]
    fn rejects_malformed_reference() {
        assert!(BlobRef::parse("not-a-blob-ref").is_err());
        assert!(BlobRef::parse("s3::object").is_err());
    }
}
