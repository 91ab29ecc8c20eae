use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use ingest_worker::document::extract::{ExtractDeps, JobMessage, SourceKind};
use ingest_worker::document::loader::NullBlobStore;
use ingest_worker::utils::error::WorkerError;

// Hand-rolled fakes, matching this crate's existing `FakeBlobStore` pattern
// (see src/document/extract/txt_md.rs) rather than mockall-generated mocks —
// no trait in this crate is annotated `#[automock]`, and nothing anywhere in
// the retrieval pack exercises that attribute despite `mockall` sitting in
// several sibling crates' `[dev-dependencies]` unused.

fn sample_job(file_type: SourceKind, url: &str) -> JobMessage {
    JobMessage {
        url: url.to_string(),
        site_map: String::new(),
        search_for_sitemap: false,
        document_id: 42,
        connector_id: 7,
        file_type,
        url_recursive: false,
        collection_name: "docs".to_string(),
        model_name: "bge-small".to_string(),
        model_dimension: 384,
        tenant_id: None,
        user_id: None,
    }
}

struct CountingBlobStore {
    calls: AtomicU64,
    payload: Vec<u8>,
}

#[async_trait]
impl ingest_worker::document::loader::BlobStore for CountingBlobStore {
    async fn fetch(
        &self,
        _reference: &ingest_worker::document::loader::BlobRef,
    ) -> Result<Vec<u8>, WorkerError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.payload.clone())
    }
}

#[tokio::test]
async fn txt_job_extracts_through_the_real_extract_dispatch() {
    let store = CountingBlobStore {
        calls: AtomicU64::new(0),
        payload: b"hello from the fake blob store".to_vec(),
    };
    let job = sample_job(SourceKind::Txt, "fs:bucket:notes-report.txt");
    let http = reqwest::Client::new();

    let deps = ExtractDeps {
        http: &http,
        blob_store: &store,
        headless: None,
        transcript_service: None,
        max_crawl_depth: 3,
        max_crawl_pages: 50,
    };

    let items = ingest_worker::document::extract::extract(&job, &deps)
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].content, "hello from the fake blob store");
    assert_eq!(store.calls.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn null_blob_store_surfaces_as_a_blob_error_not_a_panic() {
    let store = NullBlobStore;
    let job = sample_job(SourceKind::Pdf, "s3:bucket:report-final.pdf");
    let http = reqwest::Client::new();

    let deps = ExtractDeps {
        http: &http,
        blob_store: &store,
        headless: None,
        transcript_service: None,
        max_crawl_depth: 3,
        max_crawl_pages: 50,
    };

    let err = ingest_worker::document::extract::extract(&job, &deps)
        .await
        .unwrap_err();

    assert!(matches!(err, WorkerError::Blob(_)));
}

#[test]
fn job_message_rejects_poison_shapes() {
    let bad_document_id = ingest_worker::pb::job::Job {
        url: "https://example.com".to_string(),
        site_map: String::new(),
        search_for_sitemap: false,
        document_id: 0,
        connector_id: 1,
        file_type: 0,
        url_recursive: false,
        collection_name: "docs".to_string(),
        model_name: "m".to_string(),
        model_dimension: 384,
        tenant_id: None,
        user_id: None,
    };
    assert!(JobMessage::from_proto(bad_document_id).is_err());

    let empty_url_for_url_job = ingest_worker::pb::job::Job {
        url: "".to_string(),
        site_map: String::new(),
        search_for_sitemap: false,
        document_id: 1,
        connector_id: 1,
        file_type: 0,
        url_recursive: false,
        collection_name: "docs".to_string(),
        model_name: "m".to_string(),
        model_dimension: 384,
        tenant_id: None,
        user_id: None,
    };
    assert!(JobMessage::from_proto(empty_url_for_url_job).is_err());
}

#[test]
fn job_message_round_trips_through_its_wire_form() {
    let job = sample_job(SourceKind::Yt, "https://youtu.be/dQw4w9WgXcQ");
    let proto = job.to_proto();
    let decoded = JobMessage::from_proto(proto).unwrap();

    assert_eq!(decoded.document_id, job.document_id);
    assert_eq!(decoded.url, job.url);
    assert_eq!(decoded.file_type, job.file_type);
    assert_eq!(decoded.collection_name, job.collection_name);
}
