use ingest_worker::document::extract::{self, ExtractDeps, JobMessage, SourceKind};
use ingest_worker::document::loader::NullBlobStore;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn job(url: String, recursive: bool) -> JobMessage {
    JobMessage {
        url,
        site_map: String::new(),
        search_for_sitemap: false,
        document_id: 1,
        connector_id: 1,
        file_type: SourceKind::Url,
        url_recursive: recursive,
        collection_name: "docs".to_string(),
        model_name: "bge-small".to_string(),
        model_dimension: 384,
        tenant_id: None,
        user_id: None,
    }
}

/// Scenario 1 (spec §8): a single page, recursion disabled, with three
/// paragraphs. Expect exactly one extracted item whose text is the three
/// paragraphs joined by blank lines.
#[tokio::test]
async fn single_page_no_recursion_yields_one_item() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><p>alpha section text</p><p>beta section text</p><p>gamma section text</p></body></html>",
        ))
        .mount(&server)
        .await;

    let seed = format!("{}/a", server.uri());
    let job = job(seed, false);
    let http = reqwest::Client::new();
    let store = NullBlobStore;

    let deps = ExtractDeps {
        http: &http,
        blob_store: &store,
        headless: None,
        transcript_service: None,
        max_crawl_depth: 3,
        max_crawl_pages: 50,
    };

    let items = extract::extract(&job, &deps).await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].content,
        "alpha section text\n\nbeta section text\n\ngamma section text"
    );
}

/// Boundary case (spec §8): a crawl where every discovered link leaves the
/// base domain yields exactly one item — the seed page.
#[tokio::test]
async fn crawl_with_only_external_links_yields_seed_page_only() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <p>seed page content long enough</p>
                <a href="https://elsewhere.example.com/other">leave</a>
            </body></html>"#,
        ))
        .mount(&server)
        .await;

    let seed = format!("{}/a", server.uri());
    let job = job(seed, true);
    let http = reqwest::Client::new();
    let store = NullBlobStore;

    let deps = ExtractDeps {
        http: &http,
        blob_store: &store,
        headless: None,
        transcript_service: None,
        max_crawl_depth: 3,
        max_crawl_pages: 50,
    };

    let items = extract::extract(&job, &deps).await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].content, "seed page content long enough");
}

/// A recursive crawl following a same-host link picks up both pages.
#[tokio::test]
async fn recursive_crawl_follows_same_host_links() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><p>first page paragraph</p><a href="/b">next</a></body></html>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><p>second page paragraph</p></body></html>",
        ))
        .mount(&server)
        .await;

    let seed = format!("{}/a", server.uri());
    let job = job(seed, true);
    let http = reqwest::Client::new();
    let store = NullBlobStore;

    let deps = ExtractDeps {
        http: &http,
        blob_store: &store,
        headless: None,
        transcript_service: None,
        max_crawl_depth: 3,
        max_crawl_pages: 50,
    };

    let items = extract::extract(&job, &deps).await.unwrap();

    assert_eq!(items.len(), 2);
    assert!(items.iter().any(|i| i.content == "first page paragraph"));
    assert!(items.iter().any(|i| i.content == "second page paragraph"));
}
