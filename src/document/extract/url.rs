use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};
use url::Url;

use super::{ExtractedItem, HeadlessRenderer, JobMessage};
use crate::document::parser::select_text;
use crate::utils::error::WorkerError;

const TEXT_SELECTORS: &[&str] = &["p", "article", "div"];
const MIN_FRAGMENT_CHARS: usize = 10;

/// Breadth-first same-host crawl, generalizing the teacher's
/// `original_source/.../chunker_url.py` BS4 spider: `job.url` is the seed,
/// links are followed only when `job.url_recursive` is set, only same-host
/// `http`/`https` links without a fragment are queued, and the crawl stops
/// at `max_depth` or `max_pages` — whichever comes first.
///
/// If the whole crawl yields no text at all, a single headless-render
/// attempt on the seed URL is made when a [`HeadlessRenderer`] is configured,
/// mirroring the original's fallback to a Selenium-backed spider for
/// JS-rendered pages.
pub async fn extract(
    job: &JobMessage,
    client: &reqwest::Client,
    headless: Option<&dyn HeadlessRenderer>,
    max_depth: usize,
    max_pages: usize,
) -> Result<Vec<ExtractedItem>, WorkerError> {
    let seed = Url::parse(&job.url)
        .map_err(|e| WorkerError::Extraction(format!("invalid seed url {:?}: {e}", job.url)))?;
    let seed_host = seed.host_str().map(|h| h.to_string());

    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(Url, usize)> = VecDeque::new();
    queue.push_back((seed.clone(), 0));

    let mut items = Vec::new();

    while let Some((page_url, depth)) = queue.pop_front() {
        if visited.len() >= max_pages {
            debug!(max_pages, "url crawl reached page budget");
            break;
        }

        let key = page_url.as_str().trim_end_matches('/').to_string();
        if !visited.insert(key) {
            continue;
        }

        let html = match client.get(page_url.clone()).send().await {
            Ok(resp) => match resp.error_for_status() {
                Ok(resp) => match resp.text().await {
                    Ok(body) => body,
                    Err(e) => {
                        warn!(url = %page_url, "failed to read response body: {e}");
                        continue;
                    }
                },
                Err(e) => {
                    warn!(url = %page_url, "non-success status fetching page: {e}");
                    continue;
                }
            },
            Err(e) => {
                warn!(url = %page_url, "failed to fetch page: {e}");
                continue;
            }
        };

        if let Some(text) = extract_page_text(&html) {
            items.push(ExtractedItem {
                reference: page_url.to_string(),
                content: text,
            });
        }

        if !job.url_recursive || depth >= max_depth {
            continue;
        }

        for link in discover_links(&html, &page_url, seed_host.as_deref()) {
            let link_key = link.as_str().trim_end_matches('/').to_string();
            if !visited.contains(&link_key) {
                queue.push_back((link, depth + 1));
            }
        }
    }

    if items.is_empty() {
        if let Some(renderer) = headless {
            debug!(url = %seed, "html extraction empty, falling back to headless render");
            let rendered = renderer.render(seed.as_str()).await?;
            let trimmed = rendered.trim();
            if !trimmed.is_empty() {
                items.push(ExtractedItem {
                    reference: seed.to_string(),
                    content: trimmed.to_string(),
                });
            }
        }
    }

    Ok(items)
}

fn extract_page_text(html: &str) -> Option<String> {
    let mut seen = HashSet::new();
    let mut fragments = Vec::new();

    for fragment in select_text(html, TEXT_SELECTORS) {
        if fragment.chars().count() < MIN_FRAGMENT_CHARS {
            continue;
        }
        if seen.insert(fragment.clone()) {
            fragments.push(fragment);
        }
    }

    if fragments.is_empty() {
        None
    } else {
        Some(fragments.join("\n\n"))
    }
}

fn discover_links(html: &str, base: &Url, same_host: Option<&str>) -> Vec<Url> {
    use scraper::{Html, Selector};

    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut links = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href) else {
            continue;
        };

        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }
        if resolved.fragment().is_some() {
            continue;
        }
        if resolved.host_str() != same_host {
            continue;
        }

        links.push(resolved);
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_only_same_host_links() {
        let base = Url::parse("https://docs.example.com/guide").unwrap();
        let html = r#"
            <a href="/guide/next">next</a>
            <a href="https://other.example.com/page">other</a>
            <a href="https://docs.example.com/guide#section">fragment</a>
            <a href="mailto:hi@example.com">mail</a>
        "#;
        let links = discover_links(html, &base, Some("docs.example.com"));
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].path(), "/guide/next");
    }

    #[test]
    fn extract_page_text_drops_short_and_duplicate_fragments() {
        let html = "<html><body><p>hi</p><p>a proper sentence here</p><p>a proper sentence here</p></body></html>";
        let text = extract_page_text(html).unwrap();
        assert_eq!(text, "a proper sentence here");
    }

    #[test]
    fn extract_page_text_none_when_everything_filtered() {
        assert!(extract_page_text("<html><body><p>hi</p></body></html>").is_none());
    }
}
