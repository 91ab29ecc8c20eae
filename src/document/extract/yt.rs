use super::{ExtractedItem, JobMessage, TranscriptService};
use crate::utils::error::WorkerError;
use url::Url;

/// Recovers a video id from the four canonical YouTube URL shapes (spec
/// §4.2): `youtu.be/<id>`, `youtube.com/watch?v=<id>`, `/embed/<id>`,
/// `/v/<id>`. Anything else returns `None`.
pub fn video_id(raw_url: &str) -> Option<String> {
    let url = Url::parse(raw_url).ok()?;
    let host = url.host_str()?;

    if host.ends_with("youtu.be") {
        return url
            .path_segments()?
            .next()
            .filter(|s| !s.is_empty())
            .map(str::to_string);
    }

    if host.ends_with("youtube.com") {
        if url.path() == "/watch" {
            return url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned());
        }

        let mut segments = url.path_segments()?;
        let first = segments.next()?;
        if first == "embed" || first == "v" {
            return segments.next().filter(|s| !s.is_empty()).map(str::to_string);
        }
    }

    None
}

/// Fetches the transcript for `job.url`'s video id and joins segment texts
/// with newlines into a single `ExtractedItem`. An unparseable URL returns
/// an empty result, not an error (spec §4.2, §8) — checked before the
/// transcript service is even consulted, so a YT job with no recoverable
/// video id is a success path regardless of whether a transcript service is
/// configured for this deployment.
pub async fn extract(
    job: &JobMessage,
    transcript_service: Option<&dyn TranscriptService>,
) -> Result<Vec<ExtractedItem>, WorkerError> {
    let Some(id) = video_id(&job.url) else {
        return Ok(Vec::new());
    };

    let service = transcript_service.ok_or_else(|| {
        WorkerError::Extraction("no transcript service configured for YT job".to_string())
    })?;

    let segments = service.fetch_transcript(&id).await?;
    if segments.is_empty() {
        return Ok(Vec::new());
    }

    let content = segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    Ok(vec![ExtractedItem {
        reference: id,
        content,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_id_from_short_link() {
        assert_eq!(
            video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn recovers_id_from_watch_query() {
        assert_eq!(
            video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10s"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn recovers_id_from_embed_and_v_paths() {
        assert_eq!(
            video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            video_id("https://www.youtube.com/v/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn unrecognized_url_yields_none() {
        assert_eq!(video_id("https://example.com/watch?v=x"), None);
        assert_eq!(video_id("not a url"), None);
    }
}
