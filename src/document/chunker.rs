use tracing::debug;

/// A bounded, overlap-aware substring produced by [`LineBoundedChunker`],
/// carrying forward the `reference` of the [`crate::document::extract::ExtractedItem`]
/// it was split from.
#[derive(Debug, Clone)]
pub struct TextChunk {
    pub index: usize,
    pub reference: String,
    pub content: String,
    pub char_count: usize,
}

/// Hard store limit (spec §4.1/§4.4): any single stored atom is truncated to
/// this many bytes at a UTF-8-safe boundary before it reaches the vector
/// store. Enforced here defensively and again in `vectorstore::gateway`.
pub const MAX_STORE_BYTES: usize = 65_535;

#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    pub max_len: usize,
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_len: 500,
            overlap: 3,
        }
    }
}

/// The teacher ships three interchangeable chunk strategies
/// (`chunk_semantic`/`chunk_fixed`/`chunk_recursive`); this is `chunk_fixed`
/// generalized to prefer the last `\n` inside the length window, matching
/// spec §4.1's "splitting prefers line boundaries" contract. Deterministic
/// given `(text, config)` — no RNG, no wall-clock reads.
pub struct LineBoundedChunker {
    config: ChunkerConfig,
}

impl LineBoundedChunker {
    pub fn new(max_len: usize, overlap: usize) -> Self {
        Self {
            config: ChunkerConfig { max_len, overlap },
        }
    }

    pub fn split(&self, text: &str, reference: &str) -> Vec<TextChunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let max_len = self.config.max_len.max(1);
        let overlap = self.config.overlap.min(max_len.saturating_sub(1));

        let mut chunks = Vec::new();
        let mut start = 0usize;
        let mut index = 0usize;

        while start < total {
            let window_end = (start + max_len).min(total);
            let mut split_at = window_end;

            if window_end < total {
                // Prefer the last line boundary inside the window so a chunk
                // never cuts a line in half when it doesn't have to.
                for i in (start + 1..window_end).rev() {
                    if chars[i] == '\n' {
                        split_at = i + 1;
                        break;
                    }
                }
            }

            let content: String = chars[start..split_at].iter().collect();
            let trimmed = content.trim();

            if !trimmed.is_empty() {
                let stored = truncate_to_store_limit(trimmed);
                chunks.push(TextChunk {
                    index,
                    reference: reference.to_string(),
                    char_count: stored.chars().count(),
                    content: stored,
                });
                index += 1;
            }

            if split_at >= total {
                break;
            }

            let next_start = split_at.saturating_sub(overlap);
            start = if next_start > start { next_start } else { split_at };
        }

        debug!(
            chunks = chunks.len(),
            reference, "split text into line-bounded chunks"
        );

        chunks
    }
}

/// Truncates `text` at the last UTF-8 char boundary at or before
/// [`MAX_STORE_BYTES`] bytes. No-op when already within the limit.
pub fn truncate_to_store_limit(text: &str) -> String {
    if text.len() <= MAX_STORE_BYTES {
        return text.to_string();
    }

    let mut end = MAX_STORE_BYTES;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }

    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunker = LineBoundedChunker::new(500, 3);
        assert!(chunker.split("   \n  ", "ref").is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunker = LineBoundedChunker::new(500, 3);
        let chunks = chunker.split("alpha\n\nbeta\n\ngamma", "ref");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "alpha\n\nbeta\n\ngamma");
    }

    #[test]
    fn every_chunk_is_non_empty_and_bounded() {
        let chunker = LineBoundedChunker::new(20, 3);
        let text = "line one\nline two\nline three\nline four\nline five\n";
        let chunks = chunker.split(text, "ref");
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(!chunk.content.is_empty());
            assert!(chunk.content.chars().count() <= 20);
        }
    }

    #[test]
    fn splitting_is_deterministic() {
        let chunker = LineBoundedChunker::new(50, 5);
        let text = "a".repeat(40) + "\n" + &"b".repeat(40) + "\n" + &"c".repeat(40);
        let first = chunker.split(&text, "ref");
        let second = chunker.split(&text, "ref");
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.content, b.content);
        }
    }

    #[test]
    fn oversized_single_atom_is_truncated_before_chunking() {
        let huge = "x".repeat(MAX_STORE_BYTES + 500);
        let truncated = truncate_to_store_limit(&huge);
        assert!(truncated.len() <= MAX_STORE_BYTES);
    }
}
