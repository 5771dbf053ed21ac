//! Splits compressed text into numbered SMS segments

use crate::types::Segment;
use tracing::debug;

/// Max SMS payload minus room for the "i/n " prefix
pub const DEFAULT_SEGMENT_CAPACITY: usize = 1595;
pub const DEFAULT_MAX_SEGMENTS: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    capacity: usize,
    max_segments: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_SEGMENT_CAPACITY, DEFAULT_MAX_SEGMENTS)
    }
}

impl Chunker {
    pub fn new(capacity: usize, max_segments: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            max_segments,
        }
    }

    /// Consecutive pieces of at most `capacity` characters; anything past
    /// `max_segments` pieces is dropped and the totals count kept pieces only.
    pub fn chunk(&self, text: &str) -> Vec<Segment> {
        let chars: Vec<char> = text.chars().collect();
        let available = chars.len().div_ceil(self.capacity);
        let kept = available.min(self.max_segments);

        if available > kept {
            debug!(
                "Truncating {} chars to {} of {} segments",
                chars.len(),
                kept,
                available
            );
        }

        chars
            .chunks(self.capacity)
            .take(kept)
            .enumerate()
            .map(|(i, piece)| Segment {
                index: i + 1,
                total: kept,
                body: piece.iter().collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_segment() {
        let segments = Chunker::default().chunk("ΨΦabcΣhiΩΘ");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].to_string(), "1/1 ΨΦabcΣhiΩΘ");
    }

    #[test]
    fn test_long_text_truncated_to_two_segments() {
        let text = "x".repeat(4000);
        let segments = Chunker::default().chunk(&text);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].body.chars().count(), 1595);
        assert_eq!(segments[1].body.chars().count(), 1595);
        assert!(segments[0].to_string().starts_with("1/2 "));
        assert!(segments[1].to_string().starts_with("2/2 "));
    }

    #[test]
    fn test_bodies_reconstruct_prefix() {
        let chunker = Chunker::new(7, 2);
        for len in [0, 1, 6, 7, 8, 14, 15, 40] {
            let text: String = "abcdefghijΞΦΩ".chars().cycle().take(len).collect();
            let segments = chunker.chunk(&text);

            assert_eq!(segments.len(), len.div_ceil(7).min(2));
            let joined: String = segments.iter().map(|s| s.body.as_str()).collect();
            let expected: String = text.chars().take(14).collect();
            assert_eq!(joined, expected);
            for (i, segment) in segments.iter().enumerate() {
                assert_eq!(segment.index, i + 1);
                assert_eq!(segment.total, segments.len());
            }
        }
    }

    #[test]
    fn test_capacity_counts_characters_not_bytes() {
        let text = "Ω".repeat(5);
        let segments = Chunker::new(2, 5).chunk(&text);
        let bodies: Vec<&str> = segments.iter().map(|s| s.body.as_str()).collect();
        assert_eq!(bodies, vec!["ΩΩ", "ΩΩ", "Ω"]);
        assert_eq!(segments[2].to_string(), "3/3 Ω");
    }

    #[test]
    fn test_empty_text_has_no_segments() {
        assert!(Chunker::default().chunk("").is_empty());
    }
}
