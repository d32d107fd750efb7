//! Lyric segmentation and duration estimation
//!
//! Turns raw lyric text into ordered [`Segment`]s with an estimated
//! sung duration per line. Pure: same input and configuration always
//! produce the same document, and no I/O happens here.

use songforge_common::config::LyricsConfig;
use songforge_common::{Error, Result};

/// One lyric line with its estimated vocal duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Position within the document (0-based, gap-free)
    pub index: usize,
    /// Line text with surrounding whitespace trimmed
    pub text: String,
    /// Estimated sung duration, never below the configured floor
    pub estimated_duration_seconds: f64,
}

impl Segment {
    /// Word count of this segment
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Normalized lyrics: the raw input plus its ordered segments.
#[derive(Debug, Clone)]
pub struct LyricsDocument {
    /// Original input text, unmodified
    pub raw: String,
    /// Non-empty lyric lines in input order
    pub segments: Vec<Segment>,
}

impl LyricsDocument {
    /// Sum of all segment duration estimates
    pub fn total_duration_seconds(&self) -> f64 {
        self.segments
            .iter()
            .map(|s| s.estimated_duration_seconds)
            .sum()
    }

    /// Total word count across segments
    pub fn word_count(&self) -> usize {
        self.segments.iter().map(Segment::word_count).sum()
    }

    /// Segment texts joined for whole-document classification
    pub fn joined_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Splits lyrics into segments at a fixed words-per-second rate.
#[derive(Debug, Clone)]
pub struct LyricsProcessor {
    words_per_second: f64,
    min_segment_seconds: f64,
}

impl LyricsProcessor {
    pub fn new(config: &LyricsConfig) -> Self {
        Self {
            words_per_second: config.words_per_second,
            min_segment_seconds: config.min_segment_seconds,
        }
    }

    /// Segment raw lyric text.
    ///
    /// Blank lines and structural markers (`[Verse]`, `(Chorus)` style
    /// tags) are dropped; every remaining line becomes exactly one
    /// segment in input order. Empty input after trimming is rejected.
    pub fn process(&self, raw: &str) -> Result<LyricsDocument> {
        if raw.trim().is_empty() {
            return Err(Error::Input("Lyrics are empty".into()));
        }

        let mut segments = Vec::new();
        for line in raw.lines() {
            let text = line.trim();
            if text.is_empty() || is_structural_marker(text) {
                continue;
            }

            let words = text.split_whitespace().count();
            let estimated = (words as f64 / self.words_per_second).max(self.min_segment_seconds);

            segments.push(Segment {
                index: segments.len(),
                text: text.to_string(),
                estimated_duration_seconds: estimated,
            });
        }

        if segments.is_empty() {
            return Err(Error::Input(
                "Lyrics contain no singable lines (only markers or whitespace)".into(),
            ));
        }

        Ok(LyricsDocument {
            raw: raw.to_string(),
            segments,
        })
    }
}

/// Section tags like `[Chorus]`, `(Verse 2)`, `[Intro:]` carry no
/// singable content.
fn is_structural_marker(line: &str) -> bool {
    (line.starts_with('[') && line.ends_with(']'))
        || (line.starts_with('(') && line.ends_with(')'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> LyricsProcessor {
        LyricsProcessor::new(&LyricsConfig::default())
    }

    #[test]
    fn test_empty_input_rejected() {
        let result = processor().process("   \n\t  ");
        assert!(matches!(result, Err(Error::Input(_))));
    }

    #[test]
    fn test_marker_only_input_rejected() {
        let result = processor().process("[Verse 1]\n(Chorus)\n");
        assert!(matches!(result, Err(Error::Input(_))));
    }

    #[test]
    fn test_segments_cover_all_lines_in_order() {
        let doc = processor()
            .process("first line here\n\n[Chorus]\nsecond line\nthird line follows after\n")
            .unwrap();

        assert_eq!(doc.segments.len(), 3);
        assert_eq!(doc.segments[0].text, "first line here");
        assert_eq!(doc.segments[1].text, "second line");
        assert_eq!(doc.segments[2].text, "third line follows after");
        for (i, seg) in doc.segments.iter().enumerate() {
            assert_eq!(seg.index, i);
        }
    }

    #[test]
    fn test_duration_floor_applies() {
        // One word at 2.5 words/sec would be 0.4s without the floor
        let doc = processor().process("yeah").unwrap();
        assert_eq!(doc.segments[0].estimated_duration_seconds, 1.0);
    }

    #[test]
    fn test_duration_scales_with_words() {
        let doc = processor()
            .process("one two three four five six seven eight nine ten")
            .unwrap();
        // 10 words at 2.5 words/sec = 4s
        assert!((doc.segments[0].estimated_duration_seconds - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_total_duration_sums_segments() {
        let doc = processor().process("yeah\nyeah\nyeah").unwrap();
        assert!((doc.total_duration_seconds() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic() {
        let a = processor().process("la la la\nda da da").unwrap();
        let b = processor().process("la la la\nda da da").unwrap();
        assert_eq!(a.segments, b.segments);
    }
}
