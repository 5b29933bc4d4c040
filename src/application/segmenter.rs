//! Mixed-content segmentation - split a generated text blob into plain-text
//! and fenced-code runs for structured rendering.
//!
//! Implemented as an explicit outside-fence / inside-fence scanner rather
//! than one regular expression, so the unrecognized-tag and nested-fence
//! edge cases are spelled out and testable.

use crate::domain::Segment;

/// Language tags recognized as code fences out of the box.
pub const DEFAULT_LANGUAGES: &[&str] = &["java", "typescript"];

const FENCE: &str = "```";

/// Splits mixed generated output into an ordered sequence of text and code
/// segments.
///
/// A fence opens at ```` ``` ```` immediately followed by a recognized
/// language tag and a newline, and closes at the nearest following
/// ```` ``` ```` (non-greedy: a fence marker inside the body closes the
/// fence; there is no nesting). Fences with an unrecognized tag, and opening
/// markers with no closing marker anywhere after them, stay folded into the
/// surrounding text. Unknown languages are deliberately not rendered as code.
///
/// The scan is single-pass, non-overlapping and leftmost-first; segments keep
/// source order, and concatenating `Segment::to_source` over the result
/// reconstructs the input byte-for-byte. Empty input yields an empty
/// sequence.
#[derive(Debug, Clone)]
pub struct ContentSegmenter {
    languages: Vec<String>,
}

impl ContentSegmenter {
    pub fn new() -> Self {
        Self::with_languages(DEFAULT_LANGUAGES.iter().map(|s| s.to_string()))
    }

    /// A segmenter recognizing exactly the given language tags.
    pub fn with_languages(languages: impl IntoIterator<Item = String>) -> Self {
        Self {
            languages: languages.into_iter().collect(),
        }
    }

    pub fn segment(&self, text: &str) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut cursor = 0;
        let mut search_from = 0;

        while let Some(found) = text[search_from..].find(FENCE) {
            let open = search_from + found;
            let after_marker = open + FENCE.len();
            let Some(language) = self.match_language(&text[after_marker..]) else {
                // Not a recognized opening. Re-examine from the next byte so
                // overlapping marker runs are still found leftmost-first.
                search_from = open + 1;
                continue;
            };

            let body_start = after_marker + language.len() + 1;
            let Some(close) = text[body_start..].find(FENCE) else {
                // No closing marker anywhere after this point, so no later
                // fence can complete either; the rest is plain text.
                break;
            };
            let close = body_start + close;

            if open > cursor {
                segments.push(Segment::Text {
                    content: text[cursor..open].to_string(),
                });
            }
            segments.push(Segment::Code {
                language: language.to_string(),
                content: text[body_start..close].to_string(),
            });

            cursor = close + FENCE.len();
            search_from = cursor;
        }

        if cursor < text.len() {
            segments.push(Segment::Text {
                content: text[cursor..].to_string(),
            });
        }
        segments
    }

    /// Returns the tag opening a fence at `rest`, if it is on the allow-list
    /// and followed by a newline.
    fn match_language(&self, rest: &str) -> Option<&str> {
        self.languages
            .iter()
            .map(String::as_str)
            .find(|language| {
                rest.strip_prefix(*language)
                    .is_some_and(|after| after.starts_with('\n'))
            })
    }
}

impl Default for ContentSegmenter {
    fn default() -> Self {
        Self::new()
    }
}
