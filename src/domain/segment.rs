use serde::{Deserialize, Serialize};

/// A typed run of content produced by the mixed-content segmenter.
///
/// Segments come out in source order and concatenating their sources (code
/// fences re-inserted) reconstructs the segmented text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    /// Plain text between fenced code blocks.
    Text { content: String },
    /// A fenced code block carrying a recognized language tag.
    Code { language: String, content: String },
}

impl Segment {
    /// Reconstructs the original source for this segment, re-inserting the
    /// fence markers around code.
    pub fn to_source(&self) -> String {
        match self {
            Segment::Text { content } => content.clone(),
            Segment::Code { language, content } => format!("```{language}\n{content}```"),
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, Segment::Code { .. })
    }
}
