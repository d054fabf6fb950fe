use regex::Regex;
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{AnalysisError, AnalysisResult};

/// Splits text into emoji occurrences.
pub trait EmojiSegmenter: Send + Sync {
    /// Returns the name of the segmenter.
    fn name(&self) -> &str;

    /// Emoji substrings of `text` in order of appearance, duplicates included.
    fn segment(&self, text: &str) -> AnalysisResult<Vec<String>>;

    /// `text` with every emoji removed.
    fn strip(&self, text: &str) -> AnalysisResult<String>;
}

/// Emoji segmenter over extended grapheme clusters.
///
/// A cluster counts as one emoji when it contains an `Extended_Pictographic`
/// code point, is a regional-indicator pair (a flag) or ends in a keycap mark.
/// Skin-tone modifiers and ZWJ sequences stay inside their cluster, so "👍🏽"
/// and "👨‍👩‍👧" are each a single emoji.
pub struct GraphemeEmojiSegmenter {
    pictographic: Regex,
}

impl GraphemeEmojiSegmenter {
    /// Create a new segmenter.
    pub fn new() -> AnalysisResult<Self> {
        Ok(Self {
            pictographic: Regex::new(
                r"\p{Extended_Pictographic}|[\x{1F1E6}-\x{1F1FF}]{2}|\x{20E3}",
            )
            .map_err(|e| AnalysisError::Segmentation(e.to_string()))?,
        })
    }

    /// Whether a single grapheme cluster is an emoji.
    pub fn is_emoji_cluster(&self, cluster: &str) -> bool {
        self.pictographic.is_match(cluster)
    }
}

impl EmojiSegmenter for GraphemeEmojiSegmenter {
    fn name(&self) -> &str {
        "grapheme"
    }

    fn segment(&self, text: &str) -> AnalysisResult<Vec<String>> {
        Ok(text
            .graphemes(true)
            .filter(|g| self.is_emoji_cluster(g))
            .map(String::from)
            .collect())
    }

    fn strip(&self, text: &str) -> AnalysisResult<String> {
        Ok(text
            .graphemes(true)
            .filter(|g| !self.is_emoji_cluster(g))
            .collect())
    }
}

/// Emoji in a message, or none when segmentation fails.
pub fn extract_emoji(segmenter: &dyn EmojiSegmenter, message: &str) -> Vec<String> {
    match segmenter.segment(message) {
        Ok(found) => found,
        Err(e) => {
            warn!("{} segmentation failed, counting no emoji: {}", segmenter.name(), e);
            Vec::new()
        }
    }
}

/// Message with emoji removed, or unchanged when segmentation fails.
pub fn strip_emoji(segmenter: &dyn EmojiSegmenter, text: &str) -> String {
    match segmenter.strip(text) {
        Ok(stripped) => stripped,
        Err(e) => {
            warn!("{} could not strip emoji: {}", segmenter.name(), e);
            text.to_string()
        }
    }
}
