use chatlens_core::config::LexicalConfig;
use chatlens_core::{ChatRecord, WordFrequencyEntry};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::emoji::{strip_emoji, EmojiSegmenter};
use crate::error::AnalysisResult;

const SPANISH_STOPWORDS: &str = include_str!("../data/stopwords_es.txt");

/// Stop-word set injected into the lexical analyzer.
///
/// Entries are stored lowercased; lookups expect lowercased tokens.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    stopwords: HashSet<String>,
}

impl StopWords {
    /// An empty set that filters nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The bundled Spanish list.
    pub fn spanish() -> Self {
        Self::from_text(SPANISH_STOPWORDS)
    }

    /// Create a set from a custom list.
    pub fn with_custom_list(stopwords: Vec<String>) -> Self {
        Self {
            stopwords: stopwords
                .into_iter()
                .map(|word| word.trim().to_lowercase())
                .filter(|word| !word.is_empty())
                .collect(),
        }
    }

    /// Parse one word per line; blank lines and `#` comments are ignored.
    pub fn from_text(text: &str) -> Self {
        Self::with_custom_list(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(String::from)
                .collect(),
        )
    }

    /// Load a stop-word file.
    pub fn from_file(path: &Path) -> AnalysisResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_text(&content))
    }

    /// Check if a word is a stopword.
    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.stopwords.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.stopwords.is_empty()
    }
}

/// Token exclusion rules for word rankings.
#[derive(Debug, Clone)]
pub struct WordFilter {
    min_word_length: usize,
    laughter_prefixes: Vec<String>,
    stopwords: StopWords,
}

impl WordFilter {
    /// Build a filter from configuration and an injected stop-word set.
    pub fn new(config: &LexicalConfig, stopwords: StopWords) -> Self {
        Self {
            min_word_length: config.min_word_length,
            laughter_prefixes: config
                .laughter_prefixes
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
            stopwords,
        }
    }

    /// Whether a raw token survives filtering. `lowered` is its lowercase form.
    fn accepts(&self, raw: &str, lowered: &str) -> bool {
        if raw.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        if raw.chars().count() < self.min_word_length {
            return false;
        }
        if self.stopwords.is_stopword(lowered) {
            return false;
        }
        !self
            .laughter_prefixes
            .iter()
            .any(|prefix| lowered.starts_with(prefix.as_str()))
    }
}

/// Remove emoji and ASCII punctuation from a message.
pub fn normalize_text(segmenter: &dyn EmojiSegmenter, text: &str) -> String {
    strip_emoji(segmenter, text)
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect()
}

/// Lowercased tokens of a message that pass the filter.
pub fn tokenize(segmenter: &dyn EmojiSegmenter, text: &str, filter: &WordFilter) -> Vec<String> {
    normalize_text(segmenter, text)
        .split_whitespace()
        .filter_map(|raw| {
            let lowered = raw.to_lowercase();
            filter.accepts(raw, &lowered).then_some(lowered)
        })
        .collect()
}

/// Most frequent words of one sender, descending by count.
///
/// Ties keep the order in which the words were first encountered.
pub fn top_words(
    records: &[ChatRecord],
    sender: &str,
    n: usize,
    filter: &WordFilter,
    segmenter: &dyn EmojiSegmenter,
) -> Vec<WordFrequencyEntry> {
    let tokens = records
        .iter()
        .filter(|r| r.sender == sender)
        .flat_map(|r| tokenize(segmenter, &r.message, filter));

    rank_first_seen(tokens, n)
        .into_iter()
        .map(|(word, count)| WordFrequencyEntry { word, count })
        .collect()
}

/// Number of distinct lowercased whitespace tokens a sender used.
pub fn unique_word_count(records: &[ChatRecord], sender: &str) -> usize {
    records
        .iter()
        .filter(|r| r.sender == sender)
        .flat_map(|r| r.message.split_whitespace())
        .map(str::to_lowercase)
        .collect::<HashSet<_>>()
        .len()
}

/// Count items and keep the `n` most frequent, ties in first-seen order.
pub(crate) fn rank_first_seen<I>(items: I, n: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = String>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for item in items {
        match index.get(&item) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(item.clone(), counts.len());
                counts.push((item, 1));
            }
        }
    }

    // sort_by is stable, which preserves first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(n);
    counts
}
