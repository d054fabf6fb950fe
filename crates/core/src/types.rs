use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::CANONICAL_TIMESTAMP_FORMAT;

/// Calendar season bucket.
///
/// December wraps around into the same bucket as January and February.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Season {
    /// December, January, February.
    Winter,

    /// March through May.
    Spring,

    /// June through August.
    Summer,

    /// September through November.
    Fall,
}

impl Season {
    /// All seasons in calendar order starting from Winter.
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Fall];

    /// Map a calendar month (1-12) to its season.
    ///
    /// Returns `None` for values outside 1-12.
    pub fn from_month(month: u32) -> Option<Self> {
        match month {
            12 | 1 | 2 => Some(Season::Winter),
            3..=5 => Some(Season::Spring),
            6..=8 => Some(Season::Summer),
            9..=11 => Some(Season::Fall),
            _ => None,
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// One validated transcript entry with its derived temporal features.
///
/// Records are produced by the transcript parser and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    /// Local timestamp of the message, minute precision.
    pub timestamp: NaiveDateTime,

    /// Display name of the sender.
    pub sender: String,

    /// Message body, possibly empty.
    pub message: String,

    /// Day of week, Monday = 0.
    pub day_of_week: u8,

    /// Season bucket of the timestamp's month.
    pub season: Season,

    /// Hour of day, 0-23.
    pub hour_of_day: u8,
}

impl ChatRecord {
    /// Render the record back into the canonical export line.
    pub fn to_line(&self) -> String {
        format!(
            "{} - {}: {}",
            self.timestamp.format(CANONICAL_TIMESTAMP_FORMAT),
            self.sender,
            self.message
        )
    }
}

/// Word usage count for one sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFrequencyEntry {
    /// Lowercased token.
    pub word: String,

    /// Number of occurrences, always positive.
    pub count: usize,
}

/// Emoji usage count for one sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiFrequencyEntry {
    /// Emoji grapheme.
    pub emoji: String,

    /// Number of occurrences, always positive.
    pub count: usize,
}

/// Three-way sentiment distribution for a single emoji.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmojiSentimentScore {
    /// Emoji grapheme this score belongs to.
    pub emoji: String,

    /// Negative probability.
    pub negative: f64,

    /// Neutral probability.
    pub neutral: f64,

    /// Positive probability.
    pub positive: f64,
}

impl EmojiSentimentScore {
    /// Build a score from probabilities ordered `[negative, neutral, positive]`.
    pub fn from_probabilities(emoji: impl Into<String>, probs: [f64; 3]) -> Self {
        Self {
            emoji: emoji.into(),
            negative: probs[0],
            neutral: probs[1],
            positive: probs[2],
        }
    }

    /// The degraded all-zero score used when classification fails.
    pub fn zero(emoji: impl Into<String>) -> Self {
        Self::from_probabilities(emoji, [0.0; 3])
    }

    /// Whether this is the degraded all-zero score.
    pub fn is_degraded(&self) -> bool {
        self.negative == 0.0 && self.neutral == 0.0 && self.positive == 0.0
    }

}
