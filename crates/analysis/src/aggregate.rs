use chatlens_core::config::TotalsWeighting;
use chatlens_core::{ChatRecord, EmojiFrequencyEntry, EmojiSentimentScore, Season, WordFrequencyEntry};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, instrument};

use crate::emoji::{extract_emoji, EmojiSegmenter};
use crate::nlp::{self, rank_first_seen, WordFilter};
use crate::sentiment::SentimentCache;

/// Knobs for [`summarize`].
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    /// Words kept per sender.
    pub word_top_n: usize,
    /// Emoji kept per sender, both for counts and for the sentiment table.
    pub emoji_top_n: usize,
    /// How emoji scores combine into per-sender totals.
    pub weighting: TotalsWeighting,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            word_top_n: chatlens_core::constants::DEFAULT_TOP_N,
            emoji_top_n: chatlens_core::constants::DEFAULT_TOP_N,
            weighting: TotalsWeighting::Frequency,
        }
    }
}

/// Ranked words of one sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderWordStats {
    /// Sender name.
    pub sender: String,
    /// Words, most frequent first.
    pub words: Vec<WordFrequencyEntry>,
}

/// Ranked emoji of one sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderEmojiStats {
    /// Sender name.
    pub sender: String,
    /// Emoji, most frequent first.
    pub emoji: Vec<EmojiFrequencyEntry>,
}

/// Summed emoji sentiment of one sender, rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmojiSentimentTotals {
    /// Sender name.
    pub sender: String,
    /// Total negative score.
    pub negative: f64,
    /// Total neutral score.
    pub neutral: f64,
    /// Total positive score.
    pub positive: f64,
}

/// Distinct emoji of one sender with their scores, most positive first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderEmojiSentiment {
    /// Sender name.
    pub sender: String,
    /// Scores, highest `positive` first.
    pub scores: Vec<EmojiSentimentScore>,
}

/// Vocabulary size of one sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconEntry {
    /// Sender name.
    pub sender: String,
    /// Distinct lowercased tokens.
    pub unique_words: usize,
}

/// Messages on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyActivity {
    /// Calendar day.
    pub date: NaiveDate,
    /// Season of that day.
    pub season: Season,
    /// Message count.
    pub messages: usize,
}

/// Messages per weekday and season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyActivity {
    /// Monday-based weekday.
    pub day_of_week: u8,
    /// Season bucket.
    pub season: Season,
    /// Message count.
    pub messages: usize,
}

/// Messages per weekday, hour and season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyActivity {
    /// Monday-based weekday.
    pub day_of_week: u8,
    /// Hour of day.
    pub hour_of_day: u8,
    /// Season bucket.
    pub season: Season,
    /// Message count.
    pub messages: usize,
}

/// Corpus-wide message counts; only non-empty cells, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTables {
    /// Per calendar day.
    pub daily: Vec<DailyActivity>,
    /// Per weekday and season.
    pub weekly: Vec<WeeklyActivity>,
    /// Per weekday, hour and season.
    pub hourly: Vec<HourlyActivity>,
}

/// Every table produced for a transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Senders in order of first appearance.
    pub senders: Vec<String>,
    /// Top words per sender.
    pub per_sender_word_stats: Vec<SenderWordStats>,
    /// Top emoji per sender.
    pub per_sender_emoji_stats: Vec<SenderEmojiStats>,
    /// Emoji sentiment totals per sender.
    pub emoji_sentiment_totals: Vec<EmojiSentimentTotals>,
    /// Most positive emoji per sender.
    pub per_sender_emoji_sentiment: Vec<SenderEmojiSentiment>,
    /// Vocabulary size per sender, largest first.
    pub lexicon: Vec<LexiconEntry>,
    /// Message counts by time bucket.
    pub activity: ActivityTables,
}

/// Distinct senders in order of first appearance.
pub fn senders_in_order(records: &[ChatRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.sender.as_str()))
        .map(|r| r.sender.clone())
        .collect()
}

/// Every emoji a sender used with its occurrence count, first-seen order.
pub fn emoji_counts(
    records: &[ChatRecord],
    sender: &str,
    segmenter: &dyn EmojiSegmenter,
) -> Vec<(String, usize)> {
    let occurrences = records
        .iter()
        .filter(|r| r.sender == sender)
        .flat_map(|r| extract_emoji(segmenter, &r.message));
    rank_first_seen(occurrences, usize::MAX)
}

/// Most used emoji of one sender.
pub fn top_emoji(
    records: &[ChatRecord],
    sender: &str,
    n: usize,
    segmenter: &dyn EmojiSegmenter,
) -> Vec<EmojiFrequencyEntry> {
    emoji_counts(records, sender, segmenter)
        .into_iter()
        .take(n)
        .map(|(emoji, count)| EmojiFrequencyEntry { emoji, count })
        .collect()
}

/// Sum the cached scores of a sender's emoji.
///
/// With [`TotalsWeighting::Frequency`] every occurrence contributes; with
/// [`TotalsWeighting::Distinct`] each distinct emoji contributes once.
pub fn sentiment_totals(
    sender: &str,
    counts: &[(String, usize)],
    cache: &mut SentimentCache,
    weighting: TotalsWeighting,
) -> EmojiSentimentTotals {
    let mut sums = [0.0f64; 3];
    for (emoji, count) in counts {
        let weight = match weighting {
            TotalsWeighting::Frequency => *count as f64,
            TotalsWeighting::Distinct => 1.0,
        };
        let score = cache.score_of(emoji);
        sums[0] += score.negative * weight;
        sums[1] += score.neutral * weight;
        sums[2] += score.positive * weight;
    }

    EmojiSentimentTotals {
        sender: sender.to_string(),
        negative: round2(sums[0]),
        neutral: round2(sums[1]),
        positive: round2(sums[2]),
    }
}

/// Scores of a sender's distinct emoji, highest `positive` first.
pub fn emoji_sentiment_table(
    counts: &[(String, usize)],
    cache: &mut SentimentCache,
    n: usize,
) -> Vec<EmojiSentimentScore> {
    let mut scores: Vec<EmojiSentimentScore> =
        counts.iter().map(|(emoji, _)| cache.score_of(emoji)).collect();
    scores.sort_by(|a, b| b.positive.total_cmp(&a.positive));
    scores.truncate(n);
    scores
}

/// Vocabulary size of every sender, largest first.
pub fn lexicon(records: &[ChatRecord], senders: &[String]) -> Vec<LexiconEntry> {
    let mut entries: Vec<LexiconEntry> = senders
        .iter()
        .map(|sender| LexiconEntry {
            sender: sender.clone(),
            unique_words: nlp::unique_word_count(records, sender),
        })
        .collect();
    entries.sort_by(|a, b| b.unique_words.cmp(&a.unique_words));
    entries
}

/// Message counts by day, weekday and hour.
pub fn activity_tables(records: &[ChatRecord]) -> ActivityTables {
    let mut daily: BTreeMap<(NaiveDate, Season), usize> = BTreeMap::new();
    let mut weekly: BTreeMap<(u8, Season), usize> = BTreeMap::new();
    let mut hourly: BTreeMap<(u8, u8, Season), usize> = BTreeMap::new();

    for record in records {
        *daily
            .entry((record.timestamp.date(), record.season))
            .or_default() += 1;
        *weekly
            .entry((record.day_of_week, record.season))
            .or_default() += 1;
        *hourly
            .entry((record.day_of_week, record.hour_of_day, record.season))
            .or_default() += 1;
    }

    ActivityTables {
        daily: daily
            .into_iter()
            .map(|((date, season), messages)| DailyActivity {
                date,
                season,
                messages,
            })
            .collect(),
        weekly: weekly
            .into_iter()
            .map(|((day_of_week, season), messages)| WeeklyActivity {
                day_of_week,
                season,
                messages,
            })
            .collect(),
        hourly: hourly
            .into_iter()
            .map(|((day_of_week, hour_of_day, season), messages)| HourlyActivity {
                day_of_week,
                hour_of_day,
                season,
                messages,
            })
            .collect(),
    }
}

/// Build every summary table for a set of records.
///
/// Emoji missing from `cache` are classified synchronously; callers that want
/// the bounded pool should prime the cache with
/// [`SentimentCache::score_all`] first.
#[instrument(skip_all, fields(records = records.len()))]
pub fn summarize(
    records: &[ChatRecord],
    cache: &mut SentimentCache,
    filter: &WordFilter,
    segmenter: &dyn EmojiSegmenter,
    options: &SummaryOptions,
) -> Summary {
    let senders = senders_in_order(records);
    let mut summary = Summary {
        senders: senders.clone(),
        lexicon: lexicon(records, &senders),
        activity: activity_tables(records),
        ..Summary::default()
    };

    for sender in &senders {
        summary.per_sender_word_stats.push(SenderWordStats {
            sender: sender.clone(),
            words: nlp::top_words(records, sender, options.word_top_n, filter, segmenter),
        });

        let counts = emoji_counts(records, sender, segmenter);
        summary.per_sender_emoji_stats.push(SenderEmojiStats {
            sender: sender.clone(),
            emoji: counts
                .iter()
                .take(options.emoji_top_n)
                .map(|(emoji, count)| EmojiFrequencyEntry {
                    emoji: emoji.clone(),
                    count: *count,
                })
                .collect(),
        });
        summary
            .emoji_sentiment_totals
            .push(sentiment_totals(sender, &counts, cache, options.weighting));
        summary
            .per_sender_emoji_sentiment
            .push(SenderEmojiSentiment {
                sender: sender.clone(),
                scores: emoji_sentiment_table(&counts, cache, options.emoji_top_n),
            });
    }

    debug!("summarized {} senders", senders.len());
    summary
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emoji::GraphemeEmojiSegmenter;
    use crate::error::AnalysisResult;
    use crate::features;
    use crate::ml::{SentimentModel, NUM_CLASSES};
    use crate::nlp::StopWords;
    use crate::parsers::ParsedLine;
    use chatlens_core::config::LexicalConfig;
    use chrono::NaiveDateTime;
    use std::sync::Arc;

    struct FixedModel;

    impl SentimentModel for FixedModel {
        fn classify(&self, text: &str) -> AnalysisResult<[f32; NUM_CLASSES]> {
            Ok(match text {
                "😢" => [4.0, 1.0, 0.0],
                _ => [0.0, 1.0, 4.0],
            })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn record(stamp: &str, sender: &str, message: &str) -> ChatRecord {
        features::derive(ParsedLine {
            timestamp: NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M").unwrap(),
            sender: sender.to_string(),
            message: message.to_string(),
        })
    }

    fn corpus() -> Vec<ChatRecord> {
        vec![
            record("2023-01-05 09:15", "Ana", "hola 😀 playa"),
            record("2023-01-05 09:40", "Bob", "😢 lluvia lluvia"),
            record("2023-01-05 21:00", "Ana", "😀😀 playa 😢"),
            record("2023-06-10 21:30", "Bob", "verano 🎉"),
        ]
    }

    fn summarize_corpus(records: &[ChatRecord], weighting: TotalsWeighting) -> Summary {
        let segmenter = GraphemeEmojiSegmenter::new().unwrap();
        let filter = WordFilter::new(&LexicalConfig::default(), StopWords::spanish());
        let mut cache = SentimentCache::new(Arc::new(FixedModel));
        summarize(
            records,
            &mut cache,
            &filter,
            &segmenter,
            &SummaryOptions {
                weighting,
                ..SummaryOptions::default()
            },
        )
    }

    #[test]
    fn empty_corpus_gives_empty_tables() {
        let summary = summarize_corpus(&[], TotalsWeighting::Frequency);
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn senders_keep_first_appearance_order() {
        let summary = summarize_corpus(&corpus(), TotalsWeighting::Frequency);
        assert_eq!(summary.senders, vec!["Ana", "Bob"]);
        assert_eq!(summary.per_sender_word_stats[0].sender, "Ana");
        assert_eq!(summary.per_sender_word_stats[0].words[0].word, "playa");
        assert_eq!(summary.per_sender_word_stats[1].words[0].word, "lluvia");
    }

    #[test]
    fn emoji_counts_rank_by_frequency() {
        let summary = summarize_corpus(&corpus(), TotalsWeighting::Frequency);
        let ana = &summary.per_sender_emoji_stats[0].emoji;
        assert_eq!(ana[0], EmojiFrequencyEntry { emoji: "😀".to_string(), count: 3 });
        assert_eq!(ana[1], EmojiFrequencyEntry { emoji: "😢".to_string(), count: 1 });
    }

    #[test]
    fn totals_are_weighted_by_occurrence() {
        let weighted = summarize_corpus(&corpus(), TotalsWeighting::Frequency);
        let ana = &weighted.emoji_sentiment_totals[0];
        assert!(ana.positive > 2.5);
        assert!(ana.positive > ana.negative * 2.0);
        let sum = ana.negative + ana.neutral + ana.positive;
        assert!((sum - 4.0).abs() < 0.02);

        let distinct = summarize_corpus(&corpus(), TotalsWeighting::Distinct);
        let ana_distinct = &distinct.emoji_sentiment_totals[0];
        let sum = ana_distinct.negative + ana_distinct.neutral + ana_distinct.positive;
        assert!((sum - 2.0).abs() < 0.02);
        assert!(ana_distinct.positive < ana.positive);
    }

    #[test]
    fn totals_are_rounded_to_two_decimals() {
        let summary = summarize_corpus(&corpus(), TotalsWeighting::Frequency);
        for totals in &summary.emoji_sentiment_totals {
            for value in [totals.negative, totals.neutral, totals.positive] {
                assert!(((value * 100.0).round() - value * 100.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn sentiment_table_orders_by_positive() {
        let summary = summarize_corpus(&corpus(), TotalsWeighting::Frequency);
        let bob = &summary.per_sender_emoji_sentiment[1];
        assert_eq!(bob.scores[0].emoji, "🎉");
        assert_eq!(bob.scores[1].emoji, "😢");
    }

    #[test]
    fn activity_tables_bucket_messages() {
        let summary = summarize_corpus(&corpus(), TotalsWeighting::Frequency);
        let activity = &summary.activity;
        assert_eq!(activity.daily.len(), 2);
        assert_eq!(activity.daily[0].messages, 3);
        assert_eq!(activity.daily[0].season, Season::Winter);
        assert_eq!(activity.daily[1].season, Season::Summer);

        // Thursday winter, Saturday summer
        assert_eq!(
            activity.weekly,
            vec![
                WeeklyActivity { day_of_week: 3, season: Season::Winter, messages: 3 },
                WeeklyActivity { day_of_week: 5, season: Season::Summer, messages: 1 },
            ]
        );
        assert_eq!(activity.hourly.len(), 3);
        assert_eq!(activity.hourly[0].hour_of_day, 9);
        assert_eq!(activity.hourly[0].messages, 2);
    }

    #[test]
    fn lexicon_sorts_largest_first() {
        let records = corpus();
        let entries = lexicon(&records, &senders_in_order(&records));
        // Bob: "😢", "lluvia", "verano", "🎉"; Ana: "hola", "😀", "playa", "😀😀", "😢"
        assert_eq!(entries[0], LexiconEntry { sender: "Ana".to_string(), unique_words: 5 });
        assert_eq!(entries[1], LexiconEntry { sender: "Bob".to_string(), unique_words: 4 });
    }
}
