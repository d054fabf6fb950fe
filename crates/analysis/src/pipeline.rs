use chatlens_core::ChatlensConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::aggregate::{summarize, Summary, SummaryOptions};
use crate::emoji::{extract_emoji, EmojiSegmenter, GraphemeEmojiSegmenter};
use crate::error::AnalysisResult;
use crate::ml::{gpu, CandleSentimentModel, SentimentModel, UnavailableModel};
use crate::nlp::{StopWords, WordFilter};
use crate::parsers::{ParseReport, TranscriptParser};
use crate::sentiment::SentimentCache;

/// Classifier usage during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierStats {
    /// Distinct emoji in the corpus.
    pub distinct_emoji: usize,
    /// Model invocations issued.
    pub invocations: usize,
    /// Emoji that fell back to the zero score, sorted.
    pub degraded: Vec<String>,
}

/// Everything one run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Parser counters.
    pub parse: ParseReport,
    /// Classifier counters.
    pub classifier: ClassifierStats,
    /// Summary tables.
    pub summary: Summary,
}

/// Load the configured sentiment model once, on the best available device.
pub fn load_sentiment_model(config: &ChatlensConfig) -> AnalysisResult<Arc<dyn SentimentModel>> {
    let device = gpu::best_available_device()?;
    let model = CandleSentimentModel::load(&config.sentiment.model_dir, device)?;
    Ok(Arc::new(model))
}

/// Like [`load_sentiment_model`], but a model that fails to load is replaced
/// by one whose every call fails, so the run still produces its word, emoji
/// and activity tables with zero sentiment scores.
pub fn load_sentiment_model_or_degraded(config: &ChatlensConfig) -> Arc<dyn SentimentModel> {
    match load_sentiment_model(config) {
        Ok(model) => model,
        Err(e) => {
            warn!(
                "sentiment model at {} unavailable, scores will be zero: {}",
                config.sentiment.model_dir.display(),
                e
            );
            Arc::new(UnavailableModel::new(e.to_string()))
        }
    }
}

/// Transcript-to-summary batch job.
///
/// The model is shared across runs; the score cache is cleared at the start
/// of every run.
pub struct Pipeline {
    config: ChatlensConfig,
    parser: TranscriptParser,
    filter: WordFilter,
    segmenter: Arc<dyn EmojiSegmenter>,
    cache: SentimentCache,
}

impl Pipeline {
    /// Assemble a pipeline from its collaborators.
    pub fn new(
        config: ChatlensConfig,
        stopwords: StopWords,
        model: Arc<dyn SentimentModel>,
        segmenter: Arc<dyn EmojiSegmenter>,
    ) -> Self {
        Self {
            parser: TranscriptParser::new(&config.parser),
            filter: WordFilter::new(&config.lexical, stopwords),
            segmenter,
            cache: SentimentCache::new(model),
            config,
        }
    }

    /// Pipeline with the grapheme emoji segmenter. Rejects configurations
    /// that fail [`ChatlensConfig::validate`].
    pub fn with_default_segmenter(
        config: ChatlensConfig,
        stopwords: StopWords,
        model: Arc<dyn SentimentModel>,
    ) -> AnalysisResult<Self> {
        config.validate()?;
        let segmenter = Arc::new(GraphemeEmojiSegmenter::new()?);
        Ok(Self::new(config, stopwords, model, segmenter))
    }

    /// Score cache of the most recent run.
    pub fn cache(&self) -> &SentimentCache {
        &self.cache
    }

    /// Run over transcript text.
    #[instrument(skip_all, fields(bytes = raw.len()))]
    pub async fn run(&mut self, raw: &str) -> RunReport {
        self.cache.clear();

        let parsed = self.parser.parse(raw);
        let records = parsed.records;

        let mut seen = HashSet::new();
        let distinct: Vec<String> = records
            .iter()
            .flat_map(|r| extract_emoji(self.segmenter.as_ref(), &r.message))
            .filter(|e| seen.insert(e.clone()))
            .collect();
        let distinct_emoji = distinct.len();

        self.cache
            .score_all(
                distinct,
                self.config.sentiment.max_workers,
                self.config.sentiment.run_timeout(),
            )
            .await;

        let options = SummaryOptions {
            word_top_n: self.config.lexical.top_n,
            emoji_top_n: self.config.emoji.top_n,
            weighting: self.config.sentiment.totals_weighting,
        };
        let summary = summarize(
            &records,
            &mut self.cache,
            &self.filter,
            self.segmenter.as_ref(),
            &options,
        );

        let mut degraded: Vec<String> = self.cache.degraded().map(String::from).collect();
        degraded.sort();
        let classifier = ClassifierStats {
            distinct_emoji,
            invocations: self.cache.invocations(),
            degraded,
        };
        info!(
            "run complete: {} senders, {} distinct emoji, {} classifier calls",
            summary.senders.len(),
            classifier.distinct_emoji,
            classifier.invocations
        );

        RunReport {
            parse: parsed.report,
            classifier,
            summary,
        }
    }

    /// Read a transcript file and run over it.
    pub async fn run_file(&mut self, path: &Path) -> AnalysisResult<RunReport> {
        let raw = tokio::fs::read_to_string(path).await?;
        Ok(self.run(&raw).await)
    }
}
