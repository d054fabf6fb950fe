use crate::constants::{
    CANONICAL_TIMESTAMP_FORMAT, DEFAULT_CLASSIFIER_TIMEOUT_SECS, DEFAULT_LAUGHTER_PREFIXES,
    DEFAULT_MIN_WORD_LENGTH, DEFAULT_TOP_N, MEDIA_OMITTED_PLACEHOLDER,
};
use crate::Error;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for chatlens.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ChatlensConfig {
    /// Transcript parser configuration.
    pub parser: ParserConfig,

    /// Word ranking configuration.
    pub lexical: LexicalConfig,

    /// Emoji ranking configuration.
    pub emoji: EmojiConfig,

    /// Sentiment classifier configuration.
    pub sentiment: SentimentConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Transcript parser configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// chrono format string of the timestamp segment.
    pub timestamp_format: String,

    /// Message body that marks an omitted attachment.
    pub media_placeholder: String,

    /// Discard the first successfully parsed record.
    ///
    /// Exports usually open with an encryption notice that parses like a
    /// regular message.
    pub skip_first_record: bool,
}

/// Word ranking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalConfig {
    /// Number of words returned per sender.
    pub top_n: usize,

    /// Minimum token length, in characters.
    pub min_word_length: usize,

    /// Token prefixes treated as laughter noise.
    pub laughter_prefixes: Vec<String>,

    /// Optional stop-word file, one word per line.
    pub stopwords_path: Option<PathBuf>,
}

/// Emoji ranking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmojiConfig {
    /// Number of emoji returned per sender.
    pub top_n: usize,
}

/// How per-sender sentiment totals combine emoji scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TotalsWeighting {
    /// Every occurrence contributes its emoji's score.
    #[default]
    Frequency,

    /// Each distinct emoji contributes once.
    Distinct,
}

/// Sentiment classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    /// Directory holding `tokenizer.json` and `model.safetensors`.
    pub model_dir: PathBuf,

    /// Upper bound on concurrent classifier invocations.
    pub max_workers: usize,

    /// Run-level timeout for all classifier invocations, in seconds.
    pub run_timeout_secs: u64,

    /// Weighting of per-sender totals.
    pub totals_weighting: TotalsWeighting,
}

impl SentimentConfig {
    /// Run-level timeout as a [`Duration`].
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level.
    Error,

    /// Warning level.
    Warn,

    /// Info level.
    Info,

    /// Debug level.
    Debug,

    /// Trace level.
    Trace,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl ChatlensConfig {
    /// Load configuration from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::FileSystem(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Parse(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| Error::FileSystem(format!("Failed to write config file: {}", e)))
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.parser.timestamp_format.trim().is_empty() {
            return Err(Error::Validation(
                "parser.timestamp_format must not be empty".to_string(),
            ));
        }
        if self.sentiment.max_workers == 0 {
            return Err(Error::Validation(
                "sentiment.max_workers must be at least 1".to_string(),
            ));
        }
        if self.sentiment.run_timeout_secs == 0 {
            return Err(Error::Validation(
                "sentiment.run_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            timestamp_format: CANONICAL_TIMESTAMP_FORMAT.to_string(),
            media_placeholder: MEDIA_OMITTED_PLACEHOLDER.to_string(),
            skip_first_record: true,
        }
    }
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            min_word_length: DEFAULT_MIN_WORD_LENGTH,
            laughter_prefixes: DEFAULT_LAUGHTER_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            stopwords_path: None,
        }
    }
}

impl Default for EmojiConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            model_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("chatlens")
                .join("models")
                .join("emoji-sentiment"),
            max_workers: num_cpus::get().max(1),
            run_timeout_secs: DEFAULT_CLASSIFIER_TIMEOUT_SECS,
            totals_weighting: TotalsWeighting::Frequency,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
        }
    }
}
