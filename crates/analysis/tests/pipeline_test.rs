use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chatlens_analysis::error::{AnalysisError, AnalysisResult};
use chatlens_analysis::ml::{SentimentModel, NUM_CLASSES};
use chatlens_analysis::nlp::StopWords;
use chatlens_analysis::pipeline::load_sentiment_model_or_degraded;
use chatlens_analysis::Pipeline;
use chatlens_core::config::TotalsWeighting;
use chatlens_core::ChatlensConfig;

/// Records how often each text was classified.
#[derive(Default)]
struct RecordingModel {
    calls: Mutex<HashMap<String, usize>>,
}

impl RecordingModel {
    fn calls_for(&self, text: &str) -> usize {
        self.calls.lock().unwrap().get(text).copied().unwrap_or(0)
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

impl SentimentModel for RecordingModel {
    fn classify(&self, text: &str) -> AnalysisResult<[f32; NUM_CLASSES]> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(text.to_string())
            .or_insert(0) += 1;
        match text {
            "😢" => Ok([2.5, 0.8, -1.0]),
            "🔥" => Err(AnalysisError::Ai("unsupported token".to_string())),
            _ => Ok([-1.0, 0.6, 2.8]),
        }
    }

    fn name(&self) -> &str {
        "recording"
    }
}

struct StuckModel;

impl SentimentModel for StuckModel {
    fn classify(&self, _text: &str) -> AnalysisResult<[f32; NUM_CLASSES]> {
        std::thread::sleep(Duration::from_millis(250));
        Ok([0.0, 0.0, 0.0])
    }

    fn name(&self) -> &str {
        "stuck"
    }
}

const HEADER: &str =
    "01/01/23, 00:00 - Group: Messages and calls are end-to-end encrypted. Tap to learn more.";

fn five_sender_transcript() -> String {
    let senders = ["Ana", "Bruno", "Carla", "Diego", "Elena"];
    let per_sender = [8, 8, 7, 7, 7];
    let mut lines = vec![HEADER.to_string()];
    for (sender, count) in senders.iter().zip(per_sender) {
        for i in 0..count {
            lines.push(format!(
                "02/{:02}/23, {:02}:30 - {}: mensaje {} 😀",
                i + 1,
                8 + i,
                sender,
                i
            ));
        }
    }
    lines.push("02/20/23, 19:00 - Ana: triste 😢".to_string());
    lines.join("\n")
}

fn pipeline(model: Arc<dyn SentimentModel>, config: ChatlensConfig) -> Pipeline {
    Pipeline::with_default_segmenter(config, StopWords::spanish(), model).unwrap()
}

#[tokio::test]
async fn emoji_shared_by_five_senders_is_classified_once() {
    let model = Arc::new(RecordingModel::default());
    let mut config = ChatlensConfig::default();
    config.sentiment.max_workers = 4;
    let mut pipeline = pipeline(model.clone(), config);

    let report = pipeline.run(&five_sender_transcript()).await;

    assert!(report.parse.header_skipped);
    assert_eq!(report.parse.records, 38);
    assert_eq!(report.summary.senders.len(), 5);

    let smiles: usize = report
        .summary
        .per_sender_emoji_stats
        .iter()
        .flat_map(|s| s.emoji.iter())
        .filter(|e| e.emoji == "😀")
        .map(|e| e.count)
        .sum();
    assert_eq!(smiles, 37);

    assert_eq!(model.calls_for("😀"), 1);
    assert_eq!(model.calls_for("😢"), 1);
    assert_eq!(model.total_calls(), 2);
    assert_eq!(report.classifier.distinct_emoji, 2);
    assert_eq!(report.classifier.invocations, 2);
}

#[tokio::test]
async fn cache_is_cleared_between_runs() {
    let model = Arc::new(RecordingModel::default());
    let mut pipeline = pipeline(model.clone(), ChatlensConfig::default());

    pipeline.run(&five_sender_transcript()).await;
    pipeline.run(&five_sender_transcript()).await;

    assert_eq!(model.calls_for("😀"), 2);
    assert_eq!(pipeline.cache().invocations(), 2);
}

#[tokio::test]
async fn triple_smile_dominates_positive_total() {
    let model = Arc::new(RecordingModel::default());
    let mut config = ChatlensConfig::default();
    config.parser.skip_first_record = false;
    let mut pipeline = pipeline(model, config);

    let transcript = [
        "03/01/23, 10:00 - Alice: 😀 buenos días",
        "03/01/23, 10:05 - Alice: 😀😀",
        "03/01/23, 10:10 - Alice: 😢",
    ]
    .join("\n");
    let report = pipeline.run(&transcript).await;

    let totals = &report.summary.emoji_sentiment_totals[0];
    assert_eq!(totals.sender, "Alice");
    assert!(totals.positive > 2.0);
    assert!(totals.positive > totals.negative);
    assert!(totals.positive > totals.neutral);
}

#[tokio::test]
async fn distinct_weighting_switch_counts_each_emoji_once() {
    let model = Arc::new(RecordingModel::default());
    let mut config = ChatlensConfig::default();
    config.parser.skip_first_record = false;
    config.sentiment.totals_weighting = TotalsWeighting::Distinct;
    let mut pipeline = pipeline(model, config);

    let report = pipeline
        .run("03/01/23, 10:00 - Alice: 😀😀😀\n03/01/23, 10:10 - Alice: 😢")
        .await;

    let totals = &report.summary.emoji_sentiment_totals[0];
    let sum = totals.negative + totals.neutral + totals.positive;
    assert!((sum - 2.0).abs() < 0.02);
}

#[tokio::test]
async fn classifier_failure_degrades_to_zero() {
    let model = Arc::new(RecordingModel::default());
    let mut config = ChatlensConfig::default();
    config.parser.skip_first_record = false;
    let mut pipeline = pipeline(model.clone(), config);

    let report = pipeline
        .run("03/01/23, 10:00 - Alice: 🔥🔥\n03/01/23, 10:05 - Bob: 🔥")
        .await;

    assert_eq!(model.calls_for("🔥"), 1);
    assert_eq!(report.classifier.degraded, vec!["🔥".to_string()]);
    for totals in &report.summary.emoji_sentiment_totals {
        assert_eq!(totals.negative, 0.0);
        assert_eq!(totals.neutral, 0.0);
        assert_eq!(totals.positive, 0.0);
    }
}

#[tokio::test]
async fn run_deadline_degrades_instead_of_failing() {
    let mut config = ChatlensConfig::default();
    config.parser.skip_first_record = false;
    config.sentiment.max_workers = 1;
    config.sentiment.run_timeout_secs = 1;
    let mut pipeline = pipeline(Arc::new(StuckModel), config);

    let emoji: Vec<String> = ["😀", "😢", "🎉", "👍", "🙈", "🌮"]
        .iter()
        .enumerate()
        .map(|(i, e)| format!("03/01/23, 10:{:02} - Alice: {}", i, e))
        .collect();
    let report = pipeline.run(&emoji.join("\n")).await;

    assert_eq!(report.summary.senders, vec!["Alice"]);
    assert!(!report.classifier.degraded.is_empty());
    assert_eq!(pipeline.cache().len(), 6);
    assert!(report.classifier.invocations < 6);
}

#[tokio::test]
async fn empty_transcript_yields_empty_tables() {
    let mut pipeline = pipeline(Arc::new(RecordingModel::default()), ChatlensConfig::default());
    let report = pipeline.run("").await;

    assert_eq!(report.parse.records, 0);
    assert!(report.summary.senders.is_empty());
    assert!(report.summary.per_sender_word_stats.is_empty());
    assert!(report.summary.emoji_sentiment_totals.is_empty());
    assert_eq!(report.classifier.invocations, 0);
}

#[tokio::test]
async fn missing_model_still_produces_tables() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ChatlensConfig::default();
    config.parser.skip_first_record = false;
    config.sentiment.model_dir = dir.path().join("absent");

    let model = load_sentiment_model_or_degraded(&config);
    assert_eq!(model.name(), "unavailable");

    let mut pipeline = pipeline(model, config);
    let report = pipeline
        .run("03/01/23, 10:00 - Alice: buenísimo partido 😀\n03/01/23, 10:05 - Bob: 😢")
        .await;

    assert_eq!(report.summary.senders, vec!["Alice", "Bob"]);
    assert_eq!(report.summary.per_sender_word_stats[0].words[0].word, "buenísimo");
    assert_eq!(report.summary.per_sender_emoji_stats[1].emoji[0].emoji, "😢");
    assert_eq!(report.classifier.degraded, vec!["😀".to_string(), "😢".to_string()]);
    for totals in &report.summary.emoji_sentiment_totals {
        assert_eq!(totals.positive, 0.0);
        assert_eq!(totals.negative, 0.0);
    }
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = ChatlensConfig::default();
    config.sentiment.max_workers = 0;
    let result =
        Pipeline::with_default_segmenter(config, StopWords::empty(), Arc::new(RecordingModel::default()));
    assert!(matches!(result, Err(AnalysisError::Config(_))));
}

#[tokio::test]
async fn run_file_reads_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("WhatsApp.txt");
    std::fs::write(&path, five_sender_transcript()).unwrap();

    let mut pipeline = pipeline(Arc::new(RecordingModel::default()), ChatlensConfig::default());
    let report = pipeline.run_file(&path).await.unwrap();
    assert_eq!(report.summary.senders[0], "Ana");
}
