//! Memoized emoji sentiment scoring.
//!
//! The classifier is expensive, so every distinct emoji is sent to it at most
//! once per run. Failures and timeouts are cached as the all-zero score so the
//! same emoji is never retried within a run.

use chatlens_core::EmojiSentimentScore;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::{AnalysisError, AnalysisResult};
use crate::ml::{softmax, SentimentModel, NUM_CLASSES};

/// Run-lifetime cache of emoji sentiment scores.
pub struct SentimentCache {
    model: Arc<dyn SentimentModel>,
    scores: HashMap<String, EmojiSentimentScore>,
    degraded: HashSet<String>,
    invocations: usize,
}

impl SentimentCache {
    /// Create an empty cache backed by an already loaded model.
    pub fn new(model: Arc<dyn SentimentModel>) -> Self {
        Self {
            model,
            scores: HashMap::new(),
            degraded: HashSet::new(),
            invocations: 0,
        }
    }

    /// Forget every cached score and reset the counters.
    pub fn clear(&mut self) {
        self.scores.clear();
        self.degraded.clear();
        self.invocations = 0;
    }

    /// Number of cached emoji.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether nothing has been scored yet.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Classifier calls issued since the last clear.
    pub fn invocations(&self) -> usize {
        self.invocations
    }

    /// Emoji whose score fell back to zero.
    pub fn degraded(&self) -> impl Iterator<Item = &str> {
        self.degraded.iter().map(String::as_str)
    }

    /// Cached score, if any.
    pub fn get(&self, emoji: &str) -> Option<&EmojiSentimentScore> {
        self.scores.get(emoji)
    }

    /// Score of one emoji, classifying it on the calling thread if needed.
    pub fn score_of(&mut self, emoji: &str) -> EmojiSentimentScore {
        if let Some(score) = self.scores.get(emoji) {
            return score.clone();
        }
        self.invocations += 1;
        let result = self.model.classify(emoji);
        self.store(emoji.to_string(), result).clone()
    }

    /// Score every not yet cached emoji through a bounded worker pool.
    ///
    /// Invocations still outstanding when `deadline` expires are abandoned and
    /// their emoji receive the zero score. Only calls that actually reached the
    /// model count towards [`invocations`](Self::invocations). Returns how many
    /// emoji were newly cached.
    pub async fn score_all<I>(&mut self, emojis: I, max_workers: usize, deadline: Duration) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen = HashSet::new();
        let pending: Vec<String> = emojis
            .into_iter()
            .filter(|e| !self.scores.contains_key(e) && seen.insert(e.clone()))
            .collect();
        if pending.is_empty() {
            return 0;
        }

        debug!(
            "classifying {} emoji with {} workers via {}",
            pending.len(),
            max_workers.max(1),
            self.model.name()
        );

        let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
        let started = Arc::new(AtomicUsize::new(0));
        let mut set = JoinSet::new();
        for emoji in pending.iter().cloned() {
            let model = Arc::clone(&self.model);
            let semaphore_clone = semaphore.clone();
            let started_clone = started.clone();
            set.spawn(async move {
                let _permit = semaphore_clone.acquire_owned().await.ok();
                let key = emoji.clone();
                // A blocking call runs to completion once spawned, so count it here.
                started_clone.fetch_add(1, Ordering::SeqCst);
                let result = tokio::task::spawn_blocking(move || model.classify(&key))
                    .await
                    .map_err(|e| AnalysisError::Sentiment(format!("classifier task failed: {}", e)))
                    .and_then(|scored| scored);
                (emoji, result)
            });
        }

        let drained = tokio::time::timeout(deadline, async {
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok((emoji, result)) => {
                        self.store(emoji, result);
                    }
                    Err(e) => warn!("classifier worker aborted: {}", e),
                }
            }
        })
        .await;

        if drained.is_err() {
            set.abort_all();
            // Settle every task so the call count below is final.
            while set.join_next().await.is_some() {}
            warn!(
                "classifier deadline of {:?} reached; remaining emoji get zero scores",
                deadline
            );
        }

        self.invocations += started.load(Ordering::SeqCst);

        for emoji in pending.iter() {
            if !self.scores.contains_key(emoji) {
                self.store(
                    emoji.clone(),
                    Err(AnalysisError::Timeout(format!("{} was not scored in time", emoji))),
                );
            }
        }

        pending.len()
    }

    fn store(
        &mut self,
        emoji: String,
        result: AnalysisResult<[f32; NUM_CLASSES]>,
    ) -> &EmojiSentimentScore {
        let score = match result {
            Ok(logits) => EmojiSentimentScore::from_probabilities(emoji.clone(), softmax(logits)),
            Err(e) => {
                warn!("sentiment degraded for {}: {}", emoji, e);
                self.degraded.insert(emoji.clone());
                EmojiSentimentScore::zero(emoji.clone())
            }
        };
        self.scores.entry(emoji).or_insert(score)
    }
}
