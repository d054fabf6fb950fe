use crate::error::{AnalysisError, AnalysisResult};
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{Linear, VarBuilder};
use candle_transformers::models::xlm_roberta::{Config as RobertaConfig, XLMRobertaModel};
use chatlens_core::constants::{MODEL_CONFIG_FILE, TOKENIZER_FILE, WEIGHTS_FILE};
use serde_json::Value;
use std::path::Path;
use tokenizers::tokenizer::Tokenizer;
use tracing::info;

/// Number of sentiment classes: negative, neutral, positive.
pub const NUM_CLASSES: usize = 3;

/// Three-class sentiment classifier.
///
/// Implementations return unnormalized scores ordered
/// `[negative, neutral, positive]`; normalization is the caller's concern.
pub trait SentimentModel: Send + Sync {
    /// Classify a short text token.
    fn classify(&self, text: &str) -> AnalysisResult<[f32; NUM_CLASSES]>;

    /// Get model name.
    fn name(&self) -> &str;
}

/// Numerically stable softmax over the three class scores.
pub fn softmax(logits: [f32; NUM_CLASSES]) -> [f64; NUM_CLASSES] {
    let max = logits
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps = logits.map(|l| (l as f64 - max).exp());
    let sum: f64 = exps.iter().sum();
    exps.map(|e| e / sum)
}

/// Stand-in for a model that could not be loaded. Every call fails, so
/// every emoji ends up with the degraded zero score.
pub struct UnavailableModel {
    reason: String,
}

impl UnavailableModel {
    /// Remember why the real model is missing.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SentimentModel for UnavailableModel {
    fn classify(&self, _text: &str) -> AnalysisResult<[f32; NUM_CLASSES]> {
        Err(AnalysisError::ModelLoading(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Parse a Hugging Face `config.json` for a RoBERTa sequence classifier.
///
/// Older exports omit `position_embedding_type`; it defaults to `absolute`.
/// The label map, when present, must have exactly three entries.
pub fn read_model_config(text: &str) -> AnalysisResult<RobertaConfig> {
    let mut value: Value = serde_json::from_str(text)
        .map_err(|e| AnalysisError::ModelLoading(format!("invalid model config: {}", e)))?;

    if let Some(model_type) = value.get("model_type").and_then(Value::as_str) {
        if !model_type.contains("roberta") {
            return Err(AnalysisError::ModelLoading(format!(
                "unsupported architecture {:?}, expected a RoBERTa classifier",
                model_type
            )));
        }
    }
    if let Some(labels) = value.get("id2label").and_then(Value::as_object) {
        if labels.len() != NUM_CLASSES {
            return Err(AnalysisError::ModelLoading(format!(
                "expected {} labels, config declares {}",
                NUM_CLASSES,
                labels.len()
            )));
        }
    }
    if let Some(fields) = value.as_object_mut() {
        fields
            .entry("position_embedding_type")
            .or_insert_with(|| Value::from("absolute"));
    }

    serde_json::from_value(value)
        .map_err(|e| AnalysisError::ModelLoading(format!("invalid model config: {}", e)))
}

/// RoBERTa sequence-classification head: first-token state, dense, tanh,
/// projection onto the classes. Weights live under `dense` and `out_proj`.
pub struct ClassificationHead {
    dense: Linear,
    out_proj: Linear,
}

impl ClassificationHead {
    /// Load the head from `vb`.
    pub fn new(hidden_size: usize, vb: VarBuilder) -> AnalysisResult<Self> {
        let dense = candle_nn::linear(hidden_size, hidden_size, vb.pp("dense"))?;
        let out_proj = candle_nn::linear(hidden_size, NUM_CLASSES, vb.pp("out_proj"))?;
        Ok(Self { dense, out_proj })
    }

    /// Class scores for encoder output shaped `(batch, seq, hidden)`.
    pub fn forward(&self, hidden_states: &Tensor) -> AnalysisResult<Tensor> {
        let first = hidden_states.get_on_dim(1, 0)?.contiguous()?;
        let pooled = self.dense.forward(&first)?.tanh()?;
        Ok(self.out_proj.forward(&pooled)?)
    }
}

/// Sentiment classifier running on candle.
///
/// Reads a Hugging Face RoBERTa sequence-classification export such as
/// `cardiffnlp/twitter-roberta-base-sentiment`: `tokenizer.json`,
/// `config.json` and `model.safetensors` with `roberta.*` encoder weights and
/// a `classifier.*` head. The whole model is loaded once and shared read-only
/// afterwards.
pub struct CandleSentimentModel {
    name: String,
    device: Device,
    tokenizer: Tokenizer,
    encoder: XLMRobertaModel,
    head: ClassificationHead,
}

impl CandleSentimentModel {
    /// Load tokenizer, configuration and weights from a model directory.
    pub fn load(model_dir: &Path, device: Device) -> AnalysisResult<Self> {
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);
        let config_path = model_dir.join(MODEL_CONFIG_FILE);
        let weights_path = model_dir.join(WEIGHTS_FILE);
        for path in [&tokenizer_path, &config_path, &weights_path] {
            if !path.exists() {
                return Err(AnalysisError::NotFound(path.display().to_string()));
            }
        }

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| AnalysisError::ModelLoading(e.to_string()))?;
        let config = read_model_config(&std::fs::read_to_string(&config_path)?)?;
        let weights = std::fs::read(&weights_path)?;
        let vb = VarBuilder::from_buffered_safetensors(weights, DType::F32, &device)
            .map_err(|e| AnalysisError::ModelLoading(e.to_string()))?;
        let encoder = XLMRobertaModel::new(&config, vb.pp("roberta"))
            .map_err(|e| AnalysisError::ModelLoading(format!("encoder weights: {}", e)))?;
        let head = ClassificationHead::new(config.hidden_size, vb.pp("classifier"))?;

        let name = model_dir
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "candle-sentiment".to_string());
        info!(
            "loaded sentiment model {} ({} layers, hidden {}) on {:?}",
            name, config.num_hidden_layers, config.hidden_size, device
        );

        Ok(Self {
            name,
            device,
            tokenizer,
            encoder,
            head,
        })
    }
}

impl SentimentModel for CandleSentimentModel {
    fn classify(&self, text: &str) -> AnalysisResult<[f32; NUM_CLASSES]> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| AnalysisError::Tokenization(e.to_string()))?;
        let ids = encoding.get_ids();
        if ids.is_empty() {
            return Err(AnalysisError::Tokenization(format!(
                "no tokens produced for {:?}",
                text
            )));
        }

        let input_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        let attention_mask = input_ids.ones_like()?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden_states = self.encoder.forward(
            &input_ids,
            &attention_mask,
            &token_type_ids,
            None,
            None,
            None,
        )?;
        let logits = self
            .head
            .forward(&hidden_states)?
            .squeeze(0)?
            .to_vec1::<f32>()?;

        logits.try_into().map_err(|v: Vec<f32>| {
            AnalysisError::Ai(format!(
                "expected {} class scores, model returned {}",
                NUM_CLASSES,
                v.len()
            ))
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// GPU device utilities.
pub mod gpu {
    use super::*;

    /// Get the best available device (GPU preferred).
    pub fn best_available_device() -> AnalysisResult<Device> {
        #[cfg(target_os = "macos")]
        {
            if let Ok(device) = Device::new_metal(0) {
                return Ok(device);
            }
        }

        Ok(Device::Cpu)
    }
}
