use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::TextEmbedder;
use super::device::select_device;
use super::error::EmbeddingError;
use super::utils::load_tokenizer_with_truncation;
use crate::constants::MAX_EMBEDDING_WINDOWS;

/// Token limit per encoder window.
pub const ENCODER_MAX_SEQ_LEN: usize = 512;

/// Words per window. Sized so a window rarely exceeds [`ENCODER_MAX_SEQ_LEN`] after
/// sub-word tokenization; anything longer is truncated by the tokenizer.
pub const WINDOW_WORDS: usize = 256;

/// BERT-family sentence encoder (mean pooled, L2 normalised).
///
/// Expects a model directory containing `config.json`, `tokenizer.json` and
/// `model.safetensors` (e.g. a sentence-transformers MiniLM export).
pub struct SentenceEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_id: String,
    hidden_size: usize,
}

impl std::fmt::Debug for SentenceEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceEncoder")
            .field("model_id", &self.model_id)
            .field("hidden_size", &self.hidden_size)
            .field("device", &self.device)
            .finish()
    }
}

impl SentenceEncoder {
    /// Loads the encoder from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self, EmbeddingError> {
        if !model_dir.is_dir() {
            return Err(EmbeddingError::ModelNotFound {
                path: model_dir.to_path_buf(),
            });
        }

        let config_path = model_dir.join("config.json");
        let weights_path = model_dir.join("model.safetensors");
        for required in [&config_path, &weights_path, &model_dir.join("tokenizer.json")] {
            if !required.exists() {
                return Err(EmbeddingError::ModelNotFound {
                    path: required.to_path_buf(),
                });
            }
        }

        let config_content =
            std::fs::read_to_string(&config_path).map_err(|e| EmbeddingError::ModelLoadFailed {
                reason: format!("failed to read {}: {}", config_path.display(), e),
            })?;
        let config: Config =
            serde_json::from_str(&config_content).map_err(|e| EmbeddingError::ModelLoadFailed {
                reason: format!("failed to parse config: {}", e),
            })?;
        let hidden_size = config.hidden_size;

        let device = select_device();
        info!(model_dir = %model_dir.display(), device = ?device, "Loading sentence encoder");

        // SAFETY: the weights file is mapped read-only for the lifetime of the model.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
        }
        .map_err(|e| EmbeddingError::ModelLoadFailed {
            reason: e.to_string(),
        })?;

        let model = load_bert(vb, &config).map_err(|e| EmbeddingError::ModelLoadFailed {
            reason: e.to_string(),
        })?;

        let tokenizer = load_tokenizer_with_truncation(model_dir, ENCODER_MAX_SEQ_LEN).map_err(
            |e| EmbeddingError::ModelLoadFailed {
                reason: format!("failed to load tokenizer: {}", e),
            },
        )?;

        let model_id = model_id_for(model_dir);
        debug!(model_id = %model_id, hidden_size, "Sentence encoder ready");

        Ok(Self {
            model,
            tokenizer,
            device,
            model_id,
            hidden_size,
        })
    }

    /// Width of the vectors this encoder produces.
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn embed_window(&self, window: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoding =
            self.tokenizer
                .encode(window, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(encoding.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let output = self.model.forward(&input_ids, &type_ids, Some(&mask))?;

        // Mean over the tokens the attention mask keeps.
        let mask = mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = output.broadcast_mul(&mask)?.sum(1)?;
        let count = mask.sum(1)?;
        let pooled = summed.broadcast_div(&count)?.squeeze(0)?;

        Ok(pooled.to_vec1::<f32>()?)
    }
}

impl TextEmbedder for SentenceEncoder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Ok(vec![0.0; self.hidden_size]);
        }

        let mut sum = vec![0.0f32; self.hidden_size];
        let mut windows = 0usize;
        for chunk in words.chunks(WINDOW_WORDS).take(MAX_EMBEDDING_WINDOWS) {
            let vector = self.embed_window(&chunk.join(" "))?;
            if vector.len() != sum.len() {
                return Err(EmbeddingError::InferenceFailed {
                    reason: format!(
                        "model produced {} dimensions, expected {}",
                        vector.len(),
                        sum.len()
                    ),
                });
            }
            for (acc, v) in sum.iter_mut().zip(vector) {
                *acc += v;
            }
            windows += 1;
        }

        let scale = 1.0 / windows as f32;
        for v in sum.iter_mut() {
            *v *= scale;
        }
        Ok(l2_normalize(sum))
    }
}

fn load_bert(vb: VarBuilder, config: &Config) -> candle_core::Result<BertModel> {
    // sentence-transformers exports are unprefixed; full checkpoints nest under `bert.`
    if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
        BertModel::load(vb.pp("bert"), config)
    } else {
        BertModel::load(vb, config)
    }
}

fn model_id_for(model_dir: &Path) -> String {
    model_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| PathBuf::from(model_dir).display().to_string())
}

/// Scales `v` to unit length. Zero vectors are returned unchanged.
pub fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    v
}
