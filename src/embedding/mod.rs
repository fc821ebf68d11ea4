//! Dense sentence embeddings for the preferred similarity backend.
//!
//! [`SentenceEncoder`] runs a BERT-family model through candle. Anything that can turn
//! text into a fixed-width vector can stand in through [`TextEmbedder`].

/// Device selection (CPU / Metal / CUDA).
pub mod device;
/// BERT sentence encoder.
pub mod encoder;
mod error;
#[cfg(any(test, feature = "mock"))]
pub mod stub;
/// Tokenizer loading helpers.
pub mod utils;


pub use encoder::{ENCODER_MAX_SEQ_LEN, SentenceEncoder, l2_normalize};
pub use error::EmbeddingError;
#[cfg(any(test, feature = "mock"))]
pub use stub::StubEmbedder;

/// Turns normalized text into a unit-length dense vector.
pub trait TextEmbedder: Send + Sync {
    /// Stable identifier of the model, used in backend tags.
    fn model_id(&self) -> &str;

    /// Embeds `text`. Vectors from one embedder always share a width.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}
