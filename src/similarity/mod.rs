//! Pairwise document similarity.
//!
//! [`SimilarityEngine`] picks one backend at construction (embedding, then lexical, then
//! sequence overlap) and keeps it for its lifetime. Vector backends read and write the
//! injected [`SimilarityCache`](crate::cache::SimilarityCache).

mod backend;
mod engine;
pub mod lexical;
pub mod sequence;
pub mod vector;


pub use backend::{BackendKind, SimilarityScore};
pub use engine::{EngineOptions, MEMO_CAPACITY, SimilarityEngine};
pub use lexical::LexicalVectorizer;
pub use sequence::sequence_ratio;
pub use vector::cosine;
