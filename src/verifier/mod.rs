//! Batch verification of MEDIUM ("gray zone") candidates by an external reasoning model.
//!
//! Candidates are grouped into batches of at most [`MAX_BATCH_SIZE`](crate::constants::MAX_BATCH_SIZE),
//! one request per batch, each bounded by a timeout. Replies are free text; the parser
//! tolerates prose around the verdict keywords.

mod batch;
mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod parse;
pub mod prompt;
mod service;


pub use batch::{BatchVerifier, VerifyReport, VerifyStats};
pub use error::VerifierError;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockReasoner, MockReply};
pub use parse::{BatchVerdict, Verdict, parse_verdicts};
pub use service::{GenaiReasoner, ReasoningService, required_api_key};
