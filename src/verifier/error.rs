use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum VerifierError {
    #[error("verification unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("verification request failed: {reason}")]
    Request { reason: String },

    #[error("verification request timed out after {millis} ms")]
    Timeout { millis: u128 },

    #[error("verification service returned an empty response")]
    EmptyResponse,
}
