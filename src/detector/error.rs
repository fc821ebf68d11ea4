use thiserror::Error;

use crate::constants::ThresholdError;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("invalid thresholds: {0}")]
    InvalidThresholds(#[from] ThresholdError),

    #[error("worker count must be at least 1")]
    NoWorkers,
}
