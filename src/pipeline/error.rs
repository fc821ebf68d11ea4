use thiserror::Error;

use crate::corpus::CorpusError;
use crate::detector::DetectorError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    Detector(#[from] DetectorError),
}
