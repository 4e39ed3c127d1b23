use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RedactError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Detection failed: {0}")]
    DetectionFailure(String),

    #[error("Safety abort: redaction would cover {coverage:.3} of the page (limit {threshold:.3})")]
    SafetyAbort { coverage: f64, threshold: f64 },

    #[error("PDF processing failed: {0}")]
    ProcessingError(String),
}

impl RedactError {
    /// Stable machine-readable code for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            RedactError::InvalidInput(_) => "INVALID_INPUT",
            RedactError::DetectionFailure(_) => "DETECTION_FAILURE",
            RedactError::SafetyAbort { .. } => "SAFETY_ABORT",
            RedactError::ProcessingError(_) => "PROCESSING_ERROR",
        }
    }
}

impl From<lopdf::Error> for RedactError {
    fn from(err: lopdf::Error) -> Self {
        RedactError::ProcessingError(err.to_string())
    }
}
