use extraction::ExtractionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("No verifier registered for field '{0}'")]
    UnknownField(String),

    #[error("No text could be extracted from the document")]
    NoText,

    #[error(transparent)]
    Extraction(ExtractionError),

    #[error("Failed to process proof document: {0:#}")]
    Document(#[from] anyhow::Error),
}

impl From<ExtractionError> for VerificationError {
    fn from(error: ExtractionError) -> Self {
        match error {
            ExtractionError::NoText => VerificationError::NoText,
            other => VerificationError::Extraction(other),
        }
    }
}
