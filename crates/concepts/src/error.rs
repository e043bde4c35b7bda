use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConceptError>;

/// Collaborator failures. None of these escape the stage boundary: they are
/// logged with their source context and converted into an empty contribution.
#[derive(Error, Debug)]
pub enum ConceptError {
    #[error("concept extractor error: {0}")]
    Extractor(String),

    #[error("malformed extractor payload: {0}")]
    Payload(String),
}
