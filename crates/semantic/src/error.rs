use thiserror::Error;

pub type Result<T> = std::result::Result<T, SemanticError>;

/// Embedding-provider failures. Absorbed at the stage boundary: the
/// enrichment run that hits one contributes nothing.
#[derive(Error, Debug)]
pub enum SemanticError {
    #[error("embedding provider error: {0}")]
    Provider(String),

    #[error("provider returned {actual} vectors for {expected} texts")]
    BatchMismatch { expected: usize, actual: usize },

    #[error("invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },
}
