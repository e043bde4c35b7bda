use evidence_graph_core::{GraphError, ValidationError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Malformed mandatory input. The only error a caller ever sees.
    #[error(transparent)]
    Validation(ValidationError),

    #[error("graph assembly failed: {0}")]
    Assembly(GraphError),
}

impl From<GraphError> for PipelineError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Validation(validation) => PipelineError::Validation(validation),
            other => PipelineError::Assembly(other),
        }
    }
}
