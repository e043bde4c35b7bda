use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

/// Fatal input problems. These abort the whole build; nothing else does.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("question must not be blank")]
    EmptyQuestion,

    #[error("answer text must not be blank")]
    EmptyAnswer,

    #[error("answer has no blocks")]
    NoBlocks,

    #[error("answer block at index {0} has a blank id")]
    BlankBlockId(usize),

    #[error("duplicate answer block id '{0}'")]
    DuplicateBlockId(String),

    #[error("source at index {0} has a blank id")]
    BlankSourceId(usize),

    #[error("duplicate source id '{0}'")]
    DuplicateSourceId(String),

    #[error("id '{0}' is reserved for the graph roots")]
    ReservedId(String),

    #[error("source id '{0}' collides with an answer block id")]
    SourceIdCollidesWithBlock(String),
}

#[derive(Error, Debug)]
pub enum GraphError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("duplicate node id '{0}'")]
    DuplicateNode(String),

    #[error("node not found: {0}")]
    NodeNotFound(String),
}
