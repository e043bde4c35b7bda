use crate::error::ValidationError;
use crate::weights::{ANSWER_ROOT_ID, QUESTION_NODE_ID};
use evidence_protocol::GraphRequest;
use std::collections::HashSet;

/// Check the structural invariants of a request before any graph is built.
///
/// Pure: no side effects, no partial results. Everything rejected here is
/// fatal; everything else the pipeline tolerates downstream.
pub fn validate(request: &GraphRequest) -> Result<(), ValidationError> {
    if request.question.trim().is_empty() {
        return Err(ValidationError::EmptyQuestion);
    }
    if request.answer.text.trim().is_empty() {
        return Err(ValidationError::EmptyAnswer);
    }
    if request.answer.blocks.is_empty() {
        return Err(ValidationError::NoBlocks);
    }

    let mut block_ids = HashSet::new();
    for (index, block) in request.answer.blocks.iter().enumerate() {
        let id = block.id.trim();
        if id.is_empty() {
            return Err(ValidationError::BlankBlockId(index));
        }
        if id == QUESTION_NODE_ID || id == ANSWER_ROOT_ID {
            return Err(ValidationError::ReservedId(id.to_string()));
        }
        if !block_ids.insert(id) {
            return Err(ValidationError::DuplicateBlockId(id.to_string()));
        }
    }

    let mut source_ids = HashSet::new();
    for (index, source) in request.sources.iter().enumerate() {
        let id = source.id.trim();
        if id.is_empty() {
            return Err(ValidationError::BlankSourceId(index));
        }
        if id == QUESTION_NODE_ID || id == ANSWER_ROOT_ID {
            return Err(ValidationError::ReservedId(id.to_string()));
        }
        if block_ids.contains(id) {
            return Err(ValidationError::SourceIdCollidesWithBlock(id.to_string()));
        }
        if !source_ids.insert(id) {
            return Err(ValidationError::DuplicateSourceId(id.to_string()));
        }
    }

    Ok(())
}
