//! # Evidence Concepts
//!
//! Layer-3 enrichment: picks the most-cited sources, asks an external
//! concept extractor for the supporting concepts behind each, and turns the
//! survivors into `secondary_source` nodes under a density budget.
//!
//! The whole stage is fail-open: a source whose extraction fails is skipped,
//! and a dead extractor yields an empty contribution, never an error.

mod error;
mod extractor;
mod parse;
mod selector;

pub use error::{ConceptError, Result};
pub use extractor::{ConceptDescriptor, ConceptExtractor, StubConceptExtractor};
pub use parse::parse_descriptors;
pub use selector::ConceptStage;
