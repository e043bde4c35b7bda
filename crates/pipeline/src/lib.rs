//! # Evidence Pipeline
//!
//! The request-scoped orchestrator: validate → assemble the mandatory
//! hierarchy → enrich (concepts, then semantic edges) → finalize into one
//! immutable artifact.
//!
//! Collaborators are injected by the caller and optional; a missing or
//! failing collaborator degrades its stage to an empty contribution. Only
//! input validation is fatal.

mod error;
mod pipeline;

pub use error::{PipelineError, Result};
pub use pipeline::GraphPipeline;
