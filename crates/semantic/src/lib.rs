//! # Evidence Semantic
//!
//! Embedding-based enrichment: embeds the texts of every eligible node,
//! finds each node's nearest neighbors by cosine similarity, and proposes
//! deduplicated, capped `semantic_related` edges.
//!
//! The stage is fail-open: any embedding-provider failure turns into an
//! empty contribution, never an error for the pipeline.

mod enricher;
mod error;
mod provider;
mod similarity;

pub use enricher::{SemanticStage, EMBED_CHAR_BUDGET};
pub use error::{Result, SemanticError};
pub use provider::{embed_all, EmbeddingProvider, StubEmbeddingProvider, DEFAULT_MAX_BATCH};
pub use similarity::{cosine_similarity, nearest_neighbor_pairs};
