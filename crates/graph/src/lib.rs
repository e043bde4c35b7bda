//! # Evidence Graph Core
//!
//! Deterministic construction of the mandatory evidence hierarchy and the
//! final graph artifact.
//!
//! ## Architecture
//!
//! ```text
//! GraphRequest
//!     │
//!     ├──> Validator (pure structural checks, fatal on failure)
//!     │
//!     ├──> Assembler
//!     │      ├─ question + answer root        (layer 0)
//!     │      ├─ answer blocks                 (layer 1)
//!     │      ├─ cited sources + citation math (layer 2)
//!     │      └─ answers / supports edges
//!     │
//!     └──> Finalizer
//!            ├─ merge concept layer           (layer 3, best-effort)
//!            ├─ merge semantic edges          (best-effort)
//!            └─ snapshot into GraphArtifact + summary metadata
//! ```
//!
//! Enrichment stages (concepts, semantic edges) live in sibling crates and
//! contribute through [`LayerContribution`] and [`SemanticPair`]; this crate
//! owns every shared graph type.

mod assembler;
mod error;
mod finalize;
mod graph;
mod types;
mod validate;
pub mod weights;

pub use assembler::{assemble, Assembly};
pub use error::{GraphError, Result, ValidationError};
pub use graph::EvidenceGraph;
pub use types::{
    EdgeRecord, EvidenceEdge, EvidenceNode, GraphArtifact, GraphMetadata, LayerContribution,
    NodeMetadata, NodeType, Relation, SemanticPair,
};
pub use validate::validate;
