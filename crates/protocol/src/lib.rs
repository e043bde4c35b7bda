use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod truncate;

pub use truncate::{truncate_at_word, truncate_label};

pub const REQUEST_SCHEMA_VERSION: u32 = 1;

/// One cited block of the machine-generated answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct AnswerBlock {
    /// Block id, unique within the answer (e.g. "ans-1").
    pub id: String,
    /// Block kind as produced by the drafting step (paragraph, list, code, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub block_type: Option<String>,
    /// Full block text.
    pub text: String,
    /// Ids of the sources this block cites, in citation order.
    #[serde(default)]
    pub source_ids: Vec<String>,
}

/// The machine-generated answer: full text plus its cited blocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct AnswerPayload {
    pub text: String,
    pub blocks: Vec<AnswerBlock>,
}

/// One retrieved source record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct SourceRecord {
    /// Source id, unique within the request (e.g. "s1").
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Retrieval relevance score; used only for ranking ties.
    #[serde(default)]
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Everything the pipeline needs to build one evidence graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct GraphRequest {
    pub question: String,
    pub answer: AnswerPayload,
    pub sources: Vec<SourceRecord>,
}

/// Density knobs for the concept layer (layer 3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(default)]
pub struct DensityConfig {
    /// How many top-cited sources are sent to the concept extractor.
    pub top_sources_to_process: usize,
    /// How many concepts are kept per source.
    pub concepts_per_source: usize,
    /// Hard cap on layer-3 nodes per graph.
    pub max_total_concepts: usize,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            top_sources_to_process: 5,
            concepts_per_source: 2,
            max_total_concepts: 10,
        }
    }
}

/// Knobs for the semantic-similarity edge synthesis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct SemanticConfig {
    /// Neighbors kept per node before global deduplication.
    pub top_k: usize,
    /// Minimum cosine similarity for a candidate edge.
    pub min_similarity: f32,
    /// Hard cap on semantic edges per graph.
    pub max_edges: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            min_similarity: 0.55,
            max_edges: 30,
        }
    }
}
