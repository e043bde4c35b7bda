use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Node kind. The layer is fully determined by the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Question,
    AnswerRoot,
    AnswerBlock,
    DirectSource,
    SecondarySource,
}

impl NodeType {
    pub const fn layer(self) -> u8 {
        match self {
            NodeType::Question | NodeType::AnswerRoot => 0,
            NodeType::AnswerBlock => 1,
            NodeType::DirectSource => 2,
            NodeType::SecondarySource => 3,
        }
    }

    /// Whether nodes of this kind may carry `semantic_related` edges.
    /// The question and the answer root never do.
    pub const fn semantic_candidate(self) -> bool {
        matches!(
            self,
            NodeType::AnswerBlock | NodeType::DirectSource | NodeType::SecondarySource
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            NodeType::Question => "question",
            NodeType::AnswerRoot => "answer_root",
            NodeType::AnswerBlock => "answer_block",
            NodeType::DirectSource => "direct_source",
            NodeType::SecondarySource => "secondary_source",
        }
    }
}

/// Edge relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// question → answer root, answer root → answer block.
    Answers,
    /// answer block → direct source.
    Supports,
    /// direct source → secondary concept.
    Underpins,
    /// Undirected text-similarity link, stored once per unordered pair.
    SemanticRelated,
}

/// Per-node payload. Which fields are set depends on the node kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Full untruncated text behind the label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,

    /// Retrieval relevance score (direct sources).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f32>,

    /// Number of distinct answer blocks citing this source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_count: Option<usize>,

    /// Id of the answer block this node's lineage traces back to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,

    /// Id of the node's structural parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_parent: Option<String>,

    /// Extractor-reported importance in [0, 1] (secondary concepts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<f32>,

    /// Id of the direct source a concept was derived from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_source: Option<String>,

    /// Branch ids of the blocks related to this node.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_blocks: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Node in the evidence graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub label: String,
    pub layer: u8,
    #[serde(default)]
    pub metadata: NodeMetadata,
}

impl EvidenceNode {
    pub fn new(id: impl Into<String>, node_type: NodeType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type,
            label: label.into(),
            layer: node_type.layer(),
            metadata: NodeMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: NodeMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Text used when this node is embedded: the full text when present,
    /// the label otherwise.
    pub fn embedding_text(&self) -> &str {
        self.metadata.full_text.as_deref().unwrap_or(&self.label)
    }
}

/// Edge payload stored inside the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceEdge {
    pub relation: Relation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f32>,
}

/// Edge in artifact form, endpoints by node id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub from: String,
    pub to: String,
    pub relation: Relation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f32>,
}

/// Nodes and edges contributed by an enrichment stage (layer 3).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerContribution {
    pub nodes: Vec<EvidenceNode>,
    pub edges: Vec<EdgeRecord>,
}

impl LayerContribution {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// One semantic-similarity link, endpoints in canonical (lexicographic)
/// order so an unordered pair has exactly one representation.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticPair {
    pub a: String,
    pub b: String,
    pub similarity: f32,
}

impl SemanticPair {
    /// Build a canonical pair; returns `None` for self-pairs.
    pub fn new(x: impl Into<String>, y: impl Into<String>, similarity: f32) -> Option<Self> {
        let x = x.into();
        let y = y.into();
        match x.cmp(&y) {
            std::cmp::Ordering::Less => Some(Self { a: x, b: y, similarity }),
            std::cmp::Ordering::Greater => Some(Self { a: y, b: x, similarity }),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Summary counts over the finished graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes_by_layer: BTreeMap<u8, usize>,
    pub nodes_by_type: BTreeMap<String, usize>,
    pub secondary_concepts: usize,
    pub semantic_edges: usize,
}

/// The immutable per-request artifact handed to downstream renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphArtifact {
    pub nodes: Vec<EvidenceNode>,
    pub edges: Vec<EdgeRecord>,
    pub metadata: GraphMetadata,
}
