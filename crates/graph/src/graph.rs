use crate::error::{GraphError, Result};
use crate::types::{EdgeRecord, EvidenceEdge, EvidenceNode, NodeType, Relation};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

/// The evidence graph under construction.
///
/// Wraps a directed petgraph with a node-id index for O(1) lookup. Nodes are
/// never removed, so petgraph's index order is first-seen insertion order.
pub struct EvidenceGraph {
    graph: DiGraph<EvidenceNode, EvidenceEdge>,
    id_index: HashMap<String, NodeIndex>,
}

impl EvidenceGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            id_index: HashMap::new(),
        }
    }

    /// Add a node; node ids are unique within a graph.
    pub fn add_node(&mut self, node: EvidenceNode) -> Result<NodeIndex> {
        if self.id_index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        Ok(idx)
    }

    /// Add an edge between two existing nodes. Returns `false` (and adds
    /// nothing) when either endpoint is absent.
    pub fn try_add_edge(&mut self, from: &str, to: &str, edge: EvidenceEdge) -> bool {
        match (self.id_index.get(from), self.id_index.get(to)) {
            (Some(&from_idx), Some(&to_idx)) => {
                self.graph.add_edge(from_idx, to_idx, edge);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&EvidenceNode> {
        self.id_index
            .get(id)
            .and_then(|idx| self.graph.node_weight(*idx))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nodes in first-seen order.
    pub fn nodes(&self) -> impl Iterator<Item = &EvidenceNode> {
        self.graph
            .node_indices()
            .filter_map(move |idx| self.graph.node_weight(idx))
    }

    /// Edges in insertion order, endpoints resolved to node ids.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRecord> + '_ {
        self.graph.edge_references().map(move |edge| {
            let from = &self.graph[edge.source()];
            let to = &self.graph[edge.target()];
            EdgeRecord {
                from: from.id.clone(),
                to: to.id.clone(),
                relation: edge.weight().relation,
                weight: edge.weight().weight,
            }
        })
    }

    /// Whether any edge joins the two nodes, in either direction.
    pub fn has_edge_between(&self, a: &str, b: &str) -> bool {
        match (self.id_index.get(a), self.id_index.get(b)) {
            (Some(&a_idx), Some(&b_idx)) => {
                self.graph.find_edge(a_idx, b_idx).is_some()
                    || self.graph.find_edge(b_idx, a_idx).is_some()
            }
            _ => false,
        }
    }

    /// Direct sources cited by an answer block (outgoing `supports` edges).
    pub fn sources_cited_by(&self, block_id: &str) -> Vec<&EvidenceNode> {
        self.targets_of(block_id, Relation::Supports)
    }

    /// Secondary concepts derived from a direct source (outgoing `underpins`
    /// edges).
    pub fn concepts_under(&self, source_id: &str) -> Vec<&EvidenceNode> {
        self.targets_of(source_id, Relation::Underpins)
    }

    /// All nodes whose lineage traces back to the given answer block,
    /// including the block itself.
    pub fn branch_members(&self, block_id: &str) -> Vec<&EvidenceNode> {
        self.nodes()
            .filter(|node| {
                node.id == block_id || node.metadata.branch_id.as_deref() == Some(block_id)
            })
            .collect()
    }

    /// Nodes joined to `id` by a `semantic_related` edge in either direction.
    pub fn semantic_neighbors(&self, id: &str) -> Vec<&EvidenceNode> {
        let Some(&idx) = self.id_index.get(id) else {
            return Vec::new();
        };
        let mut neighbors = Vec::new();
        for direction in [Direction::Outgoing, Direction::Incoming] {
            for edge in self.graph.edges_directed(idx, direction) {
                if edge.weight().relation == Relation::SemanticRelated {
                    let other = if direction == Direction::Outgoing {
                        edge.target()
                    } else {
                        edge.source()
                    };
                    neighbors.push(&self.graph[other]);
                }
            }
        }
        neighbors
    }

    /// Nodes of a given type, in first-seen order.
    pub fn nodes_of_type(&self, node_type: NodeType) -> Vec<&EvidenceNode> {
        self.nodes()
            .filter(|node| node.node_type == node_type)
            .collect()
    }

    fn targets_of(&self, id: &str, relation: Relation) -> Vec<&EvidenceNode> {
        let Some(&idx) = self.id_index.get(id) else {
            return Vec::new();
        };
        self.graph
            .edges(idx)
            .filter(|edge| edge.weight().relation == relation)
            .map(|edge| &self.graph[edge.target()])
            .collect()
    }
}

impl Default for EvidenceGraph {
    fn default() -> Self {
        Self::new()
    }
}
