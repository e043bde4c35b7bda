use crate::graph::EvidenceGraph;
use crate::types::{
    EvidenceEdge, GraphArtifact, GraphMetadata, LayerContribution, NodeType, Relation,
    SemanticPair,
};
use std::collections::BTreeMap;

/// Finalization: merge enrichment contributions in fixed order (layer 3,
/// then semantic edges) and snapshot the immutable artifact. The mandatory
/// layers either fully succeeded upstream or nothing reaches this point;
/// everything merged here is additive and best-effort.
impl EvidenceGraph {
    /// Merge the concept layer. Nodes that would collide with an existing id
    /// and edges with a missing endpoint are dropped with a warning.
    pub fn merge_concepts(&mut self, layer: LayerContribution) {
        for node in layer.nodes {
            if self.contains(&node.id) {
                log::warn!("concept node '{}' collides with an existing id; dropped", node.id);
                continue;
            }
            if let Err(err) = self.add_node(node) {
                log::warn!("failed to merge concept node: {err}");
            }
        }
        for edge in layer.edges {
            let added = self.try_add_edge(
                &edge.from,
                &edge.to,
                EvidenceEdge {
                    relation: edge.relation,
                    weight: edge.weight,
                },
            );
            if !added {
                log::warn!(
                    "concept edge {} -> {} references a missing node; dropped",
                    edge.from,
                    edge.to
                );
            }
        }
    }

    /// Merge semantic-similarity pairs as `semantic_related` edges.
    ///
    /// A pair is skipped when an endpoint is missing, when the two nodes are
    /// already joined by a structural edge in either direction, or when the
    /// pair touches a graph root. Weights are clamped to [0, 1]. Returns how
    /// many edges were added.
    pub fn merge_semantic(&mut self, pairs: Vec<SemanticPair>) -> usize {
        let mut added = 0;
        for pair in pairs {
            let endpoints_ok = matches!(
                (self.node(&pair.a), self.node(&pair.b)),
                (Some(a), Some(b))
                    if a.node_type.semantic_candidate() && b.node_type.semantic_candidate()
            );
            if !endpoints_ok {
                log::warn!(
                    "semantic pair {} <-> {} has a missing or ineligible endpoint; dropped",
                    pair.a,
                    pair.b
                );
                continue;
            }
            if self.has_edge_between(&pair.a, &pair.b) {
                continue;
            }
            self.try_add_edge(
                &pair.a,
                &pair.b,
                EvidenceEdge {
                    relation: Relation::SemanticRelated,
                    weight: Some(pair.similarity.clamp(0.0, 1.0)),
                },
            );
            added += 1;
        }
        added
    }

    /// Snapshot the graph into its immutable artifact form, computing the
    /// summary metadata. Node and edge order is first-seen order.
    pub fn into_artifact(self) -> GraphArtifact {
        let nodes: Vec<_> = self.nodes().cloned().collect();
        let edges: Vec<_> = self.edges().collect();

        let mut nodes_by_layer: BTreeMap<u8, usize> = BTreeMap::new();
        let mut nodes_by_type: BTreeMap<String, usize> = BTreeMap::new();
        let mut secondary_concepts = 0;
        for node in &nodes {
            *nodes_by_layer.entry(node.layer).or_default() += 1;
            *nodes_by_type.entry(node.node_type.as_str().to_string()).or_default() += 1;
            if node.node_type == NodeType::SecondarySource {
                secondary_concepts += 1;
            }
        }
        let semantic_edges = edges
            .iter()
            .filter(|e| e.relation == Relation::SemanticRelated)
            .count();

        let metadata = GraphMetadata {
            node_count: nodes.len(),
            edge_count: edges.len(),
            nodes_by_layer,
            nodes_by_type,
            secondary_concepts,
            semantic_edges,
        };

        log::debug!(
            "finalized graph: {} nodes, {} edges ({} concepts, {} semantic)",
            metadata.node_count,
            metadata.edge_count,
            metadata.secondary_concepts,
            metadata.semantic_edges
        );

        GraphArtifact { nodes, edges, metadata }
    }
}
