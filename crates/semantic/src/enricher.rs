use crate::provider::{embed_all, EmbeddingProvider};
use crate::similarity::nearest_neighbor_pairs;
use evidence_graph_core::{EvidenceGraph, NodeType, SemanticPair};
use evidence_protocol::{truncate_at_word, SemanticConfig};
use std::sync::Arc;

/// Character budget for text sent to the embedding provider. Bounds cost;
/// the cut prefers a word boundary.
pub const EMBED_CHAR_BUDGET: usize = 512;

/// The semantic enrichment stage: embed every eligible node's text and
/// propose weighted similarity edges.
pub struct SemanticStage {
    provider: Arc<dyn EmbeddingProvider>,
    config: SemanticConfig,
}

impl SemanticStage {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: SemanticConfig) -> Self {
        Self { provider, config }
    }

    /// Propose `semantic_related` pairs for the graph. Never fails: a
    /// provider error is logged and the stage contributes nothing.
    pub async fn run(&self, graph: &EvidenceGraph) -> Vec<SemanticPair> {
        let mut ids: Vec<String> = Vec::new();
        let mut types: Vec<NodeType> = Vec::new();
        let mut texts: Vec<String> = Vec::new();
        for node in graph.nodes() {
            if !node.node_type.semantic_candidate() {
                continue;
            }
            ids.push(node.id.clone());
            types.push(node.node_type);
            texts.push(truncate_at_word(node.embedding_text(), EMBED_CHAR_BUDGET));
        }

        if ids.len() < 2 {
            log::debug!("semantic stage skipped: {} candidate nodes", ids.len());
            return Vec::new();
        }

        let vectors = match embed_all(&self.provider, texts).await {
            Ok(vectors) => vectors,
            Err(err) => {
                log::warn!("embedding failed; semantic stage contributes nothing: {err}");
                return Vec::new();
            }
        };

        let pairs = nearest_neighbor_pairs(&ids, &types, &vectors, &self.config);
        log::info!(
            "semantic stage proposed {} edges over {} candidates",
            pairs.len(),
            ids.len()
        );
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, SemanticError};
    use crate::provider::StubEmbeddingProvider;
    use async_trait::async_trait;
    use evidence_graph_core::{EvidenceNode, NodeMetadata};

    fn graph_with(nodes: &[(&str, NodeType)]) -> EvidenceGraph {
        let mut graph = EvidenceGraph::new();
        for (id, node_type) in nodes {
            graph
                .add_node(
                    EvidenceNode::new(*id, *node_type, format!("label {id}")).with_metadata(
                        NodeMetadata {
                            full_text: Some(format!("full text of {id}")),
                            ..NodeMetadata::default()
                        },
                    ),
                )
                .unwrap();
        }
        graph
    }

    struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        async fn embed_batch(&self, _texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Err(SemanticError::Provider("unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn provider_failure_contributes_nothing() {
        let graph = graph_with(&[
            ("b1", NodeType::AnswerBlock),
            ("s1", NodeType::DirectSource),
            ("s2", NodeType::DirectSource),
        ]);
        let stage = SemanticStage::new(Arc::new(FailingProvider), SemanticConfig::default());

        assert!(stage.run(&graph).await.is_empty());
    }

    #[tokio::test]
    async fn roots_are_not_embedded() {
        struct Recorder {
            inner: StubEmbeddingProvider,
            seen: std::sync::Mutex<Vec<String>>,
        }

        #[async_trait]
        impl EmbeddingProvider for Recorder {
            async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
                self.seen.lock().unwrap().extend(texts.iter().cloned());
                self.inner.embed_batch(texts).await
            }
        }

        let graph = graph_with(&[
            ("question", NodeType::Question),
            ("answer", NodeType::AnswerRoot),
            ("b1", NodeType::AnswerBlock),
            ("s1", NodeType::DirectSource),
        ]);
        let recorder = Arc::new(Recorder {
            inner: StubEmbeddingProvider::new(16),
            seen: std::sync::Mutex::new(Vec::new()),
        });
        let stage = SemanticStage::new(recorder.clone(), SemanticConfig::default());
        stage.run(&graph).await;

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|t| !t.contains("question")));
    }

    #[tokio::test]
    async fn single_candidate_skips_the_provider() {
        let graph = graph_with(&[("s1", NodeType::DirectSource)]);
        let stage = SemanticStage::new(
            Arc::new(StubEmbeddingProvider::new(16)),
            SemanticConfig::default(),
        );
        assert!(stage.run(&graph).await.is_empty());
    }

    #[tokio::test]
    async fn identical_texts_produce_a_pair() {
        let mut graph = EvidenceGraph::new();
        for id in ["s1", "s2"] {
            graph
                .add_node(
                    EvidenceNode::new(id, NodeType::DirectSource, "same label").with_metadata(
                        NodeMetadata {
                            full_text: Some("identical text".to_string()),
                            ..NodeMetadata::default()
                        },
                    ),
                )
                .unwrap();
        }
        let stage = SemanticStage::new(
            Arc::new(StubEmbeddingProvider::new(32)),
            SemanticConfig {
                top_k: 3,
                min_similarity: 0.99,
                max_edges: 10,
            },
        );

        let pairs = stage.run(&graph).await;
        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].a.as_str(), pairs[0].b.as_str()), ("s1", "s2"));
        assert!(pairs[0].similarity > 0.99);
    }
}
