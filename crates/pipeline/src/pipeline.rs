use crate::error::Result;
use evidence_concepts::{ConceptExtractor, ConceptStage};
use evidence_graph_core::{assemble, Assembly, GraphArtifact, LayerContribution};
use evidence_protocol::{DensityConfig, GraphRequest, SemanticConfig};
use evidence_semantic::{EmbeddingProvider, SemanticStage};
use std::sync::Arc;

/// One evidence-graph build per call: stateless across requests, collaborator
/// handles owned by whoever constructed the pipeline.
pub struct GraphPipeline {
    concept_extractor: Option<Arc<dyn ConceptExtractor>>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    density: DensityConfig,
    semantic: SemanticConfig,
}

impl GraphPipeline {
    pub fn new() -> Self {
        Self {
            concept_extractor: None,
            embedding_provider: None,
            density: DensityConfig::default(),
            semantic: SemanticConfig::default(),
        }
    }

    pub fn with_density(mut self, density: DensityConfig) -> Self {
        self.density = density;
        self
    }

    pub fn with_semantic_config(mut self, semantic: SemanticConfig) -> Self {
        self.semantic = semantic;
        self
    }

    pub fn with_concept_extractor(mut self, extractor: Arc<dyn ConceptExtractor>) -> Self {
        self.concept_extractor = Some(extractor);
        self
    }

    pub fn with_embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Build the evidence graph for one request.
    ///
    /// The mandatory hierarchy either fully succeeds or this returns the
    /// validation error; enrichment stages are additive and best-effort, so
    /// the artifact is structurally valid even under total collaborator
    /// failure.
    pub async fn build(&self, request: &GraphRequest) -> Result<GraphArtifact> {
        let assembly = assemble(request)?;

        let concept_layer = match &self.concept_extractor {
            Some(extractor) => {
                ConceptStage::new(Arc::clone(extractor), self.density)
                    .run(request, &assembly)
                    .await
            }
            None => {
                log::debug!("no concept extractor configured; skipping layer 3");
                LayerContribution::default()
            }
        };

        let Assembly { mut graph, .. } = assembly;
        graph.merge_concepts(concept_layer);

        if let Some(provider) = &self.embedding_provider {
            let pairs = SemanticStage::new(Arc::clone(provider), self.semantic)
                .run(&graph)
                .await;
            let added = graph.merge_semantic(pairs);
            log::debug!("merged {added} semantic edges");
        } else {
            log::debug!("no embedding provider configured; skipping semantic edges");
        }

        Ok(graph.into_artifact())
    }
}

impl Default for GraphPipeline {
    fn default() -> Self {
        Self::new()
    }
}
