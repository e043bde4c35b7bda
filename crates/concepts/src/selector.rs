use crate::extractor::{ConceptDescriptor, ConceptExtractor};
use evidence_graph_core::weights::UNDERPINS_WEIGHT;
use evidence_graph_core::{
    Assembly, EdgeRecord, EvidenceNode, LayerContribution, NodeMetadata, NodeType, Relation,
};
use evidence_protocol::{DensityConfig, GraphRequest, SourceRecord};
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::task::JoinSet;

/// The concept selection/aggregation stage.
///
/// Ranks cited sources, runs the extractor once per eligible source (the
/// calls are independent and run concurrently), then accepts descriptors in
/// ranked-source order under the density budget so the result is
/// deterministic regardless of completion order.
pub struct ConceptStage {
    extractor: Arc<dyn ConceptExtractor>,
    density: DensityConfig,
}

impl ConceptStage {
    pub fn new(extractor: Arc<dyn ConceptExtractor>, density: DensityConfig) -> Self {
        Self { extractor, density }
    }

    /// Produce the layer-3 contribution. Never fails: per-source extraction
    /// errors are logged and skipped, and an unusable extractor yields an
    /// empty contribution.
    pub async fn run(&self, request: &GraphRequest, assembly: &Assembly) -> LayerContribution {
        let ranked = rank_sources(request, assembly, self.density.top_sources_to_process);
        if ranked.is_empty() {
            log::debug!("no cited sources eligible for concept extraction");
            return LayerContribution::default();
        }

        let mut tasks = JoinSet::new();
        for (index, source) in ranked.iter().enumerate() {
            let extractor = Arc::clone(&self.extractor);
            let question = request.question.clone();
            let source = (*source).clone();
            let citing = assembly
                .citations
                .get(&source.id)
                .cloned()
                .unwrap_or_default();
            tasks.spawn(async move {
                let result = extractor.extract(&question, &source, &citing).await;
                (index, result)
            });
        }

        // Failures stay isolated to their source; the slot just stays empty.
        let mut extracted: Vec<Option<Vec<ConceptDescriptor>>> = vec![None; ranked.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(descriptors))) => extracted[index] = Some(descriptors),
                Ok((index, Err(err))) => {
                    log::warn!(
                        "concept extraction failed for source '{}': {err}",
                        ranked[index].id
                    );
                }
                Err(err) => log::warn!("concept extraction task panicked: {err}"),
            }
        }

        self.aggregate(assembly, &ranked, extracted)
    }

    /// Accept descriptors in ranked-source order. The global cap stops
    /// acceptance the moment it is reached, even mid-source.
    fn aggregate(
        &self,
        assembly: &Assembly,
        ranked: &[&SourceRecord],
        mut extracted: Vec<Option<Vec<ConceptDescriptor>>>,
    ) -> LayerContribution {
        let mut contribution = LayerContribution::default();
        let mut total = 0;

        'sources: for (index, source) in ranked.iter().enumerate() {
            let Some(descriptors) = extracted[index].take() else {
                continue;
            };
            let citing = assembly
                .citations
                .get(&source.id)
                .cloned()
                .unwrap_or_default();
            let branch = citing.first().cloned();

            for (concept_index, descriptor) in descriptors
                .into_iter()
                .take(self.density.concepts_per_source)
                .enumerate()
            {
                if total >= self.density.max_total_concepts {
                    log::debug!(
                        "concept budget of {} reached; stopping at source '{}'",
                        self.density.max_total_concepts,
                        source.id
                    );
                    break 'sources;
                }

                let id = format!("sec-{}-{}", source.id, concept_index);
                contribution.nodes.push(
                    EvidenceNode::new(id.clone(), NodeType::SecondarySource, descriptor.short_label)
                        .with_metadata(NodeMetadata {
                            full_text: Some(descriptor.text),
                            importance: descriptor.importance.map(|i| i.clamp(0.0, 1.0)),
                            parent_source: Some(source.id.clone()),
                            primary_parent: Some(source.id.clone()),
                            branch_id: branch.clone(),
                            related_blocks: citing.clone(),
                            ..NodeMetadata::default()
                        }),
                );
                contribution.edges.push(EdgeRecord {
                    from: source.id.clone(),
                    to: id,
                    relation: Relation::Underpins,
                    weight: Some(UNDERPINS_WEIGHT),
                });
                total += 1;
            }
        }

        log::info!(
            "concept stage produced {} concepts from {} eligible sources",
            contribution.nodes.len(),
            ranked.len()
        );
        contribution
    }
}

/// Sources ranked for extraction: citation count descending, relevance score
/// breaking ties, zero-citation sources excluded, capped to the top N.
fn rank_sources<'a>(
    request: &'a GraphRequest,
    assembly: &Assembly,
    top: usize,
) -> Vec<&'a SourceRecord> {
    let citation_count = |source: &SourceRecord| {
        assembly
            .citations
            .get(&source.id)
            .map_or(0, Vec::len)
    };

    let mut ranked: Vec<&SourceRecord> = request
        .sources
        .iter()
        .filter(|source| citation_count(source) > 0)
        .collect();
    ranked.sort_by(|a, b| {
        citation_count(b)
            .cmp(&citation_count(a))
            .then(b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
    });
    ranked.truncate(top);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConceptError, Result};
    use async_trait::async_trait;
    use evidence_graph_core::assemble;
    use evidence_protocol::{AnswerBlock, AnswerPayload};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    fn block(id: &str, source_ids: &[&str]) -> AnswerBlock {
        AnswerBlock {
            id: id.to_string(),
            block_type: None,
            text: format!("text of {id}"),
            source_ids: source_ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn source(id: &str, score: f32) -> SourceRecord {
        SourceRecord {
            id: id.to_string(),
            title: format!("title of {id}"),
            url: None,
            snippet: Some(format!("snippet of {id}")),
            score,
            metadata: None,
        }
    }

    fn request(blocks: Vec<AnswerBlock>, sources: Vec<SourceRecord>) -> GraphRequest {
        GraphRequest {
            question: "q?".to_string(),
            answer: AnswerPayload {
                text: "a.".to_string(),
                blocks,
            },
            sources,
        }
    }

    /// Returns a fixed number of concepts per source, counting its calls.
    struct CountingExtractor {
        per_source: usize,
        calls: AtomicUsize,
        fail_for: Option<String>,
    }

    impl CountingExtractor {
        fn new(per_source: usize) -> Self {
            Self {
                per_source,
                calls: AtomicUsize::new(0),
                fail_for: None,
            }
        }

        fn failing_for(id: &str, per_source: usize) -> Self {
            Self {
                per_source,
                calls: AtomicUsize::new(0),
                fail_for: Some(id.to_string()),
            }
        }
    }

    #[async_trait]
    impl ConceptExtractor for CountingExtractor {
        async fn extract(
            &self,
            _question: &str,
            source: &SourceRecord,
            _citing: &[String],
        ) -> Result<Vec<ConceptDescriptor>> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            if self.fail_for.as_deref() == Some(source.id.as_str()) {
                return Err(ConceptError::Extractor("boom".to_string()));
            }
            Ok((0..self.per_source)
                .map(|i| ConceptDescriptor {
                    title: format!("{} concept {i}", source.id),
                    text: format!("{} concept {i} text", source.id),
                    short_label: format!("{}-c{i}", source.id),
                    importance: Some(0.9),
                })
                .collect())
        }
    }

    fn density(top: usize, per_source: usize, max_total: usize) -> DensityConfig {
        DensityConfig {
            top_sources_to_process: top,
            concepts_per_source: per_source,
            max_total_concepts: max_total,
        }
    }

    #[tokio::test]
    async fn uncited_sources_are_not_processed() {
        let req = request(
            vec![block("b1", &["s1"])],
            vec![source("s1", 0.5), source("s2", 0.9)],
        );
        let assembly = assemble(&req).unwrap();
        let extractor = Arc::new(CountingExtractor::new(1));
        let stage = ConceptStage::new(extractor.clone(), density(5, 2, 10));

        let layer = stage.run(&req, &assembly).await;

        assert_eq!(extractor.calls.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(layer.nodes.len(), 1);
        assert_eq!(layer.nodes[0].id, "sec-s1-0");
        assert_eq!(layer.nodes[0].metadata.parent_source.as_deref(), Some("s1"));
        assert_eq!(layer.nodes[0].metadata.branch_id.as_deref(), Some("b1"));
        assert_eq!(layer.nodes[0].metadata.related_blocks, vec!["b1"]);
        assert_eq!(layer.edges[0].relation, Relation::Underpins);
        assert_eq!(layer.edges[0].from, "s1");
    }

    #[tokio::test]
    async fn ranking_prefers_citations_then_score() {
        // s2 cited twice; s1 and s3 once each, s3 with the higher score.
        let req = request(
            vec![
                block("b1", &["s2", "s1"]),
                block("b2", &["s2", "s3"]),
            ],
            vec![source("s1", 0.2), source("s2", 0.1), source("s3", 0.9)],
        );
        let assembly = assemble(&req).unwrap();
        let stage = ConceptStage::new(Arc::new(CountingExtractor::new(1)), density(2, 1, 10));

        let layer = stage.run(&req, &assembly).await;
        let ids: Vec<&str> = layer.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["sec-s2-0", "sec-s3-0"]);
    }

    #[tokio::test]
    async fn cap_stops_mid_source_in_ranked_order() {
        let req = request(
            vec![block("b1", &["s1", "s2"])],
            vec![source("s1", 0.9), source("s2", 0.8)],
        );
        let assembly = assemble(&req).unwrap();
        let stage = ConceptStage::new(Arc::new(CountingExtractor::new(3)), density(5, 3, 4));

        let layer = stage.run(&req, &assembly).await;
        let ids: Vec<&str> = layer.nodes.iter().map(|n| n.id.as_str()).collect();
        // s1 contributes all three, s2 is cut off after one.
        assert_eq!(ids, vec!["sec-s1-0", "sec-s1-1", "sec-s1-2", "sec-s2-0"]);
        assert_eq!(layer.edges.len(), 4);
    }

    #[tokio::test]
    async fn per_source_failure_is_isolated() {
        let req = request(
            vec![block("b1", &["s1", "s2"])],
            vec![source("s1", 0.9), source("s2", 0.8)],
        );
        let assembly = assemble(&req).unwrap();
        let stage = ConceptStage::new(
            Arc::new(CountingExtractor::failing_for("s1", 2)),
            density(5, 2, 10),
        );

        let layer = stage.run(&req, &assembly).await;
        let ids: Vec<&str> = layer.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["sec-s2-0", "sec-s2-1"]);
    }

    #[tokio::test]
    async fn no_citations_means_empty_contribution() {
        let req = request(vec![block("b1", &[])], vec![source("s1", 0.9)]);
        let assembly = assemble(&req).unwrap();
        let extractor = Arc::new(CountingExtractor::new(2));
        let stage = ConceptStage::new(extractor.clone(), density(5, 2, 10));

        let layer = stage.run(&req, &assembly).await;
        assert!(layer.is_empty());
        assert_eq!(extractor.calls.load(AtomicOrdering::SeqCst), 0);
    }

    #[tokio::test]
    async fn per_source_limit_keeps_the_first_descriptors() {
        let req = request(vec![block("b1", &["s1"])], vec![source("s1", 0.9)]);
        let assembly = assemble(&req).unwrap();
        let stage = ConceptStage::new(Arc::new(CountingExtractor::new(5)), density(5, 2, 10));

        let layer = stage.run(&req, &assembly).await;
        let ids: Vec<&str> = layer.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["sec-s1-0", "sec-s1-1"]);
    }
}
