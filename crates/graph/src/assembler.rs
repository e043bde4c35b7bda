use crate::error::Result;
use crate::graph::EvidenceGraph;
use crate::types::{EvidenceEdge, EvidenceNode, NodeMetadata, NodeType, Relation};
use crate::validate::validate;
use crate::weights::{
    ANSWERS_WEIGHT, ANSWER_LABEL_BUDGET, ANSWER_ROOT_ID, QUESTION_LABEL_BUDGET, QUESTION_NODE_ID,
    SUPPORTS_WEIGHT,
};
use evidence_protocol::{truncate_label, GraphRequest};
use std::collections::{HashMap, HashSet};

/// Output of the core assembly: the mandatory hierarchy (layers 0–2) plus
/// the citation table the concept stage ranks sources by.
pub struct Assembly {
    pub graph: EvidenceGraph,
    /// source id → ids of the distinct blocks citing it, in block order.
    pub citations: HashMap<String, Vec<String>>,
}

/// Build the mandatory hierarchy from a validated request.
///
/// Phase 1 creates the nodes layer by layer (question, answer root, blocks,
/// sources), phase 2 wires the `supports` edges. A citation of a source id
/// absent from the source list is dropped with a warning; it is not fatal.
pub fn assemble(request: &GraphRequest) -> Result<Assembly> {
    validate(request)?;

    let mut graph = EvidenceGraph::new();

    graph.add_node(
        EvidenceNode::new(
            QUESTION_NODE_ID,
            NodeType::Question,
            truncate_label(&request.question, QUESTION_LABEL_BUDGET),
        )
        .with_metadata(NodeMetadata {
            full_text: Some(request.question.clone()),
            ..NodeMetadata::default()
        }),
    )?;

    graph.add_node(
        EvidenceNode::new(
            ANSWER_ROOT_ID,
            NodeType::AnswerRoot,
            truncate_label(&request.answer.text, ANSWER_LABEL_BUDGET),
        )
        .with_metadata(NodeMetadata {
            full_text: Some(request.answer.text.clone()),
            ..NodeMetadata::default()
        }),
    )?;

    graph.try_add_edge(
        QUESTION_NODE_ID,
        ANSWER_ROOT_ID,
        EvidenceEdge {
            relation: Relation::Answers,
            weight: Some(ANSWERS_WEIGHT),
        },
    );

    // Layer 1: one node per block, in input order, hanging off the root.
    for block in &request.answer.blocks {
        graph.add_node(
            EvidenceNode::new(
                block.id.clone(),
                NodeType::AnswerBlock,
                truncate_label(&block.text, ANSWER_LABEL_BUDGET),
            )
            .with_metadata(NodeMetadata {
                full_text: Some(block.text.clone()),
                branch_id: Some(block.id.clone()),
                primary_parent: Some(ANSWER_ROOT_ID.to_string()),
                ..NodeMetadata::default()
            }),
        )?;
        graph.try_add_edge(
            ANSWER_ROOT_ID,
            &block.id,
            EvidenceEdge {
                relation: Relation::Answers,
                weight: Some(ANSWERS_WEIGHT),
            },
        );
    }

    // Citation table: distinct citing blocks per source, in block order.
    let known_sources: HashSet<&str> = request.sources.iter().map(|s| s.id.as_str()).collect();
    let mut citations: HashMap<String, Vec<String>> = HashMap::new();
    for block in &request.answer.blocks {
        for source_id in &block.source_ids {
            if !known_sources.contains(source_id.as_str()) {
                log::warn!(
                    "block '{}' cites unknown source '{}'; citation dropped",
                    block.id,
                    source_id
                );
                continue;
            }
            let citing = citations.entry(source_id.clone()).or_default();
            if !citing.contains(&block.id) {
                citing.push(block.id.clone());
            }
        }
    }

    // Layer 2: one node per source, in input order. Branch affiliation goes
    // to the first citing block in block order, never the most-citing one.
    for source in &request.sources {
        let citing = citations.get(&source.id);
        let citation_count = citing.map_or(0, Vec::len);
        let first_citing = citing.and_then(|blocks| blocks.first()).cloned();
        graph.add_node(
            EvidenceNode::new(
                source.id.clone(),
                NodeType::DirectSource,
                truncate_label(&source.title, ANSWER_LABEL_BUDGET),
            )
            .with_metadata(NodeMetadata {
                full_text: source.snippet.clone(),
                relevance: Some(source.score),
                citation_count: Some(citation_count),
                branch_id: first_citing.clone(),
                primary_parent: first_citing,
                url: source.url.clone(),
                ..NodeMetadata::default()
            }),
        )?;
    }

    // Phase 2: supports edges, deduplicated per (block, source) pair.
    for block in &request.answer.blocks {
        let mut seen: HashSet<&str> = HashSet::new();
        for source_id in &block.source_ids {
            if !known_sources.contains(source_id.as_str()) || !seen.insert(source_id) {
                continue;
            }
            graph.try_add_edge(
                &block.id,
                source_id,
                EvidenceEdge {
                    relation: Relation::Supports,
                    weight: Some(SUPPORTS_WEIGHT),
                },
            );
        }
    }

    log::info!(
        "assembled evidence hierarchy: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    Ok(Assembly { graph, citations })
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidence_protocol::{AnswerBlock, AnswerPayload, SourceRecord};
    use pretty_assertions::assert_eq;

    fn block(id: &str, source_ids: &[&str]) -> AnswerBlock {
        AnswerBlock {
            id: id.to_string(),
            block_type: Some("paragraph".to_string()),
            text: format!("text of {id}"),
            source_ids: source_ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn source(id: &str) -> SourceRecord {
        SourceRecord {
            id: id.to_string(),
            title: format!("title of {id}"),
            url: Some(format!("https://example.com/{id}")),
            snippet: Some(format!("snippet of {id}")),
            score: 0.5,
            metadata: None,
        }
    }

    fn request(blocks: Vec<AnswerBlock>, sources: Vec<SourceRecord>) -> GraphRequest {
        GraphRequest {
            question: "What is the capital of France?".to_string(),
            answer: AnswerPayload {
                text: "Paris is the capital of France.".to_string(),
                blocks,
            },
            sources,
        }
    }

    #[test]
    fn builds_the_mandatory_hierarchy() {
        // Scenario: one block citing s1 and s2, with s3 uncited.
        let req = request(
            vec![block("ans-1", &["s1", "s2"])],
            vec![source("s1"), source("s2"), source("s3")],
        );
        let assembly = assemble(&req).unwrap();
        let graph = &assembly.graph;

        let ids: Vec<&str> = graph.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["question", "answer", "ans-1", "s1", "s2", "s3"]);

        let edges: Vec<(String, String)> = graph
            .edges()
            .map(|e| (e.from.clone(), e.to.clone()))
            .collect();
        assert!(edges.contains(&("question".to_string(), "answer".to_string())));
        assert!(edges.contains(&("answer".to_string(), "ans-1".to_string())));
        assert!(edges.contains(&("ans-1".to_string(), "s1".to_string())));
        assert!(edges.contains(&("ans-1".to_string(), "s2".to_string())));
        assert_eq!(edges.len(), 4);

        let s3 = graph.node("s3").unwrap();
        assert_eq!(s3.metadata.citation_count, Some(0));
        assert_eq!(s3.metadata.branch_id, None);
    }

    #[test]
    fn unknown_citation_is_dropped_without_error() {
        let req = request(vec![block("ans-1", &["s9"])], vec![source("s1")]);
        let assembly = assemble(&req).unwrap();

        assert!(!assembly.graph.contains("s9"));
        assert!(assembly.graph.sources_cited_by("ans-1").is_empty());
        assert!(assembly.citations.is_empty());
    }

    #[test]
    fn co_cited_source_belongs_to_first_block() {
        let req = request(
            vec![block("ans-1", &["s1"]), block("ans-2", &["s1"])],
            vec![source("s1")],
        );
        let assembly = assemble(&req).unwrap();

        let s1 = assembly.graph.node("s1").unwrap();
        assert_eq!(s1.metadata.citation_count, Some(2));
        assert_eq!(s1.metadata.branch_id.as_deref(), Some("ans-1"));
        assert_eq!(s1.metadata.primary_parent.as_deref(), Some("ans-1"));
        assert_eq!(assembly.citations["s1"], vec!["ans-1", "ans-2"]);
    }

    #[test]
    fn repeated_citations_in_one_block_collapse() {
        let req = request(vec![block("ans-1", &["s1", "s1", "s1"])], vec![source("s1")]);
        let assembly = assemble(&req).unwrap();

        assert_eq!(assembly.graph.node("s1").unwrap().metadata.citation_count, Some(1));
        let supports: Vec<_> = assembly
            .graph
            .edges()
            .filter(|e| e.relation == Relation::Supports)
            .collect();
        assert_eq!(supports.len(), 1);
    }

    #[test]
    fn long_answer_gets_a_truncated_label() {
        let mut req = request(vec![block("ans-1", &[])], vec![]);
        req.answer.text = "word ".repeat(60);
        let assembly = assemble(&req).unwrap();

        let root = assembly.graph.node("answer").unwrap();
        assert!(root.label.chars().count() <= 100);
        assert!(root.label.ends_with("..."));
        assert_eq!(root.metadata.full_text.as_deref(), Some(req.answer.text.as_str()));
    }

    #[test]
    fn invalid_request_is_fatal() {
        let req = request(vec![], vec![source("s1")]);
        assert!(assemble(&req).is_err());
    }
}
