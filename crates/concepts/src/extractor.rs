use crate::error::Result;
use async_trait::async_trait;
use evidence_protocol::{truncate_label, SourceRecord};
use serde::{Deserialize, Serialize};

/// Character budget for a concept's short display label.
pub const SHORT_LABEL_BUDGET: usize = 40;

/// One supporting concept returned by the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptDescriptor {
    pub title: String,
    pub text: String,
    pub short_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<f32>,
}

/// External collaborator that derives supporting concepts from one source.
///
/// Implementations may time out or fail per call; the caller isolates each
/// failure to its source. The extractor ranks its own output: the first
/// descriptors are the ones worth keeping.
#[async_trait]
pub trait ConceptExtractor: Send + Sync {
    async fn extract(
        &self,
        question: &str,
        source: &SourceRecord,
        citing_branch_ids: &[String],
    ) -> Result<Vec<ConceptDescriptor>>;
}

/// Deterministic in-process extractor for tests and offline runs: derives
/// concepts from the source snippet's sentences, no model behind it.
#[derive(Debug, Clone, Default)]
pub struct StubConceptExtractor;

#[async_trait]
impl ConceptExtractor for StubConceptExtractor {
    async fn extract(
        &self,
        _question: &str,
        source: &SourceRecord,
        _citing_branch_ids: &[String],
    ) -> Result<Vec<ConceptDescriptor>> {
        let text = source.snippet.as_deref().unwrap_or(&source.title);
        let descriptors = text
            .split(['.', '!', '?'])
            .map(str::trim)
            .filter(|sentence| !sentence.is_empty())
            .take(3)
            .enumerate()
            .map(|(index, sentence)| ConceptDescriptor {
                title: truncate_label(sentence, 60),
                text: sentence.to_string(),
                short_label: truncate_label(sentence, SHORT_LABEL_BUDGET),
                importance: Some(0.8 - 0.1 * index as f32),
            })
            .collect();
        Ok(descriptors)
    }
}
