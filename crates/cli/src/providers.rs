use anyhow::{Context as AnyhowContext, Result};
use async_trait::async_trait;
use evidence_concepts::{parse_descriptors, ConceptDescriptor, ConceptError, ConceptExtractor};
use evidence_protocol::SourceRecord;
use evidence_semantic::{EmbeddingProvider, SemanticError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP concept extractor: one JSON POST per source.
pub struct HttpConceptExtractor {
    client: Client,
    url: String,
}

#[derive(Serialize)]
struct ConceptRequest<'a> {
    question: &'a str,
    source: &'a SourceRecord,
    citing_branch_ids: &'a [String],
}

impl HttpConceptExtractor {
    pub fn new(url: String, timeout_ms: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .context("failed to build HTTP client for the concept extractor")?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl ConceptExtractor for HttpConceptExtractor {
    async fn extract(
        &self,
        question: &str,
        source: &SourceRecord,
        citing_branch_ids: &[String],
    ) -> evidence_concepts::Result<Vec<ConceptDescriptor>> {
        let body = ConceptRequest {
            question,
            source,
            citing_branch_ids,
        };
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|err| ConceptError::Extractor(err.to_string()))?
            .error_for_status()
            .map_err(|err| ConceptError::Extractor(err.to_string()))?;
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|err| ConceptError::Payload(err.to_string()))?;
        parse_descriptors(&payload)
    }
}

/// HTTP embedding provider: one JSON POST per batch.
pub struct HttpEmbeddingProvider {
    client: Client,
    url: String,
    batch_size: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    vectors: Vec<Vec<f32>>,
}

impl HttpEmbeddingProvider {
    pub fn new(url: String, timeout_ms: u64, batch_size: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .context("failed to build HTTP client for the embedding provider")?;
        Ok(Self {
            client,
            url,
            batch_size: batch_size.max(1),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed_batch(&self, texts: Vec<String>) -> evidence_semantic::Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(&self.url)
            .json(&EmbedRequest { texts: &texts })
            .send()
            .await
            .map_err(|err| SemanticError::Provider(err.to_string()))?
            .error_for_status()
            .map_err(|err| SemanticError::Provider(err.to_string()))?;
        let payload: EmbedResponse = response
            .json()
            .await
            .map_err(|err| SemanticError::Provider(format!("malformed response: {err}")))?;
        Ok(payload.vectors)
    }

    fn max_batch(&self) -> usize {
        self.batch_size
    }
}
