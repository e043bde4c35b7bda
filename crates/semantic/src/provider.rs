use crate::error::{Result, SemanticError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Batch size used when a provider does not declare its own.
pub const DEFAULT_MAX_BATCH: usize = 32;

/// External collaborator turning text batches into embedding vectors.
///
/// A call must return exactly one vector per input text, in input order,
/// all of one dimensionality.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Largest batch a single call accepts.
    fn max_batch(&self) -> usize {
        DEFAULT_MAX_BATCH
    }
}

/// Embed an arbitrary number of texts through provider-sized batches.
///
/// Batches are issued concurrently but reassembled in submission order, so
/// the returned vectors re-align to the input texts by index. Any batch
/// failure fails the whole call; the caller treats that as "stage produced
/// nothing".
pub async fn embed_all(
    provider: &Arc<dyn EmbeddingProvider>,
    texts: Vec<String>,
) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let batch_size = provider.max_batch().max(1);
    let batches: Vec<Vec<String>> = texts
        .chunks(batch_size)
        .map(|chunk| chunk.to_vec())
        .collect();

    let mut tasks = JoinSet::new();
    for (index, batch) in batches.into_iter().enumerate() {
        let provider = Arc::clone(provider);
        tasks.spawn(async move {
            let expected = batch.len();
            let vectors = provider.embed_batch(batch).await?;
            if vectors.len() != expected {
                return Err(SemanticError::BatchMismatch {
                    expected,
                    actual: vectors.len(),
                });
            }
            Ok::<_, SemanticError>((index, vectors))
        });
    }

    let batch_count = texts.len().div_ceil(batch_size);
    let mut ordered: Vec<Option<Vec<Vec<f32>>>> = vec![None; batch_count];
    while let Some(joined) = tasks.join_next().await {
        let (index, vectors) =
            joined.map_err(|err| SemanticError::Provider(format!("task failed: {err}")))??;
        ordered[index] = Some(vectors);
    }

    let mut all = Vec::with_capacity(texts.len());
    for slot in ordered {
        let vectors = slot.ok_or_else(|| {
            SemanticError::Provider("missing batch result".to_string())
        })?;
        all.extend(vectors);
    }

    // One dimensionality per call.
    if let Some(first) = all.first() {
        let expected = first.len();
        for vector in &all {
            if vector.len() != expected {
                return Err(SemanticError::InvalidDimension {
                    expected,
                    actual: vector.len(),
                });
            }
        }
    }

    Ok(all)
}

/// Deterministic hash-based provider for tests and offline runs. Produces
/// unit-free pseudo-vectors: equal texts map to equal vectors, nothing more
/// is promised.
#[derive(Debug, Clone)]
pub struct StubEmbeddingProvider {
    dimension: usize,
}

impl StubEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for StubEmbeddingProvider {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbeddingProvider {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| stub_embed(text, self.dimension))
            .collect())
    }
}

fn stub_embed(text: &str, dimension: usize) -> Vec<f32> {
    let mut state =
        fnv1a_64(text.as_bytes()) ^ (dimension as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut vec = Vec::with_capacity(dimension);
    for _ in 0..dimension {
        let bits = splitmix64(&mut state);
        let high = (bits >> 32) as u32;
        let mantissa = high >> 9;
        let unit = f32::from_bits(0x3f80_0000 | mantissa) - 1.0;
        vec.push(unit.mul_add(2.0, -1.0));
    }
    vec
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider with a tiny batch limit that records how many calls it saw.
    struct SmallBatchProvider {
        calls: AtomicUsize,
        fail_from_call: Option<usize>,
    }

    impl SmallBatchProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_from_call: None,
            }
        }

        fn failing_from(call: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_from_call: Some(call),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for SmallBatchProvider {
        async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(fail_from) = self.fail_from_call {
                if call >= fail_from {
                    return Err(SemanticError::Provider("down".to_string()));
                }
            }
            // Encode the text length so order is observable.
            Ok(texts
                .iter()
                .map(|t| vec![t.len() as f32, 1.0])
                .collect())
        }

        fn max_batch(&self) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn batches_reassemble_in_submission_order() {
        let provider: Arc<dyn EmbeddingProvider> = Arc::new(SmallBatchProvider::new());
        let texts: Vec<String> = (1..=5).map(|n| "x".repeat(n)).collect();

        let vectors = embed_all(&provider, texts).await.unwrap();

        let lengths: Vec<f32> = vectors.iter().map(|v| v[0]).collect();
        assert_eq!(lengths, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[tokio::test]
    async fn any_batch_failure_fails_the_call() {
        let provider: Arc<dyn EmbeddingProvider> =
            Arc::new(SmallBatchProvider::failing_from(1));
        let texts: Vec<String> = (1..=5).map(|n| "x".repeat(n)).collect();

        assert!(embed_all(&provider, texts).await.is_err());
    }

    #[tokio::test]
    async fn empty_input_embeds_to_nothing() {
        let provider: Arc<dyn EmbeddingProvider> = Arc::new(SmallBatchProvider::new());
        let vectors = embed_all(&provider, vec![]).await.unwrap();
        assert!(vectors.is_empty());
    }

    #[tokio::test]
    async fn stub_vectors_are_deterministic() {
        let provider = StubEmbeddingProvider::new(16);
        let a = provider
            .embed_batch(vec!["hello".to_string()])
            .await
            .unwrap();
        let b = provider
            .embed_batch(vec!["hello".to_string(), "world".to_string()])
            .await
            .unwrap();

        assert_eq!(a[0], b[0]);
        assert_ne!(b[0], b[1]);
        assert_eq!(a[0].len(), 16);
        assert!(a[0].iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[tokio::test]
    async fn mismatched_count_is_an_error() {
        struct ShortProvider;

        #[async_trait]
        impl EmbeddingProvider for ShortProvider {
            async fn embed_batch(&self, _texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
                Ok(vec![vec![1.0]])
            }
        }

        let provider: Arc<dyn EmbeddingProvider> = Arc::new(ShortProvider);
        let texts = vec!["a".to_string(), "b".to_string()];
        assert!(matches!(
            embed_all(&provider, texts).await,
            Err(SemanticError::BatchMismatch { expected: 2, actual: 1 })
        ));
    }
}
