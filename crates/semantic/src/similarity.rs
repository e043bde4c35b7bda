use evidence_graph_core::{NodeType, SemanticPair};
use evidence_protocol::SemanticConfig;
use std::collections::HashMap;

/// Cosine similarity of two vectors. Returns 0.0 on length mismatch or when
/// either vector has zero norm, so a degenerate embedding can never produce
/// a NaN weight.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Per-node top-K nearest-neighbor edge selection over the full candidate
/// set (brute force; the per-request node count is small).
///
/// `ids`, `types` and `vectors` are parallel slices. Only pairs whose two
/// types are both semantic candidates are considered, never self-pairs.
/// Each node keeps its `top_k` neighbors with similarity ≥ `min_similarity`;
/// pairs found from either direction collapse into one canonical entry, and
/// the survivors are capped globally at `max_edges`, best first.
pub fn nearest_neighbor_pairs(
    ids: &[String],
    types: &[NodeType],
    vectors: &[Vec<f32>],
    config: &SemanticConfig,
) -> Vec<SemanticPair> {
    debug_assert_eq!(ids.len(), types.len());
    debug_assert_eq!(ids.len(), vectors.len());

    let mut by_pair: HashMap<(String, String), f32> = HashMap::new();

    for i in 0..ids.len() {
        if !types[i].semantic_candidate() {
            continue;
        }

        let mut neighbors: Vec<(usize, f32)> = (0..ids.len())
            .filter(|&j| j != i && types[j].semantic_candidate())
            .map(|j| (j, cosine_similarity(&vectors[i], &vectors[j])))
            .filter(|(_, similarity)| *similarity >= config.min_similarity)
            .collect();

        neighbors.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        neighbors.truncate(config.top_k);

        for (j, similarity) in neighbors {
            if let Some(pair) = SemanticPair::new(ids[i].clone(), ids[j].clone(), similarity) {
                by_pair.entry((pair.a.clone(), pair.b.clone())).or_insert(pair.similarity);
            }
        }
    }

    let mut pairs: Vec<SemanticPair> = by_pair
        .into_iter()
        .map(|((a, b), similarity)| SemanticPair { a, b, similarity })
        .collect();

    // Similarity descending; endpoint ids break exact ties so the cap cuts
    // deterministically.
    pairs.sort_by(|x, y| {
        y.similarity
            .partial_cmp(&x.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| x.a.cmp(&y.a))
            .then_with(|| x.b.cmp(&y.b))
    });
    pairs.truncate(config.max_edges);
    pairs
}
