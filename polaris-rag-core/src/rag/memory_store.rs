//! In-memory vector index with exhaustive search.

use super::metric::Metric;
use super::store::{validate_vector, Result, VectorIndex};
use super::types::DocumentId;
use std::collections::BTreeMap;

/// A brute-force in-memory vector index.
///
/// Every search is a linear scan computing the metric against each stored
/// vector, so results are exact. Vectors are kept in id order, which makes
/// tie-breaking deterministic: equal distances come back in ascending id order.
///
/// Suitable for small collections, tests, and as the in-memory half of
/// [`DurableCollection`](super::durable_store::DurableCollection).
#[derive(Debug, Clone)]
pub struct MemoryIndex {
    metric: Metric,
    dimension: usize,
    vectors: BTreeMap<DocumentId, Vec<f32>>,
}

impl MemoryIndex {
    pub fn new(metric: Metric, dimension: usize) -> Self {
        Self {
            metric,
            dimension,
            vectors: BTreeMap::new(),
        }
    }

    pub fn get(&self, id: DocumentId) -> Option<&[f32]> {
        self.vectors.get(&id).map(Vec::as_slice)
    }

}

impl VectorIndex for MemoryIndex {
    fn insert(&mut self, id: DocumentId, vector: &[f32]) -> Result<()> {
        validate_vector(vector, self.dimension)?;
        self.vectors.insert(id, vector.to_vec());
        Ok(())
    }

    fn search_where(
        &self,
        query: &[f32],
        k: usize,
        accept: &dyn Fn(DocumentId) -> bool,
    ) -> Result<Vec<(DocumentId, f32)>> {
        validate_vector(query, self.dimension)?;

        let mut results: Vec<(DocumentId, f32)> = self
            .vectors
            .iter()
            .filter(|(id, _)| accept(**id))
            .map(|(id, vector)| (*id, self.metric.distance(query, vector)))
            .collect();

        // Stable sort keeps id order among equal distances. Overflowing
        // components can still yield NaN, whatever its sign it ranks last.
        results.sort_by(|a, b| {
            a.1.is_nan()
                .cmp(&b.1.is_nan())
                .then_with(|| a.1.total_cmp(&b.1))
        });
        results.truncate(k);
        Ok(results)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn metric(&self) -> Metric {
        self.metric
    }
}
