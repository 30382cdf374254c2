//! Semantic search over the memory bank.

use tracing::debug;

use crate::errors::Error;
use crate::memory_types::SearchHit;
use crate::similarity::{cosine_similarity, validate_embedding};

use super::store::MemoryStore;

impl MemoryStore {
    #[must_use = "handle the error or results may be lost"]
    /// Search records by semantic similarity to `query`.
    ///
    /// Scores every record, sorts by score (highest first) and returns at
    /// most `top_k` hits. Records with equal scores keep insertion order.
    ///
    /// # Returns
    ///
    /// An empty vector when the bank is empty or `top_k` is 0; no model is
    /// loaded in that case.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Embedding generation fails
    /// - The query embedding is empty, all zeros, or holds NaN/infinite values
    /// - The query embedding length differs from the stored embeddings
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, Error> {
        if self.bank.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embed(query)?;
        validate_embedding(&query_embedding)?;

        let mut hits = self
            .bank
            .iter()
            .map(|record| {
                Ok(SearchHit {
                    id: record.id.clone(),
                    text: record.text.clone(),
                    score: cosine_similarity(&query_embedding, &record.embedding)?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        rank(&mut hits);
        hits.truncate(top_k);

        debug!(candidates = self.bank.len(), returned = hits.len(), "Search complete");
        Ok(hits)
    }
}

/// Sort by descending score; the stable sort keeps insertion order on ties.
pub(crate) fn rank(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
}
