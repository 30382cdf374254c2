//! Memory store data types.

use serde::{Deserialize, Serialize};

/// A stored fact and its embedding.
///
/// The memory bank snapshot is a JSON array of these records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A record ranked against a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    /// Cosine similarity to the query (-1.0 to 1.0, higher = closer).
    pub score: f64,
}

/// Whether the bank snapshot reached storage after a mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Persistence {
    Flushed,
    /// The in-memory bank holds the change but storage does not.
    Failed { reason: String },
}

/// Result of `MemoryStore::add`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddResult {
    /// Identifier assigned to the new record.
    pub id: String,
    pub persistence: Persistence,
}

impl AddResult {
    pub fn is_persisted(&self) -> bool {
        matches!(self.persistence, Persistence::Flushed)
    }
}
