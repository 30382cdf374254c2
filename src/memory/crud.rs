//! Insert and read operations for the memory store.

use tracing::debug;
use uuid::Uuid;

use crate::errors::Error;
use crate::memory_types::{AddResult, MemoryRecord};
use crate::similarity::validate_embedding;

use super::store::MemoryStore;

impl MemoryStore {
    #[must_use = "handle the error or results may be lost"]
    /// Embed `text` and append it to the bank, then flush the bank.
    ///
    /// A failed flush does not fail the call: the record stays in memory and
    /// `AddResult::persistence` reports the failure.
    ///
    /// Any text is accepted; the tokenizer truncates long inputs.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Embedding generation fails
    /// - The embedding is empty, all zeros, or holds NaN/infinite values
    /// - The embedding length differs from the bank's dimension
    ///
    /// Nothing is appended or persisted on error.
    pub fn add(&mut self, text: &str) -> Result<AddResult, Error> {
        let embedding = self.embed(text)?;

        validate_embedding(&embedding)?;
        if let Some(expected) = self.dimension() {
            if embedding.len() != expected {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }

        let id = Uuid::new_v4().to_string();
        self.bank.push(MemoryRecord {
            id: id.clone(),
            text: text.to_string(),
            embedding,
        });

        let persistence = self.persist();
        debug!(id = %id, records = self.bank.len(), "Added memory");

        Ok(AddResult { id, persistence })
    }

    /// Get a specific record by ID.
    pub fn get(&self, id: &str) -> Option<&MemoryRecord> {
        self.bank.iter().find(|record| record.id == id)
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[MemoryRecord] {
        &self.bank
    }

    pub fn len(&self) -> usize {
        self.bank.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bank.is_empty()
    }
}
