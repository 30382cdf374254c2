//! Core memory store struct combining embedding generation and persistence.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::errors::Error;
use crate::manager::ModelManager;
use crate::memory_types::{MemoryRecord, Persistence};
use crate::pipeline::PipelineOutput;
use crate::similarity::validate_embedding;
use crate::storage::KeyValueStore;
use crate::task::ModelTask;

/// Key the memory bank snapshot is stored under.
pub const STORAGE_KEY: &str = "orbit_memory_v1";
/// Default number of results returned by `search`.
pub const DEFAULT_TOP_K: usize = 3;

/// Memory bank of embedded facts, persisted as one snapshot.
///
/// The whole bank is rewritten to the key-value slot after every mutation.
/// Search is a linear cosine-similarity scan over all records.
///
/// # Mutability Requirements
///
/// `add` requires `&mut self`; `search` only reads the bank and can run
/// through a shared reference.
pub struct MemoryStore {
    pub(crate) models: Arc<ModelManager>,
    pub(crate) slot: Box<dyn KeyValueStore>,
    pub(crate) bank: Vec<MemoryRecord>,
}

impl MemoryStore {
    /// Open a store over `slot`, restoring any snapshot found there.
    ///
    /// A missing snapshot starts an empty bank. An unreadable or corrupt
    /// snapshot is logged and also starts an empty bank; it is overwritten by
    /// the next successful `add`.
    pub fn open(models: Arc<ModelManager>, slot: impl KeyValueStore + 'static) -> Self {
        let bank = load_snapshot(&slot);
        MemoryStore {
            models,
            slot: Box::new(slot),
            bank,
        }
    }

    /// Embedding length shared by every record, once the bank is non-empty.
    pub fn dimension(&self) -> Option<usize> {
        self.bank.first().map(|record| record.embedding.len())
    }

    /// Embed `text` with the feature-extraction pipeline, loading it if needed.
    pub(crate) fn embed(&self, text: &str) -> Result<Vec<f32>, Error> {
        self.models.load_model(ModelTask::FeatureExtraction, None)?;
        match self.models.run(ModelTask::FeatureExtraction, text)? {
            PipelineOutput::Features(tensor) => Ok(tensor.data),
            _ => Err(Error::Inference(
                "feature-extraction did not return a tensor".to_string(),
            )),
        }
    }

    /// Write the full bank to the slot.
    pub(crate) fn persist(&self) -> Persistence {
        let result = serde_json::to_string(&self.bank)
            .map_err(Error::from)
            .and_then(|blob| self.slot.set(STORAGE_KEY, &blob));

        match result {
            Ok(()) => Persistence::Flushed,
            Err(e) => {
                warn!(error = %e, records = self.bank.len(), "Failed to persist memory bank");
                Persistence::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Parse a bank snapshot.
///
/// Every embedding must be comparable (non-empty, finite, non-zero) and all
/// of them must share one dimension.
pub(crate) fn decode_snapshot(blob: &str) -> Result<Vec<MemoryRecord>, Error> {
    let records: Vec<MemoryRecord> = serde_json::from_str(blob)?;
    for record in &records {
        validate_embedding(&record.embedding)?;
    }
    if let Some(first) = records.first() {
        let expected = first.embedding.len();
        if let Some(bad) = records.iter().find(|r| r.embedding.len() != expected) {
            return Err(Error::DimensionMismatch {
                expected,
                actual: bad.embedding.len(),
            });
        }
    }
    Ok(records)
}

fn load_snapshot(slot: &dyn KeyValueStore) -> Vec<MemoryRecord> {
    match slot.get(STORAGE_KEY) {
        Ok(Some(blob)) => match decode_snapshot(&blob) {
            Ok(records) => {
                debug!(records = records.len(), "Loaded memory bank");
                records
            }
            Err(e) => {
                error!(error = %e, "Failed to decode memory bank, starting empty");
                Vec::new()
            }
        },
        Ok(None) => {
            debug!("No memory bank snapshot, starting empty");
            Vec::new()
        }
        Err(e) => {
            error!(error = %e, "Failed to load memory bank, starting empty");
            Vec::new()
        }
    }
}
