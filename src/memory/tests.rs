//! Tests for the memory store.

use std::sync::Arc;

use super::store::{decode_snapshot, STORAGE_KEY};
use super::*;
use crate::errors::Error;
use crate::manager::ModelManager;
use crate::memory_types::{MemoryRecord, Persistence, SearchHit};
use crate::pipeline::{
    FeatureTensor, LoadProgress, Pipeline, PipelineFactory, PipelineOutput, RunOptions,
};
use crate::storage::{InMemorySlot, KeyValueStore};
use crate::task::ModelTask;

const VOCAB: [&str; 10] = [
    "paris", "capital", "france", "eiffel", "tower", "what", "is", "the", "of", "in",
];

/// Bag-of-words embedding over a fixed vocabulary plus one catch-all bucket.
struct VocabEmbedder;

impl Pipeline for VocabEmbedder {
    fn model_id(&self) -> &str {
        "test/vocab"
    }

    fn run(&self, text: &str, _options: &RunOptions) -> Result<PipelineOutput, Error> {
        let mut data = vec![0.0f32; VOCAB.len() + 1];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            let bucket = VOCAB
                .iter()
                .position(|v| *v == word)
                .unwrap_or(VOCAB.len());
            data[bucket] += 1.0;
        }
        Ok(PipelineOutput::Features(FeatureTensor {
            dims: vec![1, data.len()],
            data,
        }))
    }
}

struct VocabFactory;

impl PipelineFactory for VocabFactory {
    fn create(
        &self,
        label: &str,
        _model_id: &str,
        _on_progress: Option<&dyn Fn(&LoadProgress)>,
    ) -> Result<Arc<dyn Pipeline>, Error> {
        match label {
            "feature-extraction" => Ok(Arc::new(VocabEmbedder)),
            other => Err(Error::UnsupportedTask(other.to_string())),
        }
    }
}

fn manager() -> Arc<ModelManager> {
    Arc::new(ModelManager::new(VocabFactory))
}

fn test_store(slot: InMemorySlot) -> MemoryStore {
    MemoryStore::open(manager(), slot)
}

fn record(id: &str, embedding: Vec<f32>) -> MemoryRecord {
    MemoryRecord {
        id: id.to_string(),
        text: format!("text {id}"),
        embedding,
    }
}

#[test]
fn test_add_then_search_returns_own_record_first() {
    let mut store = test_store(InMemorySlot::new());
    store.add("The Eiffel Tower is in Paris.").unwrap();
    let added = store.add("Paris is the capital of France.").unwrap();
    store.add("What of it?").unwrap();

    let hits = store.search("Paris is the capital of France.", 3).unwrap();
    assert_eq!(hits[0].id, added.id);
    assert!((hits[0].score - 1.0).abs() < 1e-9);
    assert!(hits.iter().all(|hit| hit.score <= hits[0].score));
}

#[test]
fn test_search_empty_bank_skips_inference() {
    let models = manager();
    let store = MemoryStore::open(models.clone(), InMemorySlot::new());

    assert!(store.search("anything", 3).unwrap().is_empty());
    assert!(store.search("anything", 100).unwrap().is_empty());
    assert!(!models.is_loaded(ModelTask::FeatureExtraction));
}

#[test]
fn test_search_respects_top_k_and_order() {
    let mut store = test_store(InMemorySlot::new());
    for text in [
        "Paris is the capital of France.",
        "The Eiffel Tower is in Paris.",
        "capital of France",
        "tower",
        "what is in the tower",
    ] {
        store.add(text).unwrap();
    }

    let hits = store.search("capital of France", 2).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].text, "capital of France");
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    assert!(store.search("capital of France", 0).unwrap().is_empty());
}

#[test]
fn test_search_top_k_larger_than_bank_returns_all() {
    let mut store = test_store(InMemorySlot::new());
    store.add("Paris").unwrap();
    store.add("tower").unwrap();

    let hits = store.search("Paris tower", 10).unwrap();
    assert_eq!(hits.len(), 2);
}

#[test]
fn test_equal_scores_keep_insertion_order() {
    let mut store = test_store(InMemorySlot::new());
    let first = store.add("eiffel tower").unwrap();
    let second = store.add("tower eiffel").unwrap();

    let hits = store.search("eiffel", 2).unwrap();
    assert_eq!(hits[0].score, hits[1].score);
    assert_eq!(hits[0].id, first.id);
    assert_eq!(hits[1].id, second.id);
}

#[test]
fn test_rank_is_stable() {
    let mut hits = vec![
        SearchHit {
            id: "a".to_string(),
            text: "a".to_string(),
            score: 0.5,
        },
        SearchHit {
            id: "b".to_string(),
            text: "b".to_string(),
            score: 0.9,
        },
        SearchHit {
            id: "c".to_string(),
            text: "c".to_string(),
            score: 0.5,
        },
    ];
    super::search::rank(&mut hits);
    let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a", "c"]);
}

#[test]
fn test_add_rejects_zero_embedding() {
    let slot = InMemorySlot::new();
    let mut store = test_store(slot.clone());
    store.add("Paris is the capital of France.").unwrap();

    // No words at all, so the bag-of-words vector is all zeros.
    assert!(matches!(store.add("!!!"), Err(Error::DegenerateVector)));
    assert_eq!(store.len(), 1);

    let records = decode_snapshot(&slot.get(STORAGE_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(records.len(), 1);

    let hits = store.search("Paris", 3).unwrap();
    assert_eq!(hits.len(), 1);
}

#[test]
fn test_add_accepts_long_input() {
    let mut store = test_store(InMemorySlot::new());
    let text = "paris ".repeat(20_000);
    let result = store.add(&text).unwrap();
    assert_eq!(store.get(&result.id).unwrap().text, text);
}

#[test]
fn test_search_embeds_query_untrimmed_like_add() {
    let mut store = test_store(InMemorySlot::new());
    store.add("Paris is the capital of France.").unwrap();
    let own = store.add("  the Eiffel tower \n").unwrap();
    store.add("tower").unwrap();

    let hits = store.search("  the Eiffel tower \n", 3).unwrap();
    assert_eq!(hits[0].id, own.id);
    assert!((hits[0].score - 1.0).abs() < 1e-9);
}

#[test]
fn test_search_empty_bank_accepts_any_query() {
    let store = test_store(InMemorySlot::new());
    assert!(store.search("", 3).unwrap().is_empty());
    assert!(store.search("   ", 3).unwrap().is_empty());
}

#[test]
fn test_decode_snapshot_rejects_zero_embedding() {
    let blob = serde_json::to_string(&vec![
        record("a", vec![1.0, 0.0, 0.0]),
        record("b", vec![0.0, 0.0, 0.0]),
    ])
    .unwrap();
    assert!(matches!(
        decode_snapshot(&blob),
        Err(Error::DegenerateVector)
    ));
}

#[test]
fn test_snapshot_with_zero_embedding_starts_empty() {
    let slot = InMemorySlot::new();
    let blob = serde_json::to_string(&vec![
        record("a", vec![1.0; 11]),
        record("b", vec![0.0; 11]),
    ])
    .unwrap();
    slot.set(STORAGE_KEY, &blob).unwrap();

    let store = test_store(slot);
    assert!(store.is_empty());
    assert!(store.search("Paris", 3).unwrap().is_empty());
}

#[test]
fn test_ids_are_unique() {
    let mut store = test_store(InMemorySlot::new());
    let mut ids: Vec<String> = (0..50)
        .map(|_| store.add("Paris").unwrap().id)
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 50);
}

#[test]
fn test_add_flushes_snapshot() {
    let slot = InMemorySlot::new();
    let mut store = test_store(slot.clone());

    let result = store.add("Paris is the capital of France.").unwrap();
    assert!(result.is_persisted());

    let blob = slot.get(STORAGE_KEY).unwrap().unwrap();
    let records = decode_snapshot(&blob).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, result.id);
}

#[test]
fn test_persistence_failure_is_reported_not_raised() {
    let slot = InMemorySlot::with_quota(16);
    let mut store = test_store(slot.clone());

    let result = store.add("Paris is the capital of France.").unwrap();
    assert!(matches!(
        result.persistence,
        Persistence::Failed { ref reason } if reason.contains("quota")
    ));
    assert_eq!(store.len(), 1);
    assert!(store.get(&result.id).is_some());
    assert_eq!(slot.get(STORAGE_KEY).unwrap(), None);
}

#[test]
fn test_reopen_restores_records() {
    let slot = InMemorySlot::new();
    let originals = {
        let mut store = test_store(slot.clone());
        store.add("Paris is the capital of France.").unwrap();
        store.add("The Eiffel Tower is in Paris.").unwrap();
        store.add("tower").unwrap();
        store.records().to_vec()
    };

    let reopened = test_store(slot);
    assert_eq!(reopened.records(), originals.as_slice());
}

#[test]
fn test_corrupt_snapshot_starts_empty() {
    let slot = InMemorySlot::new();
    slot.set(STORAGE_KEY, "{not json").unwrap();

    let mut store = test_store(slot.clone());
    assert!(store.is_empty());

    store.add("Paris").unwrap();
    let records = decode_snapshot(&slot.get(STORAGE_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(records.len(), 1);
}

#[test]
fn test_decode_snapshot_rejects_mixed_dimensions() {
    let blob = serde_json::to_string(&vec![
        record("a", vec![1.0, 0.0]),
        record("b", vec![1.0, 0.0, 0.0]),
    ])
    .unwrap();
    assert!(matches!(
        decode_snapshot(&blob),
        Err(Error::DimensionMismatch {
            expected: 2,
            actual: 3
        })
    ));
}

#[test]
fn test_mismatched_embedding_dimension_is_rejected() {
    let slot = InMemorySlot::new();
    let blob = serde_json::to_string(&vec![record("old", vec![1.0, 0.0, 0.0])]).unwrap();
    slot.set(STORAGE_KEY, &blob).unwrap();

    let mut store = test_store(slot.clone());
    assert_eq!(store.dimension(), Some(3));

    let result = store.add("Paris");
    assert!(matches!(
        result,
        Err(Error::DimensionMismatch {
            expected: 3,
            actual: 11
        })
    ));
    assert_eq!(store.len(), 1);
    assert_eq!(slot.get(STORAGE_KEY).unwrap().as_deref(), Some(blob.as_str()));

    assert!(matches!(
        store.search("Paris", 3),
        Err(Error::DimensionMismatch { .. })
    ));
}
