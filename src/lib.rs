//! orbit - local inference and semantic memory for applications.
//!
//! This crate wraps three ONNX pipelines (sentiment analysis, text
//! generation, feature extraction) behind a lazily initialized model manager,
//! and layers a small memory bank on top: facts are embedded, persisted as a
//! single snapshot, searched by cosine similarity, and used as context for
//! retrieval-augmented answers.
//! All operations are synchronous (no async/await required).
//!
//! # Example
//!
//! ```no_run
//! use orbit::{Config, ModelTask, Orbit};
//!
//! let config = Config::load().expect("Failed to load config");
//! let mut orbit = Orbit::open(&config).expect("Failed to open orbit");
//!
//! // Remember some facts
//! orbit.add("Paris is the capital of France.").unwrap();
//! orbit.add("The Eiffel Tower is in Paris.").unwrap();
//!
//! // Search them
//! for hit in orbit.search("capital of France", 3).unwrap() {
//!     println!("{:.2}: {}", hit.score, hit.text);
//! }
//!
//! // Answer from memory
//! let answer = orbit.ask("What is the capital of France?").unwrap();
//! println!("{answer}");
//!
//! // Or use a pipeline directly
//! orbit.load_model(ModelTask::SentimentAnalysis, None).unwrap();
//! let output = orbit.run(ModelTask::SentimentAnalysis, "I love this").unwrap();
//! ```
//!
//! # Mutability Requirements
//!
//! `add` requires `&mut self` because it appends to the bank and rewrites
//! its snapshot. Everything else takes `&self`; the model manager can be
//! shared between threads through `Arc`.

pub mod config;
pub mod errors;
pub mod manager;
pub mod memory;
pub mod memory_types;
pub mod pipeline;
pub mod sdk;
pub mod similarity;
pub mod storage;
pub mod task;

// Re-export public API
pub use config::Config;
pub use errors::Error;
pub use manager::{ModelManager, ASK_TOP_K, FALLBACK_ANSWER};
pub use memory::MemoryStore;
pub use memory::store::{DEFAULT_TOP_K, STORAGE_KEY};
pub use memory_types::{AddResult, MemoryRecord, Persistence, SearchHit};
pub use pipeline::{
    FeatureTensor, GeneratedText, LoadProgress, OnnxPipelineFactory, Pipeline, PipelineFactory,
    PipelineOutput, RunOptions, SentimentLabel,
};
pub use sdk::Orbit;
pub use similarity::cosine_similarity;
pub use storage::{InMemorySlot, KeyValueStore, SqliteSlot};
pub use task::ModelTask;
