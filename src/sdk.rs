//! Process-wide SDK context tying the model manager to the memory store.

use std::path::{Component, Path};
use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::errors::Error;
use crate::manager::ModelManager;
use crate::memory::MemoryStore;
use crate::memory_types::{AddResult, SearchHit};
use crate::pipeline::{LoadProgress, OnnxPipelineFactory, Pipeline, PipelineOutput};
use crate::storage::{KeyValueStore, SqliteSlot};
use crate::task::ModelTask;

/// One model manager and the memory bank that embeds through it.
///
/// Dropping an `Orbit` releases the loaded pipelines and closes the
/// storage slot.
pub struct Orbit {
    models: Arc<ModelManager>,
    memory: MemoryStore,
}

impl Orbit {
    /// Open the SDK with ONNX pipelines and a SQLite-backed memory bank.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Database path contains path traversal sequences (e.g., "../")
    /// - Directories cannot be created
    /// - Database cannot be opened
    pub fn open(config: &Config) -> Result<Self, Error> {
        check_database_path(&config.database_path)?;
        config.ensure_directories()?;

        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::canonicalize(parent).map_err(|e| {
                    Error::Config(format!(
                        "Invalid database path: parent directory not accessible: {e}"
                    ))
                })?;
            }
        }

        let slot = SqliteSlot::open(&config.database_path, config.storage_quota())?;
        let models = Arc::new(ModelManager::new(OnnxPipelineFactory::with_cache_dir(
            &config.model_cache,
        )));

        info!(
            database = %config.database_path.display(),
            model_cache = %config.model_cache.display(),
            "Opened orbit"
        );

        Ok(Self::with_parts(models, slot))
    }

    /// Assemble the SDK from an existing manager and storage slot.
    pub fn with_parts(models: Arc<ModelManager>, slot: impl KeyValueStore + 'static) -> Self {
        let memory = MemoryStore::open(models.clone(), slot);
        Orbit { models, memory }
    }

    pub fn models(&self) -> &Arc<ModelManager> {
        &self.models
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut MemoryStore {
        &mut self.memory
    }

    /// See [`ModelManager::load_model`].
    pub fn load_model(
        &self,
        task: ModelTask,
        on_progress: Option<&dyn Fn(&LoadProgress)>,
    ) -> Result<Arc<dyn Pipeline>, Error> {
        self.models.load_model(task, on_progress)
    }

    /// See [`ModelManager::run`].
    pub fn run(&self, task: ModelTask, text: &str) -> Result<PipelineOutput, Error> {
        self.models.run(task, text)
    }

    /// Answer `question` from this instance's memory bank.
    pub fn ask(&self, question: &str) -> Result<String, Error> {
        self.models.ask(&self.memory, question)
    }

    /// See [`MemoryStore::add`].
    pub fn add(&mut self, text: &str) -> Result<AddResult, Error> {
        self.memory.add(text)
    }

    /// See [`MemoryStore::search`].
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, Error> {
        self.memory.search(query, top_k)
    }
}

/// Reject parent directory components (works on all platforms).
fn check_database_path(path: &Path) -> Result<(), Error> {
    if path
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        return Err(Error::Config(
            "Invalid database path: contains '..' which may escape the intended directory"
                .to_string(),
        ));
    }
    Ok(())
}
