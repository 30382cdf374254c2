//! Model manager: lazily initialized, cached inference pipelines.
//!
//! Each task owns one slot in the cache. The first `load_model` call for a
//! task initializes it; concurrent first callers block on the same slot, so
//! a pipeline is built at most once per task. Loaded pipelines are never
//! evicted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;
use tracing::{debug, info, instrument};

use crate::errors::Error;
use crate::memory::MemoryStore;
use crate::memory_types::SearchHit;
use crate::pipeline::{LoadProgress, Pipeline, PipelineFactory, PipelineOutput, RunOptions};
use crate::task::ModelTask;

/// Number of stored facts retrieved for each question.
pub const ASK_TOP_K: usize = 3;

/// Answer returned when generation yields no usable text.
pub const FALLBACK_ANSWER: &str = "I couldn't generate an answer.";

type PipelineSlot = Arc<OnceCell<Arc<dyn Pipeline>>>;

/// Owns the pipeline cache and dispatches text through it.
pub struct ModelManager {
    factory: Box<dyn PipelineFactory>,
    pipelines: Mutex<HashMap<ModelTask, PipelineSlot>>,
}

impl ModelManager {
    pub fn new(factory: impl PipelineFactory + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            pipelines: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, task: ModelTask) -> Result<PipelineSlot, Error> {
        let mut pipelines = self
            .pipelines
            .lock()
            .map_err(|_| Error::Inference("pipeline cache lock poisoned".to_string()))?;
        Ok(pipelines.entry(task).or_default().clone())
    }

    fn loaded(&self, task: ModelTask) -> Result<Option<Arc<dyn Pipeline>>, Error> {
        Ok(self.slot(task)?.get().cloned())
    }

    /// Whether a pipeline for `task` is ready.
    pub fn is_loaded(&self, task: ModelTask) -> bool {
        matches!(self.loaded(task), Ok(Some(_)))
    }

    /// Return the cached pipeline for `task`, initializing it on first use.
    ///
    /// `on_progress` only sees events when this call performs the
    /// initialization; cache hits return immediately without reporting.
    ///
    /// # Errors
    ///
    /// Propagates any failure from the pipeline factory (model download,
    /// tokenizer or session construction). A failed load leaves the task
    /// unloaded.
    #[instrument(skip(self, on_progress))]
    pub fn load_model(
        &self,
        task: ModelTask,
        on_progress: Option<&dyn Fn(&LoadProgress)>,
    ) -> Result<Arc<dyn Pipeline>, Error> {
        let slot = self.slot(task)?;
        if let Some(pipeline) = slot.get() {
            debug!("Pipeline cache hit");
            return Ok(pipeline.clone());
        }

        slot.get_or_try_init(|| {
            let model_id = task.model_id();
            let label = task.engine_label();
            info!(model_id, label, "Loading pipeline");
            self.factory.create(label, model_id, on_progress)
        })
        .cloned()
    }

    /// Run `text` through the loaded pipeline for `task` with the task's
    /// fixed options, returning the raw output.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotInitialized` if `load_model` has not succeeded for
    /// `task`, and `Error::Inference` if the pipeline cache lock is poisoned;
    /// inference failures propagate unchanged.
    pub fn run(&self, task: ModelTask, text: &str) -> Result<PipelineOutput, Error> {
        let pipeline = self.loaded(task)?.ok_or_else(|| Error::NotInitialized {
            task: task.to_string(),
        })?;
        pipeline.run(text, &RunOptions::for_task(task))
    }

    /// Answer `question` from the facts in `memory`.
    ///
    /// Retrieves the closest facts, conditions the generation model on them,
    /// and returns its text. Output without generated text yields
    /// [`FALLBACK_ANSWER`].
    ///
    /// # Errors
    ///
    /// Retrieval, model loading and inference failures propagate.
    #[instrument(skip(self, memory, question), fields(question_len = question.len()))]
    pub fn ask(&self, memory: &MemoryStore, question: &str) -> Result<String, Error> {
        let facts = memory.search(question, ASK_TOP_K)?;
        debug!(facts = facts.len(), "Retrieved context");

        let prompt = build_prompt(question, &facts);

        self.load_model(ModelTask::Generation, None)?;
        let output = self.run(ModelTask::Generation, &prompt)?;

        Ok(extract_answer(output).unwrap_or_else(|| FALLBACK_ANSWER.to_string()))
    }
}

/// Render retrieved facts as a bullet list, in rank order.
pub(crate) fn build_context(facts: &[SearchHit]) -> String {
    facts
        .iter()
        .map(|fact| format!("- {}", fact.text))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn build_prompt(question: &str, facts: &[SearchHit]) -> String {
    format!(
        "Question: {}\nContext:\n{}\nAnswer:",
        question,
        build_context(facts)
    )
}

/// First non-empty `generated_text`, if the output carries one.
fn extract_answer(output: PipelineOutput) -> Option<String> {
    match output {
        PipelineOutput::Generated(items) => items
            .into_iter()
            .next()
            .map(|item| item.generated_text)
            .filter(|text| !text.is_empty()),
        _ => None,
    }
}
