//! Inference pipelines: the per-task handles the model manager caches.
//!
//! A [`PipelineFactory`] turns an engine label and a model id into a ready
//! [`Pipeline`]. The default factory, [`OnnxPipelineFactory`], fetches weights
//! from the HuggingFace Hub and runs them with ONNX Runtime; tests swap in
//! lightweight factories.

mod feature;
mod generation;
mod onnx;
mod sentiment;

use std::sync::Arc;

use serde::Serialize;

use crate::errors::Error;
use crate::task::ModelTask;

pub use feature::FeatureExtractionPipeline;
pub use generation::Text2TextPipeline;
pub use onnx::OnnxPipelineFactory;
pub use sentiment::SentimentPipeline;

/// Maximum tokens produced by the generation task.
pub const MAX_NEW_TOKENS: usize = 128;
/// Temperature passed with generation options. Greedy decoding ignores it.
pub const GENERATION_TEMPERATURE: f32 = 0.1;
/// Repetition penalty for the generation task.
pub const REPETITION_PENALTY: f32 = 1.2;

/// How token-level hidden states are reduced to one vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pooling {
    #[default]
    None,
    Mean,
}

/// Decoding parameters for text-to-text generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub max_new_tokens: usize,
    pub temperature: f32,
    pub repetition_penalty: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_new_tokens: 20,
            temperature: 1.0,
            repetition_penalty: 1.0,
        }
    }
}

/// Post-processing for feature extraction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureOptions {
    pub pooling: Pooling,
    pub normalize: bool,
}

/// Task-specific options passed alongside the input text.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RunOptions {
    #[default]
    None,
    Generation(GenerationOptions),
    FeatureExtraction(FeatureOptions),
}

impl RunOptions {
    /// Fixed options the model manager uses for each task.
    pub fn for_task(task: ModelTask) -> Self {
        match task {
            ModelTask::SentimentAnalysis => RunOptions::None,
            ModelTask::Generation => RunOptions::Generation(GenerationOptions {
                max_new_tokens: MAX_NEW_TOKENS,
                temperature: GENERATION_TEMPERATURE,
                repetition_penalty: REPETITION_PENALTY,
            }),
            ModelTask::FeatureExtraction => RunOptions::FeatureExtraction(FeatureOptions {
                pooling: Pooling::Mean,
                normalize: true,
            }),
        }
    }
}

/// Classification result for sentiment analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentLabel {
    pub label: String,
    pub score: f32,
}

/// One generated sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedText {
    pub generated_text: String,
}

/// Dense tensor with a flat row-major data buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureTensor {
    pub dims: Vec<usize>,
    pub data: Vec<f32>,
}

/// Raw result of running a pipeline, shaped by its task.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PipelineOutput {
    Sentiment(Vec<SentimentLabel>),
    Generated(Vec<GeneratedText>),
    Features(FeatureTensor),
}

/// Progress event emitted while a pipeline is being initialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LoadProgress {
    /// A model file is about to be fetched (from cache or network).
    Initiate { model: String, file: String },
    /// A model file is available locally.
    Done { model: String, file: String },
    /// The pipeline is built and usable.
    Ready { task: String, model: String },
}

/// A loaded, invocable inference handle.
pub trait Pipeline: Send + Sync {
    /// HuggingFace model id backing this pipeline.
    fn model_id(&self) -> &str;

    /// Run `text` through the model.
    fn run(&self, text: &str, options: &RunOptions) -> Result<PipelineOutput, Error>;
}

/// Builds pipelines for an engine label and model id.
pub trait PipelineFactory: Send + Sync {
    fn create(
        &self,
        label: &str,
        model_id: &str,
        on_progress: Option<&dyn Fn(&LoadProgress)>,
    ) -> Result<Arc<dyn Pipeline>, Error>;
}
