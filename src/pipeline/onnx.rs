//! ONNX Runtime pipeline factory backed by the HuggingFace Hub.
//!
//! Model files are cached locally in the HF Hub cache and only downloaded once.
//! All I/O is blocking (`hf_hub::api::sync` with the ureq backend).

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use hf_hub::api::sync::{Api, ApiBuilder, ApiRepo};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use serde::de::DeserializeOwned;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use crate::errors::Error;

use super::{
    FeatureExtractionPipeline, LoadProgress, Pipeline, PipelineFactory, SentimentPipeline,
    Text2TextPipeline,
};

/// Maximum tokens fed to any model; longer inputs are truncated.
const MAX_SEQUENCE_LENGTH: usize = 512;

/// Creates ONNX pipelines, downloading model files on first use.
#[derive(Debug, Clone, Default)]
pub struct OnnxPipelineFactory {
    cache_dir: Option<PathBuf>,
}

impl OnnxPipelineFactory {
    /// Factory using the default HF Hub cache location.
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory storing model files under `cache_dir`.
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: Some(cache_dir.into()),
        }
    }

    fn api(&self) -> Result<Api, Error> {
        let mut builder = ApiBuilder::new().with_progress(false);
        if let Some(dir) = &self.cache_dir {
            builder = builder.with_cache_dir(dir.clone());
        }
        Ok(builder.build()?)
    }
}

impl PipelineFactory for OnnxPipelineFactory {
    fn create(
        &self,
        label: &str,
        model_id: &str,
        on_progress: Option<&dyn Fn(&LoadProgress)>,
    ) -> Result<Arc<dyn Pipeline>, Error> {
        if !matches!(
            label,
            "feature-extraction" | "sentiment-analysis" | "text2text-generation"
        ) {
            return Err(Error::UnsupportedTask(label.to_string()));
        }

        info!(label, model_id, "Initializing ONNX pipeline");
        let files = ModelFiles {
            repo: self.api()?.model(model_id.to_string()),
            model_id,
            on_progress,
        };

        let pipeline: Arc<dyn Pipeline> = match label {
            "feature-extraction" => Arc::new(FeatureExtractionPipeline::load(&files)?),
            "sentiment-analysis" => Arc::new(SentimentPipeline::load(&files)?),
            _ => Arc::new(Text2TextPipeline::load(&files)?),
        };

        files.report(LoadProgress::Ready {
            task: label.to_string(),
            model: model_id.to_string(),
        });
        info!(label, model_id, "Pipeline ready");
        Ok(pipeline)
    }
}

/// Resolves files of one model repository, reporting each fetch.
pub(crate) struct ModelFiles<'a> {
    repo: ApiRepo,
    model_id: &'a str,
    on_progress: Option<&'a dyn Fn(&LoadProgress)>,
}

impl ModelFiles<'_> {
    pub(crate) fn model_id(&self) -> &str {
        self.model_id
    }

    fn report(&self, event: LoadProgress) {
        if let Some(callback) = self.on_progress {
            callback(&event);
        }
    }

    /// Fetch a file from cache or the hub.
    pub(crate) fn get(&self, filename: &str) -> Result<PathBuf, Error> {
        self.report(LoadProgress::Initiate {
            model: self.model_id.to_string(),
            file: filename.to_string(),
        });
        let path = self.repo.get(filename)?;
        debug!(model = self.model_id, file = filename, path = %path.display(), "Model file available");
        self.report(LoadProgress::Done {
            model: self.model_id.to_string(),
            file: filename.to_string(),
        });
        Ok(path)
    }

    /// Fetch the first candidate that exists in the repository.
    fn get_first(&self, candidates: &[&str]) -> Result<PathBuf, Error> {
        let mut last_err = None;
        for candidate in candidates {
            match self.get(candidate) {
                Ok(path) => return Ok(path),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            Error::Inference(format!("No model file candidates for {}", self.model_id))
        }))
    }

    /// Load an ONNX session from the first available candidate file.
    pub(crate) fn session(&self, candidates: &[&str]) -> Result<Session, Error> {
        let model_path = self.get_first(candidates)?;
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level1)
            .map_err(ort::Error::from)?
            .commit_from_file(&model_path)?;
        Ok(session)
    }

    /// Load `tokenizer.json` with truncation and no padding.
    pub(crate) fn tokenizer(&self) -> Result<Tokenizer, Error> {
        let tokenizer_path = self.get("tokenizer.json")?;
        let mut tokenizer = Tokenizer::from_file(tokenizer_path)?;
        tokenizer
            .with_padding(None)
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))?;
        Ok(tokenizer)
    }

    /// Parse `config.json` into `T`.
    pub(crate) fn config<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let path = self.get("config.json")?;
        read_json(&path)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Token ids and attention mask for a single sequence.
pub(crate) struct Encoded {
    pub ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
}

impl Encoded {
    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }
}

pub(crate) fn encode(tokenizer: &Tokenizer, text: &str) -> Result<Encoded, Error> {
    let encoding = tokenizer.encode(text, true)?;
    let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
    if ids.is_empty() {
        return Err(Error::Inference(
            "Tokenizer produced no tokens for input".to_string(),
        ));
    }
    let attention_mask = encoding
        .get_attention_mask()
        .iter()
        .map(|&m| m as i64)
        .collect();
    Ok(Encoded {
        ids,
        attention_mask,
    })
}

/// Whether the session declares an input named `name`.
pub(crate) fn has_input(session: &Session, name: &str) -> bool {
    session.inputs().iter().any(|input| input.name() == name)
}

pub(crate) fn lock_session(session: &Mutex<Session>) -> Result<MutexGuard<'_, Session>, Error> {
    session
        .lock()
        .map_err(|_| Error::Inference("ONNX session lock poisoned".to_string()))
}

/// Validate a `[batch, seq, hidden]` output and return `hidden`.
pub(crate) fn hidden_dim(shape: &[i64], seq_len: usize) -> Result<usize, Error> {
    if shape.len() != 3 {
        return Err(Error::Inference(format!(
            "Expected 3D output (batch, seq_len, hidden), got {:?}",
            shape
        )));
    }
    if shape[0] != 1 || shape[1] as usize != seq_len {
        return Err(Error::Inference(format!(
            "Unexpected output shape: {:?}, batch=1 and seq_len={} expected",
            shape, seq_len
        )));
    }
    Ok(shape[2] as usize)
}

pub(crate) fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|&x| x * x).sum::<f32>().sqrt();
    let norm = norm.max(1e-9);

    vec.iter().map(|&x| x / norm).collect()
}

pub(crate) fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|&x| x / sum).collect()
}

/// Index of the largest value; the first one wins on ties.
pub(crate) fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (idx, &value)| match best {
            Some((_, top)) if value.total_cmp(&top).is_le() => best,
            _ => Some((idx, value)),
        })
        .map(|(idx, _)| idx)
}
