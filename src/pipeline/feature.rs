//! Feature extraction: BERT-style encoder hidden states, optionally pooled.

use std::sync::Mutex;

use ort::inputs;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use crate::errors::Error;

use super::onnx::{self, ModelFiles};
use super::{FeatureOptions, FeatureTensor, Pipeline, PipelineOutput, Pooling, RunOptions};

/// Sentence encoder producing token or pooled embeddings.
pub struct FeatureExtractionPipeline {
    model_id: String,
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    requires_token_type_ids: bool,
}

impl FeatureExtractionPipeline {
    pub(crate) fn load(files: &ModelFiles<'_>) -> Result<Self, Error> {
        let tokenizer = files.tokenizer()?;
        let session = files.session(&["onnx/model.onnx", "model.onnx"])?;

        // Check if model requires token_type_ids input
        let requires_token_type_ids = onnx::has_input(&session, "token_type_ids");

        Ok(FeatureExtractionPipeline {
            model_id: files.model_id().to_string(),
            session: Mutex::new(session),
            tokenizer,
            requires_token_type_ids,
        })
    }
}

impl Pipeline for FeatureExtractionPipeline {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Texts exceeding 512 tokens are silently truncated via tokenizer truncation.
    fn run(&self, text: &str, options: &RunOptions) -> Result<PipelineOutput, Error> {
        let options = match options {
            RunOptions::FeatureExtraction(opts) => opts.clone(),
            _ => FeatureOptions::default(),
        };

        let encoded = onnx::encode(&self.tokenizer, text)?;
        let seq_len = encoded.len();

        let input_ids_tensor = Tensor::from_array(([1usize, seq_len], encoded.ids.clone()))?;
        let attention_mask_tensor =
            Tensor::from_array(([1usize, seq_len], encoded.attention_mask.clone()))?;

        let mut session = onnx::lock_session(&self.session)?;
        let outputs = if self.requires_token_type_ids {
            let token_type_ids_tensor = Tensor::from_array(([1usize, seq_len], vec![0i64; seq_len]))?;
            session.run(inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor
            ])?
        } else {
            session.run(inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor
            ])?
        };

        let (shape, data) = outputs
            .get("last_hidden_state")
            .or_else(|| outputs.get("token_embeddings"))
            .ok_or_else(|| {
                Error::Inference(
                    "Output tensor 'last_hidden_state' or 'token_embeddings' not found".to_string(),
                )
            })?
            .try_extract_tensor::<f32>()?;

        let hidden = onnx::hidden_dim(shape, seq_len)?;

        let tensor = match options.pooling {
            Pooling::Mean => {
                let pooled = mean_pool(data, &encoded.attention_mask, hidden);
                let data = if options.normalize {
                    onnx::l2_normalize(&pooled)
                } else {
                    pooled
                };
                FeatureTensor {
                    dims: vec![1, hidden],
                    data,
                }
            }
            Pooling::None => {
                let data = if options.normalize {
                    data.chunks(hidden).flat_map(onnx::l2_normalize).collect()
                } else {
                    data.to_vec()
                };
                FeatureTensor {
                    dims: vec![1, seq_len, hidden],
                    data,
                }
            }
        };

        Ok(PipelineOutput::Features(tensor))
    }
}

/// Average token vectors, counting only positions the attention mask keeps.
fn mean_pool(hidden_states: &[f32], attention_mask: &[i64], hidden: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden];

    for (token_idx, chunk) in hidden_states.chunks(hidden).enumerate() {
        let mask_value = attention_mask.get(token_idx).copied().unwrap_or(0) as f32;

        for (dim, pooled_value) in pooled.iter_mut().enumerate() {
            *pooled_value += chunk[dim] * mask_value;
        }
    }

    let mask_sum: f32 = attention_mask
        .iter()
        .map(|&m| m as f32)
        .sum::<f32>()
        .max(1e-9);

    for value in pooled.iter_mut() {
        *value /= mask_sum;
    }

    pooled
}
