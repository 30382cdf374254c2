//! Sentiment analysis over a sequence-classification model.

use std::collections::HashMap;
use std::sync::Mutex;

use ort::inputs;
use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use tokenizers::Tokenizer;

use crate::errors::Error;

use super::onnx::{self, ModelFiles};
use super::{Pipeline, PipelineOutput, RunOptions, SentimentLabel};

#[derive(Debug, Deserialize)]
struct ClassifierConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

/// Text classifier returning the most probable label.
pub struct SentimentPipeline {
    model_id: String,
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    id2label: HashMap<String, String>,
    requires_token_type_ids: bool,
}

impl SentimentPipeline {
    pub(crate) fn load(files: &ModelFiles<'_>) -> Result<Self, Error> {
        let config: ClassifierConfig = files.config()?;
        let tokenizer = files.tokenizer()?;
        let session = files.session(&["onnx/model.onnx", "model.onnx"])?;
        let requires_token_type_ids = onnx::has_input(&session, "token_type_ids");

        Ok(SentimentPipeline {
            model_id: files.model_id().to_string(),
            session: Mutex::new(session),
            tokenizer,
            id2label: config.id2label,
            requires_token_type_ids,
        })
    }
}

impl Pipeline for SentimentPipeline {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn run(&self, text: &str, _options: &RunOptions) -> Result<PipelineOutput, Error> {
        let encoded = onnx::encode(&self.tokenizer, text)?;
        let seq_len = encoded.len();

        let input_ids_tensor = Tensor::from_array(([1usize, seq_len], encoded.ids))?;
        let attention_mask_tensor =
            Tensor::from_array(([1usize, seq_len], encoded.attention_mask))?;

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

        let (shape, logits) = outputs
            .get("logits")
            .ok_or_else(|| Error::Inference("Output tensor 'logits' not found".to_string()))?
            .try_extract_tensor::<f32>()?;

        if shape.len() != 2 || shape[0] != 1 {
            return Err(Error::Inference(format!(
                "Expected logits of shape (1, num_labels), got {:?}",
                shape
            )));
        }

        Ok(PipelineOutput::Sentiment(vec![self.top_label(logits)?]))
    }
}

impl SentimentPipeline {
    fn top_label(&self, logits: &[f32]) -> Result<SentimentLabel, Error> {
        let probs = onnx::softmax(logits);
        let best = onnx::argmax(&probs)
            .ok_or_else(|| Error::Inference("Classifier returned no logits".to_string()))?;
        Ok(SentimentLabel {
            label: label_for(&self.id2label, best),
            score: probs[best],
        })
    }
}

fn label_for(id2label: &HashMap<String, String>, index: usize) -> String {
    id2label
        .get(&index.to_string())
        .cloned()
        .unwrap_or_else(|| format!("LABEL_{index}"))
}
