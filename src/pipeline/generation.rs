//! Text-to-text generation with a T5-style encoder/decoder pair.
//!
//! Decoding is greedy: each step takes the argmax of the repetition-penalized
//! logits. The decoder is re-run on the full prefix each step (no key/value
//! cache).

use std::collections::HashSet;
use std::sync::Mutex;

use ort::inputs;
use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::debug;

use crate::errors::Error;

use super::onnx::{self, Encoded, ModelFiles};
use super::{GeneratedText, GenerationOptions, Pipeline, PipelineOutput, RunOptions};

#[derive(Debug, Deserialize)]
struct Seq2SeqConfig {
    #[serde(default)]
    decoder_start_token_id: Option<i64>,
    #[serde(default)]
    pad_token_id: i64,
    #[serde(default = "default_eos_token_id")]
    eos_token_id: i64,
}

fn default_eos_token_id() -> i64 {
    1
}

/// Encoder/decoder generator (LaMini-Flan-T5 and friends).
pub struct Text2TextPipeline {
    model_id: String,
    encoder: Mutex<Session>,
    decoder: Mutex<Session>,
    tokenizer: Tokenizer,
    decoder_start_token_id: i64,
    eos_token_id: i64,
}

impl Text2TextPipeline {
    pub(crate) fn load(files: &ModelFiles<'_>) -> Result<Self, Error> {
        let config: Seq2SeqConfig = files.config()?;
        let tokenizer = files.tokenizer()?;
        let encoder = files.session(&["onnx/encoder_model.onnx", "encoder_model.onnx"])?;
        let decoder = files.session(&["onnx/decoder_model.onnx", "decoder_model.onnx"])?;

        Ok(Text2TextPipeline {
            model_id: files.model_id().to_string(),
            encoder: Mutex::new(encoder),
            decoder: Mutex::new(decoder),
            tokenizer,
            decoder_start_token_id: config.decoder_start_token_id.unwrap_or(config.pad_token_id),
            eos_token_id: config.eos_token_id,
        })
    }

    /// Run the encoder once; returns `(hidden, flat hidden states)`.
    fn encode_states(&self, encoded: &Encoded) -> Result<(usize, Vec<f32>), Error> {
        let seq_len = encoded.len();
        let mut encoder = onnx::lock_session(&self.encoder)?;
        let outputs = encoder.run(inputs![
            "input_ids" => Tensor::from_array(([1usize, seq_len], encoded.ids.clone()))?,
            "attention_mask" => Tensor::from_array(([1usize, seq_len], encoded.attention_mask.clone()))?
        ])?;

        let (shape, data) = outputs
            .get("last_hidden_state")
            .ok_or_else(|| {
                Error::Inference("Encoder output 'last_hidden_state' not found".to_string())
            })?
            .try_extract_tensor::<f32>()?;
        let hidden = onnx::hidden_dim(shape, seq_len)?;
        Ok((hidden, data.to_vec()))
    }

    fn decode_tokens(
        &self,
        encoded: &Encoded,
        hidden: usize,
        states: &[f32],
        options: &GenerationOptions,
    ) -> Result<Vec<i64>, Error> {
        let seq_len = encoded.len();
        let mut decoder = onnx::lock_session(&self.decoder)?;
        let mut tokens = vec![self.decoder_start_token_id];

        for _ in 0..options.max_new_tokens {
            let prefix_len = tokens.len();
            let outputs = decoder.run(inputs![
                "input_ids" => Tensor::from_array(([1usize, prefix_len], tokens.clone()))?,
                "encoder_attention_mask" => Tensor::from_array(([1usize, seq_len], encoded.attention_mask.clone()))?,
                "encoder_hidden_states" => Tensor::from_array(([1usize, seq_len, hidden], states.to_vec()))?
            ])?;

            let (shape, data) = outputs
                .get("logits")
                .ok_or_else(|| Error::Inference("Decoder output 'logits' not found".to_string()))?
                .try_extract_tensor::<f32>()?;
            let vocab = onnx::hidden_dim(shape, prefix_len)?;

            let start = (prefix_len - 1) * vocab;
            let mut logits = data[start..start + vocab].to_vec();
            let next = select_next_token(&mut logits, &tokens, options)
                .ok_or_else(|| Error::Inference("Decoder returned empty logits".to_string()))?;

            if next == self.eos_token_id {
                break;
            }
            tokens.push(next);
        }

        debug!(
            model = %self.model_id,
            new_tokens = tokens.len() - 1,
            "Generation finished"
        );
        Ok(tokens.split_off(1))
    }
}

impl Pipeline for Text2TextPipeline {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn run(&self, text: &str, options: &RunOptions) -> Result<PipelineOutput, Error> {
        let options = match options {
            RunOptions::Generation(opts) => opts.clone(),
            _ => GenerationOptions::default(),
        };

        let encoded = onnx::encode(&self.tokenizer, text)?;
        let (hidden, states) = self.encode_states(&encoded)?;
        let generated = self.decode_tokens(&encoded, hidden, &states, &options)?;

        let ids: Vec<u32> = generated.iter().map(|&id| id as u32).collect();
        let text = self.tokenizer.decode(&ids, true)?;

        Ok(PipelineOutput::Generated(vec![GeneratedText {
            generated_text: text.trim().to_string(),
        }]))
    }
}

/// Pick the next token from the last position's logits.
///
/// `options.temperature` is not consulted: dividing by a positive constant
/// never changes the argmax, so it would only matter for sampling.
fn select_next_token(logits: &mut [f32], previous: &[i64], options: &GenerationOptions) -> Option<i64> {
    apply_repetition_penalty(logits, previous, options.repetition_penalty);
    onnx::argmax(logits).map(|idx| idx as i64)
}

/// Shrink logits of tokens already emitted, once per distinct token.
fn apply_repetition_penalty(logits: &mut [f32], previous: &[i64], penalty: f32) {
    if penalty == 1.0 {
        return;
    }
    let seen: HashSet<i64> = previous.iter().copied().collect();
    for id in seen {
        if let Some(logit) = usize::try_from(id).ok().and_then(|i| logits.get_mut(i)) {
            *logit = if *logit < 0.0 {
                *logit * penalty
            } else {
                *logit / penalty
            };
        }
    }
}
