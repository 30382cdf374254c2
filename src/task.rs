//! The closed set of inference tasks and their model mapping.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Inference task supported by the model manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelTask {
    SentimentAnalysis,
    Generation,
    FeatureExtraction,
}

impl ModelTask {
    /// Every recognized task, in declaration order.
    pub const ALL: [ModelTask; 3] = [
        ModelTask::SentimentAnalysis,
        ModelTask::Generation,
        ModelTask::FeatureExtraction,
    ];

    /// Task identifier as accepted by `load_model` and the CLI.
    pub fn as_str(self) -> &'static str {
        match self {
            ModelTask::SentimentAnalysis => "sentiment-analysis",
            ModelTask::Generation => "generation",
            ModelTask::FeatureExtraction => "feature-extraction",
        }
    }

    /// HuggingFace model repository serving this task.
    pub fn model_id(self) -> &'static str {
        match self {
            ModelTask::SentimentAnalysis => {
                "Xenova/distilbert-base-uncased-finetuned-sst-2-english"
            }
            ModelTask::Generation => "Xenova/LaMini-Flan-T5-77M",
            ModelTask::FeatureExtraction => "Xenova/all-MiniLM-L6-v2",
        }
    }

    /// Label the inference engine expects for this task.
    pub fn engine_label(self) -> &'static str {
        match self {
            ModelTask::Generation => "text2text-generation",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for ModelTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelTask {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelTask::ALL
            .into_iter()
            .find(|task| task.as_str() == s.trim())
            .ok_or_else(|| Error::UnknownTask(s.to_string()))
    }
}
