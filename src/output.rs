//! JSON response types and formatting for CLI output.

use orbit::{LoadProgress, PipelineOutput};
use serde::Serialize;

/// Response for a loaded pipeline.
#[derive(Serialize)]
pub struct LoadResponse {
    pub status: String,
    pub task: String,
    pub model: String,
}

/// Response for a raw pipeline run.
#[derive(Serialize)]
pub struct RunResponse {
    pub task: String,
    pub output: PipelineOutput,
}

/// Response for a question answered from memory.
#[derive(Serialize)]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
}

/// Response for memory addition.
#[derive(Serialize)]
pub struct AddResponse {
    pub status: String,
    pub id: String,
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Response for search results.
#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
}

/// Individual search result item.
#[derive(Serialize)]
pub struct SearchResultItem {
    pub id: String,
    pub text: String,
    pub score: f64,
}

/// Response for the version command.
#[derive(Serialize)]
pub struct VersionResponse {
    pub name: String,
    pub version: String,
}

/// Response for errors.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Print a value as formatted JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to serialize JSON: {e}");
            std::process::exit(1);
        }
    }
}

/// One-line description of a load progress event.
pub fn describe_progress(event: &LoadProgress) -> String {
    match event {
        LoadProgress::Initiate { model, file } => format!("Fetching {model}/{file}"),
        LoadProgress::Done { model, file } => format!("Fetched {model}/{file}"),
        LoadProgress::Ready { task, model } => format!("Ready: {task} ({model})"),
    }
}

/// Human-readable rendering of a pipeline result.
pub fn describe_output(output: &PipelineOutput) -> String {
    match output {
        PipelineOutput::Sentiment(labels) => labels
            .iter()
            .map(|l| format!("{} ({:.3})", l.label, l.score))
            .collect::<Vec<_>>()
            .join("\n"),
        PipelineOutput::Generated(texts) => texts
            .iter()
            .map(|t| t.generated_text.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
        PipelineOutput::Features(tensor) => {
            let preview: Vec<String> = tensor
                .data
                .iter()
                .take(8)
                .map(|v| format!("{v:.4}"))
                .collect();
            let more = if tensor.data.len() > 8 { ", ..." } else { "" };
            format!("dims {:?}: [{}{more}]", tensor.dims, preview.join(", "))
        }
    }
}
