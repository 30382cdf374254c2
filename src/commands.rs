//! Command handlers for orbit CLI.

use crate::output::*;
use orbit::{Error, LoadProgress, ModelTask, Orbit, Persistence, DEFAULT_TOP_K};
use std::process::ExitCode;

/// Commands supported by orbit CLI.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Download (if needed) and initialize the pipeline for a task
    Load {
        /// sentiment-analysis, generation or feature-extraction
        task: String,
    },
    /// Run text through a task's pipeline, loading it first
    Run {
        /// sentiment-analysis, generation or feature-extraction
        task: String,
        /// Input text
        text: String,
    },
    /// Answer a question from stored memories
    Ask {
        /// Question text
        question: String,
    },
    /// Store a fact in memory
    Add {
        /// Fact text
        text: String,
    },
    /// Search memories by meaning
    Search {
        /// Search query text
        query: String,

        /// Maximum number of results (default: 3)
        #[arg(short = 'k', long = "top-k", default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
    },
    Version,
}

/// Execute a CLI command.
pub fn execute(command: &Commands, orbit: &mut Orbit, json: bool) -> Result<ExitCode, Error> {
    match command {
        Commands::Load { task } => handle_load(orbit, task, json),
        Commands::Run { task, text } => handle_run(orbit, task, text, json),
        Commands::Ask { question } => handle_ask(orbit, question, json),
        Commands::Add { text } => handle_add(orbit, text, json),
        Commands::Search { query, top_k } => handle_search(orbit, query, *top_k, json),
        Commands::Version => handle_version(json),
    }
}

fn load(orbit: &Orbit, task: ModelTask, json: bool) -> Result<String, Error> {
    let report: &dyn Fn(&LoadProgress) = &|event| {
        if !json {
            eprintln!("{}", describe_progress(event));
        }
    };
    let pipeline = orbit.load_model(task, Some(report))?;
    Ok(pipeline.model_id().to_string())
}

fn handle_load(orbit: &Orbit, task: &str, json: bool) -> Result<ExitCode, Error> {
    let task: ModelTask = task.parse()?;
    let model = load(orbit, task, json)?;
    if json {
        print_json(&LoadResponse {
            status: "loaded".to_string(),
            task: task.to_string(),
            model,
        });
    } else {
        println!("Loaded {task} ({model})");
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_run(orbit: &Orbit, task: &str, text: &str, json: bool) -> Result<ExitCode, Error> {
    let task: ModelTask = task.parse()?;
    load(orbit, task, json)?;
    let output = orbit.run(task, text)?;
    if json {
        print_json(&RunResponse {
            task: task.to_string(),
            output,
        });
    } else {
        println!("{}", describe_output(&output));
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_ask(orbit: &Orbit, question: &str, json: bool) -> Result<ExitCode, Error> {
    let answer = orbit.ask(question)?;
    if json {
        print_json(&AskResponse {
            question: question.to_string(),
            answer,
        });
    } else {
        println!("{answer}");
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_add(orbit: &mut Orbit, text: &str, json: bool) -> Result<ExitCode, Error> {
    let result = orbit.add(text)?;
    let warning = match &result.persistence {
        Persistence::Flushed => None,
        Persistence::Failed { reason } => Some(reason.clone()),
    };
    if json {
        print_json(&AddResponse {
            status: "added".to_string(),
            persisted: warning.is_none(),
            id: result.id,
            warning,
        });
    } else {
        println!("Added memory: {}", result.id);
        if let Some(reason) = warning {
            eprintln!("Warning: memory not saved to disk: {reason}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_search(orbit: &Orbit, query: &str, top_k: usize, json: bool) -> Result<ExitCode, Error> {
    let hits = orbit.search(query, top_k)?;
    if json {
        let results: Vec<SearchResultItem> = hits
            .into_iter()
            .map(|hit| SearchResultItem {
                id: hit.id,
                text: hit.text,
                score: hit.score,
            })
            .collect();
        print_json(&SearchResponse { results });
    } else {
        for hit in hits {
            println!("{} [score: {:.2}]\n  {}\n", hit.id, hit.score, hit.text);
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub fn handle_version(json: bool) -> Result<ExitCode, Error> {
    if json {
        print_json(&VersionResponse {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        });
    } else {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    }
    Ok(ExitCode::SUCCESS)
}
