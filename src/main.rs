mod commands;
mod output;

use clap::Parser;
use commands::Commands;
use orbit::{Config, Error, Orbit};
use output::{print_json, ErrorResponse};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// orbit - local inference and semantic memory
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            if cli.json {
                print_json(&ErrorResponse {
                    error: e.to_string(),
                });
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode, Error> {
    if matches!(cli.command, Commands::Version) {
        return commands::handle_version(cli.json);
    }

    let config = Config::load()?;
    let mut orbit = Orbit::open(&config)?;
    commands::execute(&cli.command, &mut orbit, cli.json)
}

/// Log to stderr; `RUST_LOG` applies unless `--verbose` forces debug.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .ok();
}
