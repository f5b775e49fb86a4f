//! Replays a scripted drag scenario and prints what happened.
//!
//! Run with: `dragmove-replay scenario.json`

mod scenario;

use clap::Parser;
use scenario::{ReplayError, Scenario};
use std::path::PathBuf;
use std::process::ExitCode;

/// Replay a drag/move scenario deterministically
#[derive(Parser)]
#[command(name = "dragmove-replay")]
#[command(about = "Replay scripted drag gestures over a diagram", long_about = None)]
#[command(version)]
struct Cli {
    /// Scenario file (JSON)
    #[arg(value_name = "SCENARIO")]
    scenario: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// One line per event, then final element bounds
    Text,
    /// The whole replay as JSON
    Json,
}

fn execute(cli: Cli) -> Result<(), ReplayError> {
    let scenario = Scenario::load(&cli.scenario)?;
    log::info!(
        "Replaying {} step(s) over {} element(s)",
        scenario.steps.len(),
        scenario.elements.len()
    );
    let replay = scenario::run(&scenario)?;

    match cli.format {
        OutputFormat::Text => {
            for line in &replay.lines {
                println!("{}", line);
            }
            println!();
            for element in &replay.elements {
                println!("{}", element);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&replay)
                .map_err(|err| ReplayError::Config(err.into()))?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match execute(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("Replay failed: {}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
