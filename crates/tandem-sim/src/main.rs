//! tandem-sim binary
//!
//! Usage:
//!   tandem-sim <scenario.json>
//!
//! Prints one JSON line per placed block. Set `RUST_LOG=tandem=debug` to
//! see each colocation decision.

use std::env;
use std::process::ExitCode;

use tandem_sim::{Scenario, Simulation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tandem=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("tandem-sim - replay block writes through colocating placement");
        eprintln!();
        eprintln!("Usage:");
        eprintln!("  tandem-sim <scenario.json>");
        eprintln!();
        eprintln!("Environment (used when the scenario has no \"config\"):");
        eprintln!("  TANDEM_MANAGED_SEGMENT       group marker segment (default: managed)");
        eprintln!("  TANDEM_METADATA_ENDPOINT     metadata endpoint (default: memory://)");
        eprintln!("  TANDEM_CONSIDER_LOAD         skip overloaded nodes (default: true)");
        eprintln!("  TANDEM_MIN_BLOCKS_FOR_WRITE  free blocks a target needs (default: 5)");
        return ExitCode::from(2);
    };

    match run(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let scenario = Scenario::from_json(&text)?;
    let sim = Simulation::new(&scenario)?;

    for spec in &scenario.writes {
        let placement = sim.write(spec)?;
        println!("{}", serde_json::to_string(&placement)?);
    }
    tracing::info!(writes = scenario.writes.len(), "scenario complete");
    Ok(())
}
