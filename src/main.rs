//! depconf - dependency confusion finder.
//!
//! CLI entry point.

use clap::Parser;
use depconf::notify::ConsoleOutput;
use depconf::{Config, Result, ScanResult, Scanner};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit code for any fatal error.
const EXIT_FATAL: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Set up logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config.verbose {
            EnvFilter::new("depconf=debug")
        } else {
            EnvFilter::new("depconf=error")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let console = ConsoleOutput::new(config.verbose, config.json);

    match run(&config, &console).await {
        Ok(result) => {
            console.print_result(&result);
            ExitCode::SUCCESS
        }
        Err(e) => {
            debug!("Analysis failed: {:?}", e);
            console.print_error(&e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

async fn run(config: &Config, console: &ConsoleOutput) -> Result<ScanResult> {
    let analysis = config.analysis_config()?;
    let scanner = Scanner::new(&analysis)?.with_console(console.clone());
    scanner.analyze(&config.repository, &config.script).await
}
