//! Console output for analysis results.
//!
//! stdout carries only findings (or the JSON report) and the fatal error
//! line. Progress and summaries go to stderr in verbose mode.

use crate::types::ScanResult;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Display;
use tracing::error;

/// Console output handler.
#[derive(Debug, Clone, Default)]
pub struct ConsoleOutput {
    verbose: bool,
    json_mode: bool,
}

impl ConsoleOutput {
    /// Create a new console output handler.
    pub fn new(verbose: bool, json_mode: bool) -> Self {
        Self { verbose, json_mode }
    }

    /// Render the result: one `name@version` line per finding, or JSON.
    pub fn render_result(&self, result: &ScanResult) -> String {
        if self.json_mode {
            return match serde_json::to_string_pretty(result) {
                Ok(json) => format!("{}\n", json),
                Err(e) => {
                    error!("Failed to serialize result: {}", e);
                    String::new()
                }
            };
        }

        result
            .findings
            .iter()
            .map(|finding| format!("{}\n", finding))
            .collect()
    }

    /// Print the result to stdout.
    pub fn print_result(&self, result: &ScanResult) {
        print!("{}", self.render_result(result));
    }

    /// Print the single fatal error line.
    pub fn print_error(&self, err: &impl Display) {
        println!("{}", format_error(err));
    }

    /// Print scan summary (verbose only).
    pub fn print_summary(&self, result: &ScanResult) {
        if self.json_mode || !self.verbose {
            return;
        }

        eprintln!();
        eprintln!("{}", "=== Scan Summary ===".bright_cyan());
        eprintln!("  Repository: {}", result.repository);
        eprintln!("  Script:     {}", result.script.display());
        eprintln!("  Files:      {}", result.files_fetched.join(", "));
        eprintln!("  Declared:   {}", result.declared);
        eprintln!("  Referenced: {}", result.extracted);
        eprintln!("  Candidates: {}", result.candidates);
        eprintln!("  Duration:   {:.2}s", result.duration_secs);

        if !result.uncertain.is_empty() {
            eprintln!(
                "  {}",
                format!(
                    "Uncertain lookups treated as present: {}",
                    result.uncertain.join(", ")
                )
                .yellow()
            );
        }

        if result.findings.is_empty() {
            eprintln!("  {}", "No dependency confusion candidates found.".green());
        } else {
            eprintln!(
                "  {}",
                format!("POTENTIAL DEPENDENCY CONFUSION: {}", result.findings.len())
                    .red()
                    .bold()
            );
        }

        eprintln!();
    }

    /// Create a progress bar on stderr (verbose only).
    pub fn create_progress_bar(&self, total: u64, message: &str) -> Option<ProgressBar> {
        if self.json_mode || !self.verbose {
            return None;
        }

        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(message.to_string());
        Some(pb)
    }
}

/// `ERROR: <message>`
pub fn format_error(err: &impl Display) -> String {
    format!("ERROR: {}", err)
}
