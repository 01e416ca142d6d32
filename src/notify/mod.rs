//! Output module.
//!
//! This module handles:
//! - Finding lines and JSON output on stdout
//! - Verbose progress and colored summaries on stderr

pub mod console;

pub use console::{format_error, ConsoleOutput};
