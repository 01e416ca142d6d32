//! depconf - dependency confusion finder.
//!
//! This library detects package names that a GitHub-hosted npm project
//! depends on but that nobody has published to the public registry:
//! - Fetching package.json and lock files from the repository root
//! - Parsing a local script with an AST to extract imported packages
//! - Checking the union of both against the npm registry
//!
//! # Example
//!
//! ```no_run
//! use depconf::config::AnalysisConfig;
//! use depconf::scanner::Scanner;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() {
//!     let scanner = Scanner::new(&AnalysisConfig::default()).unwrap();
//!     let result = scanner
//!         .analyze("https://github.com/owner/repo", Path::new("script.js"))
//!         .await
//!         .unwrap();
//!     for finding in &result.findings {
//!         println!("{}", finding);
//!     }
//! }
//! ```

pub mod config;
pub mod discovery;
pub mod manifest;
pub mod notify;
pub mod parser;
pub mod registry;
pub mod scanner;
pub mod types;

pub use config::{AnalysisConfig, Config};
pub use scanner::Scanner;
pub use types::{DepconfError, DependencyMap, Finding, RegistryVerdict, Result, ScanResult};
