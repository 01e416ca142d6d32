//! Configuration handling for the finder.

use crate::types::{DepconfError, HttpConfig, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org/";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Detect dependency confusion candidates in a GitHub repository.
#[derive(Parser, Debug, Clone)]
#[command(name = "depconf")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// GitHub repository URL (e.g., https://github.com/owner/repo)
    pub repository: String,

    /// Local JavaScript file to analyze (e.g., script.js)
    pub script: PathBuf,

    /// GitHub token
    #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output the full result as JSON
    #[arg(long)]
    pub json: bool,

    /// Registry request timeout in seconds
    #[arg(long, default_value = "5")]
    pub timeout: u64,

    /// Extra attempts for registry lookups with an uncertain answer
    #[arg(long, default_value = "0")]
    pub retries: u32,

    /// Maximum concurrent registry lookups
    #[arg(short, long, default_value = "8")]
    pub concurrency: usize,

    /// Registry rate limit (requests per second)
    #[arg(long, default_value = "10")]
    pub rate_limit: u32,

    /// npm registry base URL
    #[arg(long, env = "DEPCONF_NPM_REGISTRY", default_value = DEFAULT_REGISTRY_URL)]
    pub registry_url: String,

    /// GitHub API base URL
    #[arg(long, env = "DEPCONF_GITHUB_API", default_value = DEFAULT_GITHUB_API_URL)]
    pub github_api_url: String,
}

impl Config {
    /// Build the analysis configuration from command-line options.
    pub fn analysis_config(&self) -> Result<AnalysisConfig> {
        if self.timeout == 0 {
            return Err(DepconfError::Config(
                "--timeout must be at least 1 second".to_string(),
            ));
        }

        Ok(AnalysisConfig {
            github_token: self.token.clone(),
            github_api_url: self.github_api_url.clone(),
            registry_url: self.registry_url.clone(),
            http: HttpConfig {
                timeout: Duration::from_secs(self.timeout),
                max_retries: self.retries,
                ..HttpConfig::default()
            },
            concurrency: self.concurrency.max(1),
            rate_limit: self.rate_limit,
            ..AnalysisConfig::default()
        })
    }
}

/// Everything an analysis run needs, built once and passed by reference.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub github_token: Option<String>,
    pub github_api_url: String,
    /// Package names are appended to this verbatim.
    pub registry_url: String,
    /// Registry request settings.
    pub http: HttpConfig,
    /// Timeout for GitHub requests.
    pub fetch_timeout: Duration,
    pub concurrency: usize,
    /// Registry requests per second.
    pub rate_limit: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            github_token: None,
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            http: HttpConfig::default(),
            fetch_timeout: Duration::from_secs(30),
            concurrency: 8,
            rate_limit: 10,
        }
    }
}
