//! Core types and errors for the dependency confusion finder.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that abort an analysis run.
#[derive(Error, Debug)]
pub enum DepconfError {
    /// Malformed repository reference (wrong host, missing owner/repo).
    #[error("Invalid repository reference: {0}")]
    Validation(String),

    /// Hosting-service error other than "not found" while fetching manifests.
    #[error("Failed to fetch repository files: {0}")]
    Fetch(String),

    /// The local script could not be read.
    #[error("JS file not found or unreadable: {}: {source}", path.display())]
    LocalInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Neither module nor script grammar could parse the local script.
    #[error("AST parse error: {0}")]
    Parse(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DepconfError>;

/// Package name to version string, from a manifest or a lockfile.
pub type DependencyMap = BTreeMap<String, String>;

/// Marker used when no version is known for a finding.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Outcome of looking a package up on the public registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistryVerdict {
    /// Registry answered 200.
    Exists {
        name: String,
        latest_version: Option<String>,
    },
    /// Registry answered 404; the name can be claimed by anyone.
    NotFound { name: String },
    /// Network failure, timeout or any other status.
    Uncertain { name: String, reason: String },
}

impl RegistryVerdict {
    /// Whether the package is treated as present on the registry.
    ///
    /// Uncertain lookups count as present so that flaky responses never turn
    /// into findings.
    pub fn exists(&self) -> bool {
        !matches!(self, RegistryVerdict::NotFound { .. })
    }

    pub fn latest_version(&self) -> Option<&str> {
        match self {
            RegistryVerdict::Exists { latest_version, .. } => latest_version.as_deref(),
            _ => None,
        }
    }

    pub fn is_uncertain(&self) -> bool {
        matches!(self, RegistryVerdict::Uncertain { .. })
    }
}

/// A package referenced by the repository that is absent from the registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Finding {
    /// Package name (e.g., "@company/pkg" or "lodash").
    pub name: String,
    /// Best-known version: lockfile pin, then manifest range.
    pub version: Option<String>,
}

impl Finding {
    pub fn new(name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}",
            self.name,
            self.version.as_deref().unwrap_or(UNKNOWN_VERSION)
        )
    }
}

/// Complete result of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Normalized `owner/repo`.
    pub repository: String,
    /// Local script that was parsed.
    pub script: PathBuf,
    /// Manifest files that exist in the repository root.
    pub files_fetched: Vec<String>,
    /// Names declared in package.json.
    pub declared: usize,
    /// Names referenced by the script.
    pub extracted: usize,
    /// Size of the union that was checked against the registry.
    pub candidates: usize,
    /// Names missing from the registry, sorted by name.
    pub findings: Vec<Finding>,
    /// Lookups that ended uncertain and were treated as present.
    pub uncertain: Vec<String>,
    pub duration_secs: f64,
}

/// Configuration for HTTP requests.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_retries: 0,
            user_agent: concat!("depconf/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
