//! Repository reference normalization.

use crate::types::{DepconfError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Hosts accepted as the hosting service.
const SUPPORTED_HOSTS: &[&str] = &["github.com", "www.github.com"];

/// A normalized `owner/repo` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Normalize a repository URL.
    ///
    /// Accepts:
    /// - `https://github.com/owner/repo[.git][/]` (extra path segments ignored)
    /// - `git@github.com:owner/repo[.git]`
    /// - `ssh://git@github.com/owner/repo[.git]`
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();

        if let Some(rest) = reference.strip_prefix("git@") {
            return Self::parse_scp_style(rest);
        }

        let url = Url::parse(reference)
            .map_err(|e| invalid(format!("'{}' is not a URL: {}", reference, e)))?;

        if !matches!(url.scheme(), "https" | "http" | "ssh") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }

        let host = url.host_str().unwrap_or_default();
        check_host(host)?;

        let mut segments = url.path().split('/').filter(|s| !s.is_empty());
        match (segments.next(), segments.next()) {
            (Some(owner), Some(repo)) => Self::from_parts(owner, repo),
            _ => Err(invalid(
                "repository URL must include owner and repo".to_string(),
            )),
        }
    }

    /// `github.com:owner/repo.git`
    fn parse_scp_style(rest: &str) -> Result<Self> {
        let (host, path) = rest
            .split_once(':')
            .ok_or_else(|| invalid("invalid git@ URL".to_string()))?;
        check_host(host)?;

        let path = path.trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        match path.split('/').collect::<Vec<_>>().as_slice() {
            [owner, repo] => Self::from_parts(owner, repo),
            _ => Err(invalid(format!(
                "could not parse owner/repo from '{}'",
                path
            ))),
        }
    }

    fn from_parts(owner: &str, repo: &str) -> Result<Self> {
        let repo = repo.strip_suffix(".git").unwrap_or(repo);
        if owner.is_empty() || repo.is_empty() {
            return Err(invalid(
                "repository URL must include owner and repo".to_string(),
            ));
        }
        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

impl FromStr for RepoRef {
    type Err = DepconfError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

fn check_host(host: &str) -> Result<()> {
    if SUPPORTED_HOSTS.contains(&host.to_ascii_lowercase().as_str()) {
        Ok(())
    } else {
        Err(invalid(format!(
            "only GitHub URLs are supported, got host '{}'",
            host
        )))
    }
}

fn invalid(message: String) -> DepconfError {
    DepconfError::Validation(message)
}
