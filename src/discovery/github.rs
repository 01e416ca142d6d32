//! GitHub contents fetcher for root manifest files.

use crate::config::AnalysisConfig;
use crate::discovery::RepoRef;
use crate::types::{DepconfError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Files looked up in the repository root, in fetch order.
pub const MANIFEST_FILES: &[&str] = &[
    "package.json",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
];

/// File name -> text content, for files that exist.
pub type RepoFiles = BTreeMap<String, String>;

/// GitHub contents API response for a single file.
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: Option<String>,
    encoding: Option<String>,
    download_url: Option<String>,
}

/// GitHub API error body.
#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}

/// Fetcher for manifest files in a GitHub repository.
pub struct GithubFetcher {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GithubFetcher {
    /// Create a new fetcher from the analysis configuration.
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(&config.http.user_agent)
            .build()?;

        Ok(Self {
            client,
            api_url: config.github_api_url.trim_end_matches('/').to_string(),
            token: config.github_token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Fetch the known manifest files from the repository root.
    ///
    /// Missing files are omitted. A missing repository or any other API
    /// failure is an error.
    pub async fn fetch_repo_root_files(&self, repo: &RepoRef) -> Result<RepoFiles> {
        self.check_repository(repo).await?;

        let mut files = RepoFiles::new();
        for name in MANIFEST_FILES {
            match self.fetch_file(repo, name).await? {
                Some(content) => {
                    debug!("Fetched {} from {} ({} bytes)", name, repo, content.len());
                    files.insert(name.to_string(), content);
                }
                None => trace!("{} not present in {}", name, repo),
            }
        }

        Ok(files)
    }

    async fn check_repository(&self, repo: &RepoRef) -> Result<()> {
        let url = format!("{}/repos/{}/{}", self.api_url, repo.owner, repo.repo);
        trace!("Checking repository: {}", url);

        let response = self.get(&url).send().await.map_err(fetch_error)?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(DepconfError::Fetch(format!(
                "repository {} not found",
                repo
            ))),
            status => Err(api_error(&url, status, response).await),
        }
    }

    /// Fetch one file; `Ok(None)` when it does not exist.
    async fn fetch_file(&self, repo: &RepoRef, name: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url, repo.owner, repo.repo, name
        );
        trace!("Fetching: {}", url);

        let response = self.get(&url).send().await.map_err(fetch_error)?;
        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Ok(None),
            status => return Err(api_error(&url, status, response).await),
        }

        let contents: ContentsResponse = response.json().await.map_err(|e| {
            DepconfError::Fetch(format!("unexpected contents response for {}: {}", name, e))
        })?;

        match (contents.encoding.as_deref(), contents.content) {
            (Some("base64"), Some(encoded)) => decode_base64(name, &encoded).map(Some),
            // Files over 1 MB come back without inline content
            _ => match contents.download_url {
                Some(download_url) => self.download(&download_url).await.map(Some),
                None => Err(DepconfError::Fetch(format!(
                    "{} has no inline content and no download URL",
                    name
                ))),
            },
        }
    }

    async fn download(&self, url: &str) -> Result<String> {
        debug!("Downloading raw file: {}", url);
        let response = self.get(url).send().await.map_err(fetch_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(api_error(url, status, response).await);
        }
        let bytes = response.bytes().await.map_err(fetch_error)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Decode a base64 payload that GitHub wraps at 60 columns.
fn decode_base64(name: &str, encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| DepconfError::Fetch(format!("invalid base64 content for {}: {}", name, e)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn fetch_error(e: reqwest::Error) -> DepconfError {
    DepconfError::Fetch(e.to_string())
}

async fn api_error(url: &str, status: StatusCode, response: reqwest::Response) -> DepconfError {
    let message = response
        .json::<ApiError>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_default();

    if message.is_empty() {
        DepconfError::Fetch(format!("GET {} returned HTTP {}", url, status))
    } else {
        DepconfError::Fetch(format!("GET {} returned HTTP {}: {}", url, status, message))
    }
}
