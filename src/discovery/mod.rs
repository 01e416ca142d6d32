//! Repository discovery.
//!
//! This module handles locating the analysis inputs:
//! - Normalizing a repository reference to `owner/repo`
//! - Fetching root manifest and lock files through the GitHub API

pub mod github;
pub mod repo_ref;

pub use github::{GithubFetcher, RepoFiles, MANIFEST_FILES};
pub use repo_ref::RepoRef;
