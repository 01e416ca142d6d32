//! Main scanner orchestrating all components.
//!
//! One run: normalize the repository reference, fetch root manifests, merge
//! dependency versions, extract script references, build the candidate set,
//! check every candidate against the registry, and report the missing ones.

use crate::config::AnalysisConfig;
use crate::discovery::{GithubFetcher, RepoFiles, RepoRef};
use crate::manifest::{candidate_set, parse_json_lenient, VersionTable};
use crate::notify::ConsoleOutput;
use crate::parser::AstParser;
use crate::registry::NpmChecker;
use crate::types::{Finding, RegistryVerdict, Result, ScanResult};
use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// Main scanner that orchestrates all analysis components.
pub struct Scanner {
    fetcher: GithubFetcher,
    npm_checker: NpmChecker,
    ast_parser: AstParser,
    console: ConsoleOutput,
    concurrency: usize,
}

impl Scanner {
    /// Create a new scanner with the given configuration.
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        Ok(Self {
            fetcher: GithubFetcher::new(config)?,
            npm_checker: NpmChecker::new(config)?,
            ast_parser: AstParser::new(),
            console: ConsoleOutput::default(),
            concurrency: config.concurrency.max(1),
        })
    }

    /// Use a console for progress and summary output.
    pub fn with_console(mut self, console: ConsoleOutput) -> Self {
        self.console = console;
        self
    }

    /// Analyze a repository together with one local script.
    ///
    /// Fails fast on an invalid reference, a manifest fetch error, or an
    /// unreadable/unparseable script. Registry lookups never fail the run.
    pub async fn analyze(&self, repository: &str, script: &Path) -> Result<ScanResult> {
        let start_time = Instant::now();

        let repo = RepoRef::parse(repository)?;
        debug!("Normalized repo: {}", repo);

        let files = self.fetcher.fetch_repo_root_files(&repo).await?;
        debug!("Fetched files from repo: {:?}", files.keys().collect::<Vec<_>>());

        let versions = merge_manifests(&files);
        debug!(
            "Declared {} dependencies, {} pinned by lockfile",
            versions.declared_names().len(),
            versions.locked().len()
        );

        let extracted = self.ast_parser.extract_file(script)?;
        debug!("Packages referenced in JS: {:?}", extracted);

        let candidates = candidate_set(versions.declared_names(), &extracted);
        debug!("Combined candidate packages: {:?}", candidates);

        let verdicts = self.resolve_all(candidates.iter()).await;

        let mut findings = Vec::new();
        let mut uncertain = Vec::new();
        for (name, verdict) in &verdicts {
            debug!(
                "Registry check for {}: exists={}, latest={:?}",
                name,
                verdict.exists(),
                verdict.latest_version()
            );
            if verdict.is_uncertain() {
                uncertain.push(name.clone());
            }
            if !verdict.exists() {
                findings.push(Finding::new(
                    name.clone(),
                    versions.version_for(name).map(str::to_string),
                ));
            }
        }

        let result = ScanResult {
            repository: repo.to_string(),
            script: script.to_path_buf(),
            files_fetched: files.keys().cloned().collect(),
            declared: versions.declared_names().len(),
            extracted: extracted.len(),
            candidates: candidates.len(),
            findings,
            uncertain,
            duration_secs: start_time.elapsed().as_secs_f64(),
        };

        self.console.print_summary(&result);

        Ok(result)
    }

    /// Check candidates against the registry with bounded concurrency.
    ///
    /// Results come back sorted by name regardless of completion order.
    async fn resolve_all<'a>(
        &self,
        candidates: impl ExactSizeIterator<Item = &'a String>,
    ) -> Vec<(String, RegistryVerdict)> {
        let pb = self
            .console
            .create_progress_bar(candidates.len() as u64, "Checking npm");
        let progress = pb.as_ref();
        let npm_checker = &self.npm_checker;

        let mut verdicts: Vec<(String, RegistryVerdict)> = stream::iter(candidates)
            .map(|name| async move {
                let verdict = npm_checker.check_package(name).await;
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                (name.clone(), verdict)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        verdicts.sort_by(|a, b| a.0.cmp(&b.0));
        verdicts
    }
}

/// Build the version table from fetched package.json / package-lock.json.
fn merge_manifests(files: &RepoFiles) -> VersionTable {
    let empty = || Value::Object(Map::new());

    let manifest = files
        .get("package.json")
        .map(|content| parse_json_lenient("package.json", content))
        .unwrap_or_else(empty);
    let lockfile = files
        .get("package-lock.json")
        .map(|content| parse_json_lenient("package-lock.json", content))
        .unwrap_or_else(empty);

    for name in ["yarn.lock", "pnpm-lock.yaml"] {
        if files.contains_key(name) {
            debug!("{} present but not parsed; versions come from package.json", name);
        }
    }

    VersionTable::new(&manifest, &lockfile)
}
