//! Mock GitHub API and npm registry servers for integration tests.

#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use depconf::types::HttpConfig;
use depconf::AnalysisConfig;
use serde_json::json;
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::net::TcpListener;

/// How the mock GitHub API answers for one root file.
#[derive(Clone)]
pub enum FileReply {
    /// Base64 inline content, like files under 1 MB.
    Inline(String),
    /// No inline content; served from `download_url`.
    Large(String),
    /// Error status with a GitHub-style message.
    Status(StatusCode),
}

/// Bind an ephemeral port, build the router with the base URL, serve it.
async fn serve(build: impl FnOnce(String) -> Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let router = build(base_url.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    base_url
}

#[derive(Clone)]
struct GithubState {
    base_url: String,
    files: Arc<HashMap<String, FileReply>>,
    required_token: Option<String>,
}

impl GithubState {
    fn allows(&self, owner: &str, repo: &str, headers: &HeaderMap) -> bool {
        if owner != "acme" || repo != "app" {
            return false;
        }
        match self.required_token {
            None => true,
            Some(ref token) => {
                headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    == Some(format!("Bearer {}", token).as_str())
            }
        }
    }
}

/// Serve a GitHub API that knows exactly one repository, `acme/app`.
pub async fn spawn_github(files: Vec<(&str, FileReply)>, required_token: Option<&str>) -> String {
    let files: HashMap<String, FileReply> = files
        .into_iter()
        .map(|(name, reply)| (name.to_string(), reply))
        .collect();
    let required_token = required_token.map(str::to_string);

    serve(move |base_url| {
        Router::new()
            .route("/repos/:owner/:repo", get(handle_repo))
            .route("/repos/:owner/:repo/contents/:file", get(handle_contents))
            .route("/raw/:file", get(handle_raw))
            .with_state(GithubState {
                base_url,
                files: Arc::new(files),
                required_token,
            })
    })
    .await
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Not Found" }))).into_response()
}

async fn handle_repo(
    State(state): State<GithubState>,
    headers: HeaderMap,
    Path((owner, repo)): Path<(String, String)>,
) -> Response {
    if !state.allows(&owner, &repo, &headers) {
        return not_found();
    }
    Json(json!({ "full_name": format!("{}/{}", owner, repo) })).into_response()
}

async fn handle_contents(
    State(state): State<GithubState>,
    headers: HeaderMap,
    Path((owner, repo, file)): Path<(String, String, String)>,
) -> Response {
    if !state.allows(&owner, &repo, &headers) {
        return not_found();
    }

    let download_url = format!("{}/raw/{}", state.base_url, file);
    match state.files.get(&file) {
        Some(FileReply::Inline(text)) => Json(json!({
            "name": file,
            "encoding": "base64",
            "content": wrap_base64(text),
            "download_url": download_url,
        }))
        .into_response(),
        Some(FileReply::Large(_)) => Json(json!({
            "name": file,
            "encoding": "none",
            "content": "",
            "download_url": download_url,
        }))
        .into_response(),
        Some(FileReply::Status(status)) => {
            (*status, Json(json!({ "message": "Server Error" }))).into_response()
        }
        None => not_found(),
    }
}

async fn handle_raw(State(state): State<GithubState>, Path(file): Path<String>) -> Response {
    match state.files.get(&file) {
        Some(FileReply::Inline(text)) | Some(FileReply::Large(text)) => {
            (StatusCode::OK, text.clone()).into_response()
        }
        _ => not_found(),
    }
}

/// Base64 with line breaks every 60 characters, as the contents API does.
fn wrap_base64(text: &str) -> String {
    STANDARD
        .encode(text)
        .as_bytes()
        .chunks(60)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Per-name request counter shared with the registry mock.
#[derive(Clone, Default)]
pub struct Hits(Arc<Mutex<HashMap<String, usize>>>);

impl Hits {
    pub fn count(&self, name: &str) -> usize {
        self.0.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    fn record(&self, name: &str) -> usize {
        let mut hits = self.0.lock().unwrap();
        let count = hits.entry(name.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}

fn packument(name: &str, latest: &str) -> Response {
    Json(json!({
        "name": name,
        "dist-tags": { "latest": latest },
        "versions": { latest: { "name": name, "version": latest } }
    }))
    .into_response()
}

/// Serve a registry with a fixed set of behaviours:
/// - `lodash`, `react`, `@scope/thing`: published
/// - `no-dist-tags`: published, versions map only
/// - `broken-json`: 200 with a non-JSON body
/// - `flaky-pkg`: answers after 3 seconds
/// - `rate-limited`: 429, `server-error`: 500
/// - `recovering-pkg`: 503 on the first request, then published
/// - anything else: 404
pub async fn spawn_registry() -> (String, Hits) {
    let hits = Hits::default();
    let state = hits.clone();

    let base_url = serve(move |_| {
        Router::new()
            .route("/*name", get(handle_package))
            .with_state(state)
    })
    .await;

    (format!("{}/", base_url), hits)
}

async fn handle_package(State(hits): State<Hits>, Path(name): Path<String>) -> Response {
    let count = hits.record(&name);

    match name.as_str() {
        "lodash" => packument(&name, "4.17.21"),
        "react" => packument(&name, "18.2.0"),
        "@scope/thing" => packument(&name, "1.0.0"),
        "no-dist-tags" => Json(json!({
            "name": name,
            "versions": { "0.9.0": {}, "0.10.0": {} }
        }))
        .into_response(),
        "broken-json" => (StatusCode::OK, "<html>maintenance</html>").into_response(),
        "flaky-pkg" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            packument(&name, "1.0.0")
        }
        "rate-limited" => StatusCode::TOO_MANY_REQUESTS.into_response(),
        "server-error" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "recovering-pkg" if count == 1 => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        "recovering-pkg" => packument(&name, "2.0.0"),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response(),
    }
}

/// Analysis config pointing at the mock servers, with a short registry timeout.
pub fn test_config(github_api_url: &str, registry_url: &str) -> AnalysisConfig {
    AnalysisConfig {
        github_api_url: github_api_url.to_string(),
        registry_url: registry_url.to_string(),
        http: HttpConfig {
            timeout: Duration::from_millis(300),
            ..HttpConfig::default()
        },
        fetch_timeout: Duration::from_secs(5),
        rate_limit: 1000,
        ..AnalysisConfig::default()
    }
}

/// Write a local script with the given extension.
pub fn script(source: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(source.as_bytes()).unwrap();
    file
}
