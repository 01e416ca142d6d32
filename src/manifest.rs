//! package.json / package-lock.json handling.
//!
//! Builds the declared dependency map, the lockfile pin map, and the
//! candidate set that gets checked against the registry.

use crate::parser::is_relative;
use crate::types::DependencyMap;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::debug;

/// Dependency sections of package.json, in merge order. Later sections win.
pub const DEPENDENCY_FIELDS: &[&str] = &[
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

/// Parse manifest JSON, treating malformed content as an empty object.
pub fn parse_json_lenient(file_name: &str, content: &str) -> Value {
    match serde_json::from_str::<Value>(content) {
        Ok(value @ Value::Object(_)) => value,
        Ok(_) => {
            debug!("{} is not a JSON object, ignoring it", file_name);
            Value::Object(Map::new())
        }
        Err(e) => {
            debug!("Malformed {}: {}, ignoring it", file_name, e);
            Value::Object(Map::new())
        }
    }
}

fn dependency_sections(manifest: &Value) -> impl Iterator<Item = (&str, &Map<String, Value>)> {
    DEPENDENCY_FIELDS.iter().filter_map(move |field| {
        manifest
            .get(field)
            .and_then(Value::as_object)
            .map(|section| (*field, section))
    })
}

/// Union the dependency sections of a manifest into one name -> version map.
///
/// Only non-empty string versions are kept. A later section declaring a name
/// without a usable version clears the earlier one, so the name resolves to
/// "unknown" unless the lockfile pins it.
pub fn build_declared_dependencies(manifest: &Value) -> DependencyMap {
    let mut declared = DependencyMap::new();

    for (field, section) in dependency_sections(manifest) {
        for (name, version) in section {
            match version.as_str().filter(|v| !v.is_empty()) {
                Some(version) => {
                    declared.insert(name.clone(), version.to_string());
                }
                None => {
                    debug!("{}.{} has no usable version", field, name);
                    declared.remove(name);
                }
            }
        }
    }

    declared
}

/// Every name declared in a dependency section, whatever its version value.
pub fn declared_names(manifest: &Value) -> BTreeSet<String> {
    dependency_sections(manifest)
        .flat_map(|(_, section)| section.keys().cloned())
        .collect()
}

/// Collect the exact versions pinned by a package-lock.json.
///
/// Reads the lockfile v1 `dependencies` map first, then fills gaps from the
/// v2/v3 `packages` map (top-level `node_modules/<name>` entries only).
/// Only names present in the lockfile get an entry.
pub fn lockfile_versions(lockfile: &Value) -> DependencyMap {
    let mut pinned = DependencyMap::new();

    if let Some(deps) = lockfile.get("dependencies").and_then(Value::as_object) {
        for (name, entry) in deps {
            if let Some(version) = entry.get("version").and_then(Value::as_str) {
                if !version.is_empty() {
                    pinned.insert(name.clone(), version.to_string());
                }
            }
        }
    }

    if let Some(packages) = lockfile.get("packages").and_then(Value::as_object) {
        for (key, entry) in packages {
            let Some(name) = top_level_install(key) else {
                continue;
            };
            if pinned.contains_key(name) {
                continue;
            }
            if let Some(version) = entry.get("version").and_then(Value::as_str) {
                if !version.is_empty() {
                    pinned.insert(name.to_string(), version.to_string());
                }
            }
        }
    }

    pinned
}

/// `node_modules/foo` -> `foo`, `node_modules/@s/p` -> `@s/p`. Nested
/// installs (`node_modules/a/node_modules/b`) and the root entry yield None.
fn top_level_install(key: &str) -> Option<&str> {
    let name = key.strip_prefix("node_modules/")?;
    if name.is_empty() || name.contains("/node_modules/") {
        return None;
    }
    Some(name)
}

/// Declared and pinned versions, resolved with lockfile precedence.
#[derive(Debug, Clone, Default)]
pub struct VersionTable {
    names: BTreeSet<String>,
    declared: DependencyMap,
    locked: DependencyMap,
}

impl VersionTable {
    /// Build from raw manifest and lockfile JSON values.
    pub fn new(manifest: &Value, lockfile: &Value) -> Self {
        Self {
            names: declared_names(manifest),
            declared: build_declared_dependencies(manifest),
            locked: lockfile_versions(lockfile),
        }
    }

    /// Names declared by the manifest, including those without a version.
    pub fn declared_names(&self) -> &BTreeSet<String> {
        &self.names
    }

    pub fn declared(&self) -> &DependencyMap {
        &self.declared
    }

    pub fn locked(&self) -> &DependencyMap {
        &self.locked
    }

    /// Lockfile pin, else manifest version, else None.
    pub fn version_for(&self, name: &str) -> Option<&str> {
        self.locked
            .get(name)
            .or_else(|| self.declared.get(name))
            .map(String::as_str)
    }}

/// Union of declared and extracted names, without relative paths.
pub fn candidate_set<'a>(
    declared: impl IntoIterator<Item = &'a String>,
    extracted: impl IntoIterator<Item = &'a String>,
) -> BTreeSet<String> {
    declared
        .into_iter()
        .chain(extracted)
        .filter(|name| !name.is_empty() && !is_relative(name))
        .cloned()
        .collect()
}
