//! Package reference extraction.
//!
//! This module decides which import/require specifiers name an external npm
//! package, and reduces them to the package base name:
//! - `lodash/fp` -> `lodash`
//! - `@scope/pkg/sub` -> `@scope/pkg`
//! - `./local`, `fs`, `node:fs`, `https://cdn/x.js` -> not a package
//!
//! The AST walk that collects specifiers lives in [`ast_parser`].

pub mod ast_parser;

pub use ast_parser::AstParser;

use regex::Regex;
use std::sync::LazyLock;

/// Optional `@scope/`, a name, then an optional subpath.
static PACKAGE_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(@[^@\s/]+/)?[^@\s/]+(/[^@\s]*)?$").expect("package shape regex is valid")
});

/// Node.js built-in modules. These resolve without the registry.
const NODE_BUILTINS: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Check if a specifier is a relative or absolute filesystem path.
pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with('.') || specifier.starts_with('/')
}

/// Check if a name is a Node.js built-in module.
pub fn is_node_builtin(name: &str) -> bool {
    NODE_BUILTINS.contains(&name)
}

/// Check if an import/require specifier refers to an external package.
///
/// Rejects empty strings, relative paths, built-in modules (including their
/// subpaths such as `fs/promises`) and anything carrying a protocol prefix
/// (`http:`, `node:`, `git+ssh:`). Scoped names may contain `:` after the `@`.
pub fn is_external_package_reference(specifier: &str) -> bool {
    if specifier.is_empty() || is_relative(specifier) {
        return false;
    }

    if is_node_builtin(specifier) || is_node_builtin(base_name(specifier)) {
        return false;
    }

    // URL or protocol-prefixed import
    if specifier.contains(':') && !specifier.starts_with('@') {
        return false;
    }

    PACKAGE_SHAPE.is_match(specifier)
}

/// Reduce a specifier to its package base name.
///
/// A bare `@scope` with no package segment is returned unchanged.
pub fn base_name(specifier: &str) -> &str {
    if specifier.starts_with('@') {
        let mut slashes = specifier.match_indices('/').map(|(i, _)| i);
        return match (slashes.next(), slashes.next()) {
            (Some(_), Some(second)) => &specifier[..second],
            _ => specifier,
        };
    }

    specifier.split('/').next().unwrap_or(specifier)
}

/// Classify a specifier and return its base name if it names a package.
pub fn package_name(specifier: &str) -> Option<String> {
    is_external_package_reference(specifier).then(|| base_name(specifier).to_string())
}
