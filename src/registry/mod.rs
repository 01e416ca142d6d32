//! npm registry checking module.
//!
//! Verifies if packages exist on the public npm registry. Uncertain answers
//! (timeouts, 5xx, rate limiting) are reported as present.

pub mod npm;

pub use npm::NpmChecker;
