//! Glob-based discovery of secret files.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::warn;

/// Patterns matching the secret files of a standard repo layout, relative to
/// the repo root. Callers may substitute their own list (e.g. from config).
pub const DEFAULT_PATTERNS: &[&str] = &[
    "./config/*/secrets.*.yaml",
    "./config/*/secrets.yaml",
    "./environments/secrets.*.yaml",
    "./environments/secrets.yaml",
];

/// Errors raised while expanding glob patterns.
#[derive(Debug, Error)]
pub enum DiscoverError {
    /// A pattern is not valid glob syntax.
    #[error("invalid glob pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
    /// The root (or a pattern) is not valid UTF-8 and cannot be globbed.
    #[error("path is not valid UTF-8: {}", path.display())]
    NonUtf8Path { path: PathBuf },
}

/// Returns the default pattern list as owned strings, ready to be replaced or
/// extended by configuration.
pub fn default_patterns() -> Vec<String> {
    DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect()
}

/// Expand every pattern relative to `root` and collect the union of matches.
///
/// Each matching path appears exactly once no matter how many patterns match
/// it. An empty result is not an error. Unreadable directory entries are
/// skipped with a warning; existence of the matches is only re-checked later,
/// at operation time.
pub fn discover(root: &Path, patterns: &[String]) -> Result<BTreeSet<PathBuf>, DiscoverError> {
    let mut found = BTreeSet::new();
    for pattern in patterns {
        let full = root.join(pattern.trim_start_matches("./"));
        let full = full.to_str().ok_or_else(|| DiscoverError::NonUtf8Path {
            path: full.clone(),
        })?;
        let paths = glob::glob(full).map_err(|source| DiscoverError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
        for entry in paths {
            match entry {
                Ok(path) => {
                    found.insert(path);
                }
                Err(err) => warn!("skipping unreadable match for `{pattern}`: {err}"),
            }
        }
    }
    Ok(found)
}
