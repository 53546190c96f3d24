//! Sweep orchestration: discover secret files, then run the external tool on
//! each, strictly sequentially.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    discover::{self, DiscoverError},
    tool::{EncryptOptions, SecretsTool, ToolError, ToolStatus},
};

/// Errors from per-file operations and discovery.
#[derive(Debug, Error)]
pub enum RotateError {
    /// A path matched by a glob is absent or not a regular file by the time
    /// the operation runs.
    #[error("{} is not a file", path.display())]
    NotAFile { path: PathBuf },
    #[error(transparent)]
    Discover(#[from] DiscoverError),
    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Outcome of a full encrypt or decrypt sweep. A sweep never aborts early;
/// failed paths are collected here instead.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RotationReport {
    /// Files the external tool processed successfully.
    pub processed: Vec<PathBuf>,
    /// Files that failed: vanished before the call, tool could not be
    /// launched, or the tool exited non-zero.
    pub failed: Vec<PathBuf>,
}

impl RotationReport {
    pub fn all_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives the rotation: owns the pattern list, the repo root, and the
/// external tool implementation.
pub struct Rotator<T> {
    root: PathBuf,
    patterns: Vec<String>,
    tool: T,
}

impl<T: SecretsTool> Rotator<T> {
    pub fn new(root: impl Into<PathBuf>, patterns: Vec<String>, tool: T) -> Self {
        Self {
            root: root.into(),
            patterns,
            tool,
        }
    }

    /// Expand the configured patterns into the deduplicated set of secret
    /// files currently present under the root.
    pub fn discover(&self) -> Result<Vec<PathBuf>, RotateError> {
        let found = discover::discover(&self.root, &self.patterns)?;
        Ok(found.into_iter().collect())
    }

    /// Decrypt a single file. Fails without invoking the tool when `path` is
    /// not an existing regular file.
    pub async fn decrypt_file(&self, path: &Path) -> Result<ToolStatus, RotateError> {
        ensure_regular_file(path)?;
        Ok(self.tool.decrypt(path).await?)
    }

    /// Encrypt a single file with the given per-call options. Fails without
    /// invoking the tool when `path` is not an existing regular file.
    pub async fn encrypt_file(
        &self,
        path: &Path,
        options: &EncryptOptions,
    ) -> Result<ToolStatus, RotateError> {
        ensure_regular_file(path)?;
        Ok(self.tool.encrypt(path, options).await?)
    }

    /// Decrypt every discovered secret file.
    pub async fn decrypt(&self) -> Result<RotationReport, RotateError> {
        self.sweep(SweepOp::Decrypt).await
    }

    /// Encrypt every discovered secret file with the same options.
    pub async fn encrypt(&self, options: &EncryptOptions) -> Result<RotationReport, RotateError> {
        self.sweep(SweepOp::Encrypt(options)).await
    }

    /// Run `op` over every discovered file. A per-file failure is logged and
    /// recorded; the remaining files are still processed. Discovery errors
    /// (bad pattern) abort the sweep before any file is touched.
    async fn sweep(&self, op: SweepOp<'_>) -> Result<RotationReport, RotateError> {
        let label = op.label();
        let files = self.discover()?;
        info!("{label}: {} secret file(s) discovered", files.len());

        let mut report = RotationReport::default();
        for path in &files {
            let result = match op {
                SweepOp::Decrypt => self.decrypt_file(path).await,
                SweepOp::Encrypt(options) => self.encrypt_file(path, options).await,
            };
            match result {
                Ok(status) if status.success() => {
                    info!("{label} ok: {}", path.display());
                    report.processed.push(path.clone());
                }
                Ok(status) => {
                    warn!(
                        "{label} failed for {} (exit code {:?})",
                        path.display(),
                        status.code()
                    );
                    report.failed.push(path.clone());
                }
                Err(err) => {
                    warn!("{label} failed for {}: {err}", path.display());
                    report.failed.push(path.clone());
                }
            }
        }
        Ok(report)
    }
}

#[derive(Clone, Copy)]
enum SweepOp<'a> {
    Decrypt,
    Encrypt(&'a EncryptOptions),
}

impl SweepOp<'_> {
    fn label(&self) -> &'static str {
        match self {
            SweepOp::Decrypt => "decrypt",
            SweepOp::Encrypt(_) => "encrypt",
        }
    }
}

fn ensure_regular_file(path: &Path) -> Result<(), RotateError> {
    if !path.is_file() {
        return Err(RotateError::NotAFile {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
