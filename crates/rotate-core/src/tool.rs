//! Seam to the external secrets CLI that does the actual cryptography.

use std::{path::Path, process::ExitStatus};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Environment variable sops reads to pick the PGP recipient for encryption.
pub const SOPS_PGP_FP_VAR: &str = "SOPS_PGP_FP";

/// Errors produced while invoking the external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The external program could not be launched at all.
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

/// Exit status of one external invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolStatus {
    code: Option<i32>,
    success: bool,
}

impl ToolStatus {
    /// A successful invocation, for fakes and tests.
    pub fn ok() -> Self {
        Self {
            code: Some(0),
            success: true,
        }
    }

    /// A failed invocation with the given exit code.
    pub fn failed(code: i32) -> Self {
        Self {
            code: Some(code),
            success: false,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn code(&self) -> Option<i32> {
        self.code
    }
}

impl From<ExitStatus> for ToolStatus {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
            success: status.success(),
        }
    }
}

/// Per-call options for encryption. An explicit parameter object: the
/// fingerprint only ever reaches the child process environment of a single
/// invocation, never the ambient environment of this process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptOptions {
    /// PGP key fingerprint selecting the encryption recipient. When absent
    /// the child inherits whatever the ambient environment carries.
    pub pgp_fingerprint: Option<String>,
}

/// Contract for the external encrypt/decrypt tool. Implemented by
/// [`HelmSecrets`] in production and by recording fakes in tests.
#[async_trait]
pub trait SecretsTool: Send + Sync {
    /// Decrypt `path` in place, blocking until the child exits.
    async fn decrypt(&self, path: &Path) -> Result<ToolStatus, ToolError>;

    /// Encrypt `path` in place with the given per-call options.
    async fn encrypt(&self, path: &Path, options: &EncryptOptions)
        -> Result<ToolStatus, ToolError>;
}

/// Shells out to the `helm secrets` plugin (`helm secrets enc|dec <path>`).
#[derive(Debug, Clone)]
pub struct HelmSecrets {
    program: String,
}

impl HelmSecrets {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Build the command for one invocation. The environment is derived fresh
    /// per call: inherited from this process, with the fingerprint layered on
    /// top when one is supplied.
    fn command(&self, action: &str, path: &Path, fingerprint: Option<&str>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("secrets").arg(action).arg(path);
        if let Some(fp) = fingerprint {
            cmd.env(SOPS_PGP_FP_VAR, fp);
        }
        cmd
    }

    async fn run(&self, mut cmd: Command) -> Result<ToolStatus, ToolError> {
        let status = cmd.status().await.map_err(|source| ToolError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        debug!("external tool exited with {status}");
        Ok(status.into())
    }
}

impl Default for HelmSecrets {
    fn default() -> Self {
        Self::new("helm")
    }
}

#[async_trait]
impl SecretsTool for HelmSecrets {
    async fn decrypt(&self, path: &Path) -> Result<ToolStatus, ToolError> {
        self.run(self.command("dec", path, None)).await
    }

    async fn encrypt(
        &self,
        path: &Path,
        options: &EncryptOptions,
    ) -> Result<ToolStatus, ToolError> {
        self.run(self.command("enc", path, options.pgp_fingerprint.as_deref()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use super::*;

    fn argv(cmd: &Command) -> Vec<String> {
        cmd.as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn env_of<'a>(cmd: &'a Command, var: &str) -> Option<Option<&'a OsStr>> {
        cmd.as_std()
            .get_envs()
            .find(|(k, _)| *k == OsStr::new(var))
            .map(|(_, v)| v)
    }

    #[test]
    fn decrypt_command_has_expected_argv_and_no_env_override() {
        let tool = HelmSecrets::default();
        let cmd = tool.command("dec", Path::new("config/app/secrets.yaml"), None);
        assert_eq!(cmd.as_std().get_program(), "helm");
        assert_eq!(argv(&cmd), vec!["secrets", "dec", "config/app/secrets.yaml"]);
        assert_eq!(env_of(&cmd, SOPS_PGP_FP_VAR), None);
    }

    #[test]
    fn encrypt_command_carries_fingerprint_in_child_env() {
        let tool = HelmSecrets::default();
        let cmd = tool.command("enc", Path::new("environments/secrets.yaml"), Some("DEADBEEF"));
        assert_eq!(argv(&cmd), vec!["secrets", "enc", "environments/secrets.yaml"]);
        assert_eq!(
            env_of(&cmd, SOPS_PGP_FP_VAR),
            Some(Some(OsStr::new("DEADBEEF")))
        );
    }

    #[test]
    fn program_override_is_respected() {
        let tool = HelmSecrets::new("/opt/helm/bin/helm");
        let cmd = tool.command("dec", Path::new("s.yaml"), None);
        assert_eq!(cmd.as_std().get_program(), "/opt/helm/bin/helm");
    }

    #[tokio::test]
    async fn spawn_failure_surfaces_as_tool_error() {
        let tool = HelmSecrets::new("definitely-not-a-real-program-xyz");
        let err = tool
            .decrypt(Path::new("s.yaml"))
            .await
            .expect_err("spawn should fail");
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}
