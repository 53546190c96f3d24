use std::{fs, path::Path};

use color_eyre::Result;
use serde::{Deserialize, Serialize};

/// Repo-local configuration loaded from `.rotate-secrets.toml` in the
/// invocation directory. Every field is optional; defaults come from the
/// core crate.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Override for the glob patterns locating secret files.
    pub patterns: Option<Vec<String>>,
    /// Default PGP key fingerprint to encrypt to (`--key-id` wins over this).
    pub pgp_fingerprint: Option<String>,
    /// Override for the helm program name or path.
    pub helm_bin: Option<String>,
}

pub const CONFIG_FILE: &str = ".rotate-secrets.toml";

/// Load config from the invocation directory; if missing, return defaults.
pub fn load() -> Result<Config> {
    load_from_path(CONFIG_FILE)
}

/// Load config from a given path; if missing or empty, return defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = toml::from_str(&contents)?;
    Ok(cfg)
}
