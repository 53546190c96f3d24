//! Core pieces for rotating the sops encryption backend of a config repo:
//! glob-based discovery of secret files, the `helm secrets` seam, and the
//! sweep orchestration. This crate is intentionally small to keep dependency
//! surface minimal.

pub mod discover;
pub mod rotate;
pub mod tool;

pub use rotate::{RotateError, RotationReport, Rotator};
pub use tool::{EncryptOptions, HelmSecrets, SecretsTool, ToolError, ToolStatus};
