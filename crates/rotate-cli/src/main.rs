mod cli;
mod config;

use clap::{CommandFactory, Parser};
use color_eyre::Result;
use rotate_core::{
    discover::default_patterns, EncryptOptions, HelmSecrets, RotationReport, Rotator,
};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Entry point wiring the CLI to the rotation core.
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let Some(command) = cli.command else {
        cli::Cli::command().print_help()?;
        return Ok(());
    };

    let config = config::load()?;
    debug!(?config, "loaded configuration");
    match command {
        cli::Command::Decrypt => run_decrypt(&config).await?,
        cli::Command::Encrypt { key_id } => run_encrypt(key_id, &config).await?,
        cli::Command::Files => run_files(&config)?,
        cli::Command::Version => print_version(),
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters, default to info to avoid noisy stdout.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("rotate-secrets {}", env!("CARGO_PKG_VERSION"));
}

/// Build the rotator for the invocation directory from config (patterns and
/// helm binary override).
fn rotator_from_config(config: &config::Config) -> Rotator<HelmSecrets> {
    let patterns = config.patterns.clone().unwrap_or_else(default_patterns);
    let tool = match &config.helm_bin {
        Some(bin) => HelmSecrets::new(bin),
        None => HelmSecrets::default(),
    };
    Rotator::new(".", patterns, tool)
}

async fn run_decrypt(config: &config::Config) -> Result<()> {
    let report = rotator_from_config(config).decrypt().await?;
    finish("decrypt", report)
}

async fn run_encrypt(key_id: Option<String>, config: &config::Config) -> Result<()> {
    let options = encrypt_options(key_id, config);
    let report = rotator_from_config(config).encrypt(&options).await?;
    finish("encrypt", report)
}

/// The CLI flag wins over the config file; with neither set the ambient sops
/// configuration decides the recipient.
fn encrypt_options(key_id: Option<String>, config: &config::Config) -> EncryptOptions {
    EncryptOptions {
        pgp_fingerprint: key_id.or_else(|| config.pgp_fingerprint.clone()),
    }
}

fn run_files(config: &config::Config) -> Result<()> {
    let files = rotator_from_config(config).discover()?;
    if files.is_empty() {
        println!("No secret files found.");
        return Ok(());
    }
    for path in files {
        println!("{}", path.display());
    }
    Ok(())
}

/// Report sweep results; any failed file turns the run into a non-zero exit.
fn finish(label: &str, report: RotationReport) -> Result<()> {
    println!("{label}: {} file(s) processed", report.processed.len());
    if !report.all_ok() {
        let failed: Vec<String> = report
            .failed
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        color_eyre::eyre::bail!(
            "{label} failed for {} file(s): {}",
            failed.len(),
            failed.join(", ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn cli_key_id_wins_over_config_fingerprint() {
        let config = config::Config {
            pgp_fingerprint: Some("FROMCONFIG".to_string()),
            ..config::Config::default()
        };
        let options = encrypt_options(Some("FROMFLAG".to_string()), &config);
        assert_eq!(options.pgp_fingerprint.as_deref(), Some("FROMFLAG"));
    }

    #[test]
    fn config_fingerprint_applies_when_flag_is_absent() {
        let config = config::Config {
            pgp_fingerprint: Some("FROMCONFIG".to_string()),
            ..config::Config::default()
        };
        let options = encrypt_options(None, &config);
        assert_eq!(options.pgp_fingerprint.as_deref(), Some("FROMCONFIG"));
    }

    #[test]
    fn no_fingerprint_means_ambient_environment() {
        let options = encrypt_options(None, &config::Config::default());
        assert_eq!(options, EncryptOptions::default());
    }

    #[test]
    fn clean_report_finishes_ok() {
        let report = RotationReport {
            processed: vec![PathBuf::from("config/a/secrets.yaml")],
            failed: vec![],
        };
        assert!(finish("decrypt", report).is_ok());
    }

    #[test]
    fn failed_files_turn_into_an_error() {
        let report = RotationReport {
            processed: vec![],
            failed: vec![PathBuf::from("config/a/secrets.yaml")],
        };
        let err = finish("encrypt", report).expect_err("should fail");
        assert!(err.to_string().contains("config/a/secrets.yaml"));
    }
}
