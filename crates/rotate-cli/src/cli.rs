use clap::{Parser, Subcommand};

/// CLI surface definition. One action per run; absent subcommand prints help.
#[derive(Parser, Debug)]
#[command(
    name = "rotate-secrets",
    about = "Rotate the sops encryption backend of a config repo via helm secrets",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Optional subcommand; help is printed when absent.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Decrypt every secret file with the currently configured backend.
    Decrypt,
    /// Re-encrypt every secret file, optionally to a specific PGP key.
    Encrypt {
        /// PGP key fingerprint to encrypt to. Overrides the config file;
        /// when neither is set the ambient sops configuration applies.
        #[arg(long)]
        key_id: Option<String>,
    },
    /// List the secret files the glob patterns currently match.
    Files,
    /// Print version and exit.
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decrypt_subcommand() {
        let cli = Cli::try_parse_from(["rotate-secrets", "decrypt"]).expect("parse should succeed");
        assert_eq!(cli.command, Some(Command::Decrypt));
    }

    #[test]
    fn parses_encrypt_without_key() {
        let cli = Cli::try_parse_from(["rotate-secrets", "encrypt"]).expect("parse should succeed");
        assert_eq!(cli.command, Some(Command::Encrypt { key_id: None }));
    }

    #[test]
    fn parses_encrypt_with_key_id() {
        let cli = Cli::try_parse_from(["rotate-secrets", "encrypt", "--key-id", "DEADBEEF"])
            .expect("parse should succeed");
        assert_eq!(
            cli.command,
            Some(Command::Encrypt {
                key_id: Some("DEADBEEF".to_string())
            })
        );
    }

    #[test]
    fn no_subcommand_parses_to_none() {
        let cli = Cli::try_parse_from(["rotate-secrets"]).expect("parse should succeed");
        assert_eq!(cli.command, None);
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["rotate-secrets", "rekey"]).is_err());
    }
}
