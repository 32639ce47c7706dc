// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Viva - conversation webhook and case service.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use viva_config::{ConfigError, VivaConfig};

/// Viva - conversation webhook and case service.
#[derive(Parser, Debug)]
#[command(name = "viva", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook and case API server.
    Serve,
    /// Validate configuration and print it with secrets redacted.
    CheckConfig,
    /// Print the signature header value for a payload file.
    Sign {
        /// File containing the exact request body.
        file: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> VivaConfig {
    let loaded = match path {
        Some(path) => viva_config::load_and_validate_path(path),
        None => viva_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            viva_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

/// Returns the configured webhook secret or exits with a diagnostic.
fn require_secret(config: &VivaConfig) -> String {
    match config.webhook.secret.as_deref().filter(|s| !s.is_empty()) {
        Some(secret) => secret.to_string(),
        None => {
            viva_config::render_errors(&[ConfigError::MissingSecret {
                key: "webhook.secret".into(),
                env: "VIVA_WEBHOOK_SECRET".into(),
            }]);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    match cli.command {
        Some(Commands::Serve) => {
            let secret = require_secret(&config);
            if let Err(e) = serve::run_serve(config, secret.into()).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::CheckConfig) => match commands::redacted_toml(&config) {
            Ok(rendered) => {
                eprintln!("viva: configuration is valid");
                print!("{rendered}");
            }
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        },
        Some(Commands::Sign { file }) => {
            let secret = require_secret(&config);
            match commands::sign_file(&file, secret.as_bytes()) {
                Ok(signature) => println!("{signature}"),
                Err(e) => {
                    eprintln!("error: {e}");
                    std::process::exit(1);
                }
            }
        }
        None => {
            println!("viva: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_sign_with_global_config() {
        let cli = Cli::try_parse_from(["viva", "sign", "body.json", "--config", "viva.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("viva.toml")));
        assert!(matches!(cli.command, Some(Commands::Sign { ref file }) if file == &PathBuf::from("body.json")));
    }

    #[test]
    fn cli_parses_check_config() {
        let cli = Cli::try_parse_from(["viva", "check-config"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
