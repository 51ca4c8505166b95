//! Aurafx CLI - inspect authored stores and built-in packs
//!
//! # Commands
//!
//! - `aurafx inspect` - List the definitions in an authored store
//! - `aurafx check` - Report degraded definitions and dangling catalog entries
//! - `aurafx resolve` - Show what a reference resolves to
//!
//! # Usage
//!
//! ```bash
//! # List the configured authored store as JSON
//! aurafx inspect --json
//!
//! # Validate a pack before shipping it
//! aurafx check builtin.toml --strict
//!
//! # Resolve a catalog or definition reference, with authored overrides
//! aurafx resolve aurafx:shop/halo --pack builtin.toml --store authored.afxa
//! ```
//!
//! `check` and `resolve` fall back to `[storage] builtin_pack` from the
//! config file when no pack is given.

mod check;
mod inspect;
mod resolve;

use std::path::PathBuf;

use anyhow::{Context, Result};
use aurafx_core::config::StorageConfig;
use clap::{Parser, Subcommand};

/// Aurafx CLI - inspect authored stores and built-in packs
#[derive(Parser)]
#[command(name = "aurafx")]
#[command(about = "Inspect aurafx authored stores and built-in packs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the definitions in an authored store
    Inspect(inspect::InspectArgs),

    /// Report degraded definitions and dangling catalog entries in a pack
    Check(check::CheckArgs),

    /// Show what a reference resolves to
    Resolve(resolve::ResolveArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect(args) => inspect::execute(args),
        Commands::Check(args) => check::execute(args),
        Commands::Resolve(args) => resolve::execute(args),
    }
}

/// Pack given on the command line, else the configured one
fn pack_path(pack: Option<PathBuf>, storage: &StorageConfig) -> Result<PathBuf> {
    match pack {
        Some(path) => Ok(path),
        None => storage
            .builtin_pack
            .clone()
            .context("No pack given and no [storage] builtin_pack configured"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_path_prefers_argument() {
        let storage = StorageConfig {
            builtin_pack: Some(PathBuf::from("configured.toml")),
            ..Default::default()
        };

        assert_eq!(
            pack_path(Some(PathBuf::from("given.toml")), &storage).unwrap(),
            PathBuf::from("given.toml")
        );
        assert_eq!(
            pack_path(None, &storage).unwrap(),
            PathBuf::from("configured.toml")
        );
        assert!(pack_path(None, &StorageConfig::default()).is_err());
    }
}
