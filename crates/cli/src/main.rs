//! Tienda CLI - database migrations and catalog seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! tienda-cli migrate
//!
//! # Load categories and products from a YAML catalog
//! tienda-cli seed catalog.yaml
//!
//! # Same, deactivating products missing from the file
//! tienda-cli seed catalog.yaml --replace
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tienda-cli")]
#[command(author, version, about = "Tienda CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Upsert categories and products from a YAML catalog
    Seed {
        /// Path to the catalog file
        file: PathBuf,

        /// Deactivate products that are not in the file
        #[arg(long)]
        replace: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file, replace } => commands::seed::catalog(&file, replace).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_seed_arguments() {
        let cli = Cli::try_parse_from(["tienda-cli", "seed", "catalog.yaml", "--replace"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Seed { replace: true, .. })
        ));
    }
}
