//! Emporium CLI - store setup and catalog management.
//!
//! # Usage
//!
//! ```bash
//! # Create the MongoDB indexes
//! emporium-cli indexes
//!
//! # Seed the product catalog
//! emporium-cli seed products catalog.yaml
//! ```
//!
//! Store settings come from the same environment variables as the
//! storefront (`STOREFRONT_MONGODB_URI`, `STOREFRONT_DATABASE`,
//! `STOREFRONT_STORE`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "emporium-cli")]
#[command(author, version, about = "Emporium CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the MongoDB indexes
    Indexes,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert products from a YAML file, skipping names already present
    Products {
        /// Path to the YAML product list
        file: String,
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
        Commands::Indexes => commands::indexes::create().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Products { file } => commands::seed::products(&file).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_seed_products() {
        let cli = Cli::try_parse_from(["emporium-cli", "seed", "products", "catalog.yaml"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Seed { target: SeedTarget::Products { file } }) if file == "catalog.yaml"
        ));
    }
}
