//! StoreDesk CLI - Record management tools.
//!
//! # Usage
//!
//! ```bash
//! # List every product
//! sd-cli list products
//!
//! # Delete a customer by uid
//! sd-cli delete users 8bXq2...
//!
//! # Load categories, products and orders from a YAML file
//! sd-cli seed crates/cli/fixtures/demo.yaml
//! ```
//!
//! # Commands
//!
//! - `list` - Print the records of one collection
//! - `delete` - Delete one record
//! - `seed` - Create records from a YAML file
//!
//! The store is chosen the same way as for the dashboard (`STOREDESK_STORE`,
//! `FIRESTORE_*`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::EntityKind;

#[derive(Parser)]
#[command(name = "sd-cli")]
#[command(author, version, about = "StoreDesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every record of a collection
    List {
        /// Collection to list
        #[arg(value_enum)]
        entity: EntityKind,
    },
    /// Delete one record
    Delete {
        /// Collection the record belongs to
        #[arg(value_enum)]
        entity: EntityKind,

        /// Document ID (the uid for users)
        id: String,
    },
    /// Create categories, products and orders from a YAML file
    Seed {
        /// Path to the YAML file
        file: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sd_cli=info,storedesk_admin=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = commands::connect()?;

    match cli.command {
        Commands::List { entity } => commands::records::list(store, entity).await?,
        Commands::Delete { entity, id } => commands::records::delete(store, entity, &id).await?,
        Commands::Seed { file } => {
            let summary = commands::seed::from_file(store, &file).await?;
            tracing::info!(
                categories = summary.categories,
                products = summary.products,
                orders = summary.orders,
                "Seeding complete"
            );
        }
    }
    Ok(())
}
