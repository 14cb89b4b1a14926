//! CLI subcommands.

pub mod records;
pub mod seed;

use storedesk_admin::config::AdminConfig;
use storedesk_admin::store::{self, SharedStore};

/// Collections addressable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EntityKind {
    Products,
    Categories,
    Orders,
    Users,
}

/// Open the document store configured in the environment.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the store client cannot
/// be built.
pub fn connect() -> Result<SharedStore, Box<dyn std::error::Error>> {
    let config = AdminConfig::from_env()?;
    let store = store::connect(&config.store)?;
    tracing::debug!(store = config.store.name(), "Connected to document store");
    Ok(store)
}
