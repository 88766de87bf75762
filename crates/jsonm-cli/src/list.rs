//! # List Subcommand
//!
//! Prints the locator of every schema document under the schema root.

use anyhow::{Context, Result};
use clap::Args;

use jsonm_schema::{build_store, FsSchemaSource, MatcherConfig};

/// Arguments for the `jsonm list` subcommand.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Also print each document's `id` alias, when it declares one.
    #[arg(long)]
    pub aliases: bool,
}

/// Execute the list subcommand. Loading also expands every reference, so a
/// successful listing means the schema set is consistent.
pub fn run_list(args: &ListArgs, config: &MatcherConfig) -> Result<u8> {
    let source = FsSchemaSource::new(config.schema_root.clone());
    let store = build_store(&source)
        .with_context(|| format!("failed to load schemas from {}", config.schema_root.display()))?;

    for locator in store.locators() {
        match store.document(locator).and_then(|d| d.alias()) {
            Some(alias) if args.aliases => println!("{locator}\t{alias}"),
            _ => println!("{locator}"),
        }
    }
    tracing::info!(count = store.len(), "listed schemas");
    Ok(0)
}
