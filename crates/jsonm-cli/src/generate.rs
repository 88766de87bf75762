//! # Generate Subcommand
//!
//! Infers a draft-04 schema from an example payload and writes it under the
//! schema root.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use jsonm_schema::{
    parse_value, schema_locator, DraftFourGenerator, FsSchemaSource, MatcherConfig, SchemaGenerator,
    SchemaSourceEnumerator,
};

/// Arguments for the `jsonm generate` subcommand.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Schema name to write (e.g. `api/user` writes `api/user.json`).
    #[arg(value_name = "SCHEMA")]
    pub schema: String,

    /// Example payload file (JSON, or YAML by extension).
    #[arg(value_name = "PAYLOAD")]
    pub payload: PathBuf,

    /// Overwrite an existing schema document.
    #[arg(long)]
    pub force: bool,
}

/// Execute the generate subcommand.
pub fn run_generate(args: &GenerateArgs, config: &MatcherConfig) -> Result<u8> {
    let locator = schema_locator(&args.schema);
    let target = config.schema_root.join(&locator);
    if target.exists() && !args.force {
        bail!("{} already exists; pass --force to overwrite", target.display());
    }

    let payload = crate::load_payload(&args.payload)?;
    let schema = DraftFourGenerator.generate(&locator, &payload);
    parse_value(&schema, &locator).context("generated schema is not well-formed")?;
    let text = serde_json::to_string_pretty(&schema).context("failed to serialize generated schema")?;

    let mut source = FsSchemaSource::new(config.schema_root.clone());
    source
        .persist(&locator, &text)
        .with_context(|| format!("failed to write {}", target.display()))?;
    println!("wrote {}", target.display());
    Ok(0)
}
