//! # Resolve Subcommand
//!
//! Shows where a `$ref` string lands: `jsonm resolve b.json#/definitions/point`.

use anyhow::{bail, Context, Result};
use clap::Args;

use jsonm_core::SchemaId;
use jsonm_schema::{build_store, FsSchemaSource, MatcherConfig};

/// Arguments for the `jsonm resolve` subcommand.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Reference string as written in a schema.
    #[arg(value_name = "REF")]
    pub reference: String,

    /// Locator of the document the reference is written in. Required for
    /// fragment-only references such as `#/definitions/name`.
    #[arg(long, value_name = "LOCATOR")]
    pub from: Option<String>,
}

/// Execute the resolve subcommand; prints the target identity and its
/// declared types.
pub fn run_resolve(args: &ResolveArgs, config: &MatcherConfig) -> Result<u8> {
    let from = match (&args.from, args.reference.starts_with('#')) {
        (Some(from), _) => SchemaId::document(jsonm_schema::schema_locator(from)),
        (None, true) => bail!("fragment-only reference {:?} needs --from", args.reference),
        (None, false) => SchemaId::document(""),
    };

    let source = FsSchemaSource::new(config.schema_root.clone());
    let store = build_store(&source)
        .with_context(|| format!("failed to load schemas from {}", config.schema_root.display()))?;
    let node = store
        .resolve(&args.reference, &from)
        .with_context(|| format!("cannot resolve {:?}", args.reference))?;

    match node.types() {
        Some(types) => {
            let names: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
            println!("{}\ttype: {}", node.id(), names.join(", "));
        }
        None => println!("{}", node.id()),
    }
    Ok(0)
}
