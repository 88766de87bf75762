//! # Check Subcommand
//!
//! Validates one payload file against a named schema and prints `OK` or the
//! violations.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use jsonm_schema::{Matcher, MatcherConfig};

/// Arguments for the `jsonm check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Schema name, with or without the `.json` extension (e.g. `api/user`).
    #[arg(value_name = "SCHEMA")]
    pub schema: String,

    /// Payload file (JSON, or YAML by `.yaml`/`.yml` extension).
    #[arg(value_name = "PAYLOAD")]
    pub payload: PathBuf,

    /// Print every violation instead of only the first.
    #[arg(long)]
    pub all: bool,

    /// Fail instead of generating the schema when it does not exist.
    #[arg(long)]
    pub no_generate: bool,
}

/// Execute the check subcommand.
///
/// Returns exit code: 0 on match, 1 on mismatch.
pub fn run_check(args: &CheckArgs, config: &MatcherConfig) -> Result<u8> {
    let config = config
        .clone()
        .with_generate_missing(config.generate_missing && !args.no_generate);
    let payload = crate::load_payload(&args.payload)?;

    let mut matcher = Matcher::new(&args.schema, &config)
        .with_context(|| format!("failed to load schemas from {}", config.schema_root.display()))?;
    let conforms = matcher
        .matches(&payload)
        .with_context(|| format!("cannot check against schema {}", args.schema))?;

    if conforms {
        println!("OK");
        return Ok(0);
    }

    let Some(errors) = matcher.errors() else {
        return Ok(1);
    };
    if args.all {
        for error in errors {
            println!("FAIL: {error}");
        }
        println!("\n{} violation(s) against {}.", errors.len(), matcher.schema_id());
    } else if let Some(first) = errors.first() {
        println!("FAIL: {first}");
    }
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn setup(dir: &Path) -> MatcherConfig {
        let root = dir.join("schemas");
        fs::create_dir_all(&root).unwrap();
        fs::write(
            root.join("user.json"),
            r#"{"type":"object","required":["name"],"properties":{"name":{"type":"string"}}}"#,
        )
        .unwrap();
        MatcherConfig::default().with_schema_root(root)
    }

    fn args(schema: &str, payload: PathBuf) -> CheckArgs {
        CheckArgs {
            schema: schema.to_string(),
            payload,
            all: true,
            no_generate: true,
        }
    }

    #[test]
    fn exit_codes_follow_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path());
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.yaml");
        fs::write(&good, r#"{"name": "x"}"#).unwrap();
        fs::write(&bad, "name: 5\n").unwrap();

        assert_eq!(run_check(&args("user", good), &config).unwrap(), 0);
        assert_eq!(run_check(&args("user.json", bad), &config).unwrap(), 1);
    }

    #[test]
    fn missing_schema_with_no_generate_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path());
        let payload = dir.path().join("p.json");
        fs::write(&payload, "{}").unwrap();

        let err = run_check(&args("ghost", payload), &config).unwrap_err();
        assert!(format!("{err:#}").contains("ghost"));
        assert!(!config.schema_root.join("ghost.json").exists());
    }

    #[test]
    fn missing_schema_is_generated_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path());
        let payload = dir.path().join("p.json");
        fs::write(&payload, r#"{"id": 1}"#).unwrap();

        let mut generating = args("widget", payload);
        generating.no_generate = false;
        assert_eq!(run_check(&generating, &config).unwrap(), 0);
        assert!(config.schema_root.join("widget.json").exists());
    }
}
