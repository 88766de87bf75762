//! # jsonm-cli: Command-Line Interface
//!
//! Provides the `jsonm` binary over `jsonm-schema`.
//!
//! ## Subcommands
//!
//! - `jsonm check <SCHEMA> <PAYLOAD>`: does the payload match the schema.
//! - `jsonm list`: every document under the schema root.
//! - `jsonm resolve <REF>`: the identity a `$ref` string resolves to.
//! - `jsonm generate <SCHEMA> <PAYLOAD>`: write a schema inferred from a payload.
//!
//! Handlers return an exit code: 0 on success, 1 when a payload does not
//! match, and `Err` (mapped to 2 by the binary) on operational failures.
//!
//! ```bash
//! jsonm --schema-root spec/schemas check user fixtures/user.json --all
//! jsonm resolve b.json#/definitions/point --from a.json
//! ```

pub mod check;
pub mod generate;
pub mod list;
pub mod resolve;

use std::path::Path;

use anyhow::{Context, Result};
use jsonm_schema::MatcherConfig;
use serde_json::Value;

/// Build the effective configuration.
///
/// A `--config` file replaces the environment entirely; `--schema-root`
/// overrides whichever of the two was used.
pub fn resolve_config(config_file: Option<&Path>, schema_root: Option<&Path>) -> Result<MatcherConfig> {
    let base = match config_file {
        Some(path) => MatcherConfig::from_file(path)
            .with_context(|| format!("failed to load config file {}", path.display()))?,
        None => MatcherConfig::from_env().context("invalid jsonm environment configuration")?,
    };
    Ok(match schema_root {
        Some(root) => base.with_schema_root(root),
        None => base,
    })
}

/// Read a payload file. `.yaml`/`.yml` files are read as YAML, everything
/// else as JSON.
pub fn load_payload(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read payload {}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == "yaml" || e == "yml");
    if is_yaml {
        serde_yaml::from_str(&text).with_context(|| format!("invalid YAML in {}", path.display()))
    } else {
        serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn schema_root_flag_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("jsonm.yaml");
        std::fs::write(&file, "schema_root: from-file\ngenerate_missing: false\n").unwrap();

        let from_file = resolve_config(Some(&file), None).unwrap();
        assert_eq!(from_file.schema_root, PathBuf::from("from-file"));
        assert!(!from_file.generate_missing);

        let flagged = resolve_config(Some(&file), Some(Path::new("from-flag"))).unwrap();
        assert_eq!(flagged.schema_root, PathBuf::from("from-flag"));
        assert!(!flagged.generate_missing);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = resolve_config(Some(Path::new("/nonexistent/jsonm.yaml")), None).unwrap_err();
        assert!(format!("{err:#}").contains("failed to load config file"));
    }

    #[test]
    fn loads_json_and_yaml_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("p.json");
        std::fs::write(&json_path, r#"{"name": "x", "n": 1}"#).unwrap();
        assert_eq!(load_payload(&json_path).unwrap(), json!({"name": "x", "n": 1}));

        let yaml_path = dir.path().join("p.yaml");
        std::fs::write(&yaml_path, "name: x\nn: 1\ntags: [a, b]\nnested: {ok: true, ratio: 0.5}\n").unwrap();
        assert_eq!(
            load_payload(&yaml_path).unwrap(),
            json!({"name": "x", "n": 1, "tags": ["a", "b"], "nested": {"ok": true, "ratio": 0.5}})
        );
    }

    #[test]
    fn invalid_yaml_payload_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yml");
        std::fs::write(&path, "name: [unclosed\n").unwrap();
        let err = load_payload(&path).unwrap_err();
        assert!(format!("{err:#}").contains("invalid YAML in"));
    }

    #[test]
    fn invalid_payload_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{").unwrap();
        let err = load_payload(&path).unwrap_err();
        assert!(format!("{err:#}").contains("bad.json"));
    }
}
