//! # Schema Sources
//!
//! Where schema documents come from. The matcher only sees the
//! [`SchemaSourceEnumerator`] trait; [`FsSchemaSource`] reads a directory
//! tree and [`MemorySchemaSource`] serves documents from memory.
//!
//! ## Symlinks
//!
//! The filesystem source follows symbolic links exactly one level deep. A
//! link found while walking the schema root is followed (to a file or a
//! directory); links found inside a linked directory are skipped. Locators
//! keep the link's own name, so `root/shared -> /opt/schemas` yields
//! `shared/point.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

/// One schema document as read from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSource {
    /// Schema-root relative path with `/` separators.
    pub locator: String,
    /// Raw document text.
    pub text: String,
}

/// Errors raised while enumerating or persisting schema documents.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The schema root exists but could not be traversed.
    #[error("cannot walk schema directory {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    /// A schema file could not be read.
    #[error("cannot read schema file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A generated schema could not be written.
    #[error("cannot write schema file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The locator escapes the schema root or is not relative.
    #[error("invalid schema locator {locator:?}: must be a relative path inside the schema root")]
    InvalidLocator { locator: String },
}

/// Enumerates schema documents and accepts newly generated ones.
pub trait SchemaSourceEnumerator {
    /// Every available document, sorted by locator with no duplicates.
    fn enumerate(&self) -> Result<Vec<SchemaSource>, SourceError>;

    /// Store `text` under `locator` so later enumerations return it.
    fn persist(&mut self, locator: &str, text: &str) -> Result<(), SourceError>;
}

/// Reads every `*.json` file below a schema root directory.
#[derive(Debug, Clone)]
pub struct FsSchemaSource {
    root: PathBuf,
}

impl FsSchemaSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scan(
        &self,
        dir: &Path,
        prefix: &str,
        follow_links: bool,
        found: &mut BTreeMap<String, String>,
    ) -> Result<(), SourceError> {
        for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|source| SourceError::Walk {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(dir) else {
                continue;
            };
            let locator = match locator_of(relative) {
                rel if prefix.is_empty() => rel,
                rel => format!("{prefix}/{rel}"),
            };

            if entry.path_is_symlink() {
                if !follow_links {
                    tracing::debug!(path = %path.display(), "skipping nested symlink");
                    continue;
                }
                let metadata = match fs::metadata(path) {
                    Ok(m) => m,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping broken symlink");
                        continue;
                    }
                };
                if metadata.is_dir() {
                    self.scan(path, &locator, false, found)?;
                } else if metadata.is_file() && is_json(path) {
                    read_into(path, locator, found)?;
                }
                continue;
            }

            if entry.file_type().is_file() && is_json(path) {
                read_into(path, locator, found)?;
            }
        }
        Ok(())
    }
}

impl SchemaSourceEnumerator for FsSchemaSource {
    fn enumerate(&self) -> Result<Vec<SchemaSource>, SourceError> {
        if !self.root.exists() {
            tracing::debug!(root = %self.root.display(), "schema root does not exist; no schemas");
            return Ok(Vec::new());
        }
        let mut found = BTreeMap::new();
        self.scan(&self.root, "", true, &mut found)?;
        tracing::debug!(root = %self.root.display(), count = found.len(), "enumerated schema files");
        Ok(found
            .into_iter()
            .map(|(locator, text)| SchemaSource { locator, text })
            .collect())
    }

    fn persist(&mut self, locator: &str, text: &str) -> Result<(), SourceError> {
        let relative = checked_locator(locator)?;
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| SourceError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, text).map_err(|source| SourceError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), "wrote schema file");
        Ok(())
    }
}

/// An in-memory set of schema documents.
#[derive(Debug, Clone, Default)]
pub struct MemorySchemaSource {
    documents: BTreeMap<String, String>,
}

impl MemorySchemaSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, locator: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(locator, text);
        self
    }

    pub fn insert(&mut self, locator: impl Into<String>, text: impl Into<String>) {
        self.documents.insert(locator.into(), text.into());
    }

    pub fn get(&self, locator: &str) -> Option<&str> {
        self.documents.get(locator).map(String::as_str)
    }
}

impl SchemaSourceEnumerator for MemorySchemaSource {
    fn enumerate(&self) -> Result<Vec<SchemaSource>, SourceError> {
        Ok(self
            .documents
            .iter()
            .map(|(locator, text)| SchemaSource {
                locator: locator.clone(),
                text: text.clone(),
            })
            .collect())
    }

    fn persist(&mut self, locator: &str, text: &str) -> Result<(), SourceError> {
        checked_locator(locator)?;
        self.insert(locator, text);
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

fn locator_of(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn checked_locator(locator: &str) -> Result<&Path, SourceError> {
    let path = Path::new(locator);
    let escapes = locator.is_empty()
        || path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(SourceError::InvalidLocator {
            locator: locator.to_string(),
        });
    }
    Ok(path)
}

fn read_into(path: &Path, locator: String, found: &mut BTreeMap<String, String>) -> Result<(), SourceError> {
    if found.contains_key(&locator) {
        return Ok(());
    }
    let text = fs::read_to_string(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    found.insert(locator, text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, text: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn locators(source: &impl SchemaSourceEnumerator) -> Vec<String> {
        source
            .enumerate()
            .unwrap()
            .into_iter()
            .map(|s| s.locator)
            .collect()
    }

    #[test]
    fn enumerates_json_files_recursively_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("z.json"), "{}");
        write(&dir.path().join("api/user.json"), "{\"type\":\"object\"}");
        write(&dir.path().join("api/notes.txt"), "ignored");
        write(&dir.path().join("a.json"), "{}");

        let source = FsSchemaSource::new(dir.path());
        assert_eq!(locators(&source), vec!["a.json", "api/user.json", "z.json"]);
        let docs = source.enumerate().unwrap();
        assert_eq!(docs[1].text, "{\"type\":\"object\"}");
    }

    #[test]
    fn missing_root_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsSchemaSource::new(dir.path().join("absent"));
        assert!(source.enumerate().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn follows_symlinks_one_level() {
        use std::os::unix::fs::symlink;

        let root = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        write(&root.path().join("a.json"), "{}");
        write(&outside.path().join("linked/c.json"), "{}");
        write(&outside.path().join("deep/d.json"), "{}");
        write(&outside.path().join("single.json"), "{}");
        symlink(outside.path().join("deep"), outside.path().join("linked/inner")).unwrap();
        symlink(outside.path().join("linked"), root.path().join("ext")).unwrap();
        symlink(outside.path().join("single.json"), root.path().join("one.json")).unwrap();

        let source = FsSchemaSource::new(root.path());
        assert_eq!(locators(&source), vec!["a.json", "ext/c.json", "one.json"]);
    }

    #[test]
    fn persist_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = FsSchemaSource::new(dir.path().join("schemas"));
        source.persist("api/new.json", "{}").unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("schemas/api/new.json")).unwrap(), "{}");
        assert_eq!(locators(&source), vec!["api/new.json"]);
    }

    #[test]
    fn persist_rejects_escaping_locators() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = FsSchemaSource::new(dir.path());
        for bad in ["../evil.json", "/etc/evil.json", ""] {
            assert!(matches!(
                source.persist(bad, "{}").unwrap_err(),
                SourceError::InvalidLocator { .. }
            ));
        }
    }

    #[test]
    fn memory_source_round_trips_persisted_documents() {
        let mut source = MemorySchemaSource::new().with("b.json", "{}").with("a.json", "{}");
        source.persist("c.json", "{\"type\":\"string\"}").unwrap();
        assert_eq!(locators(&source), vec!["a.json", "b.json", "c.json"]);
        assert_eq!(source.get("c.json"), Some("{\"type\":\"string\"}"));
    }
}
