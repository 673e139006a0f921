//! Schema identities and definition loaders.
//!
//! Reading definitions from storage is the loader's job; the compiler and
//! the cache only ever see an already-parsed mapping.

use serde_json::Value as JsonValue;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::{SchemaError, SchemaResult};

/// The identity a compiled type is cached under.
///
/// For file-backed schemas this is the normalized absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaIdentity(String);

impl SchemaIdentity {
    /// Use an arbitrary string verbatim.
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    /// Build an identity from a filesystem location.
    ///
    /// Relative paths are joined to the current directory and `.`/`..`
    /// components are resolved lexically; the filesystem is not touched.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        };
        Self(normalize_lexically(&absolute).to_string_lossy().into_owned())
    }

    /// The identity string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The file stem, or the whole identity when there is none.
    #[must_use]
    pub fn stem(&self) -> &str {
        Path::new(&self.0)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for SchemaIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SchemaIdentity {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Source of raw schema definitions.
pub trait DefinitionLoader: Send + Sync {
    /// Load the definition for `identity`.
    ///
    /// `Ok(None)` means the schema is empty or missing, which is not an error.
    fn load(&self, identity: &SchemaIdentity) -> SchemaResult<Option<JsonValue>>;
}

impl<F> DefinitionLoader for F
where
    F: Fn(&SchemaIdentity) -> SchemaResult<Option<JsonValue>> + Send + Sync,
{
    fn load(&self, identity: &SchemaIdentity) -> SchemaResult<Option<JsonValue>> {
        self(identity)
    }
}

/// Loads YAML definitions from the file named by the identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFileLoader;

impl YamlFileLoader {
    /// Create a new loader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DefinitionLoader for YamlFileLoader {
    fn load(&self, identity: &SchemaIdentity) -> SchemaResult<Option<JsonValue>> {
        let content = std::fs::read_to_string(identity.as_str())
            .map_err(|e| SchemaError::load(identity.as_str(), e.to_string()))?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let value: JsonValue = serde_yaml::from_str(&content)
            .map_err(|e| SchemaError::load(identity.as_str(), format!("invalid YAML: {}", e)))?;

        Ok(match value {
            JsonValue::Null => None,
            other => Some(other),
        })
    }
}
