//! Compile-once schema cache.
//!
//! Maps a [`SchemaIdentity`] to its compiled type. Entries, including
//! absent results, are created once and served until [`SchemaCache::reset`]
//! is called; changes to the underlying definition are not detected.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

use crate::compiled::CompiledType;
use crate::compiler::SchemaCompiler;
use crate::error::SchemaResult;
use crate::loader::{DefinitionLoader, SchemaIdentity, YamlFileLoader};

type Entry = Option<Arc<CompiledType>>;

/// Registry of compiled types keyed by schema identity.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: RwLock<HashMap<SchemaIdentity, Entry>>,
    compiler: SchemaCompiler,
    compilations: AtomicUsize,
}

impl SchemaCache {
    /// Create an empty cache using a default compiler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache using a specific compiler.
    pub fn with_compiler(compiler: SchemaCompiler) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            compiler,
            compilations: AtomicUsize::new(0),
        }
    }

    /// Return the cached entry for `identity`, compiling it on first request.
    ///
    /// The loader and compiler run without holding the lock. When two
    /// callers race on the same identity the first stored result wins and
    /// both receive it. Load and compile errors are returned and not cached.
    pub fn get_or_compile<L>(&self, identity: &SchemaIdentity, loader: &L) -> SchemaResult<Entry>
    where
        L: DefinitionLoader + ?Sized,
    {
        if let Some(entry) = self.entries.read().get(identity) {
            debug!(identity = %identity, "Schema cache hit");
            return Ok(entry.clone());
        }

        debug!(identity = %identity, "Schema cache miss");
        let definition = loader.load(identity)?;
        self.compilations.fetch_add(1, Ordering::Relaxed);
        let compiled = self.compiler.compile(definition.as_ref(), identity.as_str())?;

        let (stored, inserted, cached_schemas) = {
            let mut entries = self.entries.write();
            match entries.get(identity) {
                Some(existing) => (existing.clone(), false, entries.len()),
                None => {
                    entries.insert(identity.clone(), compiled.clone());
                    (compiled, true, entries.len())
                }
            }
        };

        if inserted {
            info!(
                identity = %identity,
                type_name = stored.as_ref().map(|c| c.name()).unwrap_or("<absent>"),
                cached_schemas,
                "Schema compiled and cached"
            );
        } else {
            debug!(identity = %identity, "Schema stored concurrently, discarding local compilation");
        }
        Ok(stored)
    }

    /// The compiled type stored for `identity`.
    ///
    /// `None` both for unknown identities and for identities whose
    /// definition was absent; use [`contains`](Self::contains) to tell them apart.
    pub fn get(&self, identity: &SchemaIdentity) -> Option<Arc<CompiledType>> {
        let entries = self.entries.read();
        entries.get(identity).cloned().flatten()
    }

    /// Check if an identity has an entry.
    pub fn contains(&self, identity: &SchemaIdentity) -> bool {
        let entries = self.entries.read();
        entries.contains_key(identity)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry.
    pub fn reset(&self) {
        let mut entries = self.entries.write();
        debug!(dropped = entries.len(), "Schema cache reset");
        entries.clear();
    }

    /// How many times the compiler has been invoked by this cache.
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::Relaxed)
    }
}

/// Global schema cache.
static GLOBAL_CACHE: OnceLock<SchemaCache> = OnceLock::new();

/// Get the process-wide schema cache.
pub fn global_cache() -> &'static SchemaCache {
    GLOBAL_CACHE.get_or_init(SchemaCache::new)
}

/// Load and compile a YAML schema file through the global cache.
pub fn load_schema(path: impl AsRef<Path>) -> SchemaResult<Entry> {
    let identity = SchemaIdentity::from_path(path);
    global_cache().get_or_compile(&identity, &YamlFileLoader)
}
