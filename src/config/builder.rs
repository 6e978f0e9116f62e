use std::path::Path;

use toml::{Table, Value};
use tracing::debug;

use super::env::EnvSource;
use super::file::FileSource;
use super::overrides::OverrideSource;
use super::source::{merge_at_path, ConfigSource};
use super::{ConfigError, TomlStore};

/// Builder for a [`TomlStore`] layered from files, environment variables and
/// in-memory overrides.
///
/// Sources are merged in registration order, with later sources overriding
/// earlier ones. Nested tables are merged recursively; other values
/// (including arrays) are replaced entirely.
///
/// ## Example
///
/// ```no_run
/// use cfgpath::{PathResolver, StoreBuilder};
///
/// let store = StoreBuilder::new()
///     .with_file("config/default.toml", true)
///     .with_env("MYAPP", "__")
///     .with_file("config/local.toml", false)
///     .with_override("service.http.port", 9090_i64)
///     .build()?;
///
/// let resolver = PathResolver::new(store);
/// let port: u16 = resolver.select_value("service.http.port", 8080);
/// # Ok::<(), cfgpath::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct StoreBuilder {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a TOML file to be loaded.
    ///
    /// If `required` is `true`, the build will fail if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(self, path: impl AsRef<Path>, required: bool) -> Self {
        self.with_source(FileSource::new(path, required))
    }

    /// Loads environment variables named `{prefix}{separator}{path...}`.
    ///
    /// Path segments are lowercased. Values are coerced from strings to the
    /// most specific type: integer, float, boolean, or string (fallback).
    ///
    /// # Panics
    ///
    /// Panics if `separator` is empty.
    pub fn with_env(self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.with_source(EnvSource::new(prefix, separator))
    }

    /// Sets a single value at a dot-path, layered at its registration position.
    ///
    /// The path is segmented the same way lookups are. A path with no
    /// segments fails at [`build`](Self::build).
    pub fn with_override(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut layer = OverrideSource::new();
        layer.set(path, value);
        self.with_source(layer)
    }

    /// Adds a custom source.
    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Loads every source and merges them into a store.
    pub fn build(self) -> Result<TomlStore, ConfigError> {
        let mut merged = Table::new();

        for source in &self.sources {
            let entries = source.entries()?;
            debug!(?source, entries = entries.len(), "loaded configuration source");
            for entry in entries {
                merge_at_path(&mut merged, &entry.path, entry.value);
            }
        }

        Ok(TomlStore::from_table(merged))
    }
}
