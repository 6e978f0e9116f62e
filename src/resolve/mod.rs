//! Dot-path resolution of values and objects against a [`HierarchicalStore`].
//!
//! A path such as `"service.http.port"` is split into segments. Every segment
//! but the last is walked as a nested section starting from the store root,
//! and the last segment is resolved inside the section the walk ends on.
//!
//! The walk does not check that intermediate sections exist. A missing
//! intermediate section simply yields handles that resolve nothing, so every
//! failure surfaces at the terminal segment.

mod bind;
mod convert;
mod error;
mod node;
mod path;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

pub use error::ResolveError;
pub use path::{segments, SplitPath, DELIMITER};

use bind::BindError;
use crate::store::{HierarchicalStore, Section};

/// Typed, path-addressed access to a [`HierarchicalStore`].
///
/// The resolver is the explicit configuration context: build one at startup
/// and hand it (or a clone, which shares the store) to whatever needs
/// configuration. [`crate::context`] offers a process-wide one as well.
///
/// ## Example
///
/// ```
/// use cfgpath::{PathResolver, TomlStore};
///
/// let store = TomlStore::from_toml_str(
///     r#"
///     [service.http]
///     port = "8080"
///     "#,
/// )?;
/// let resolver = PathResolver::new(store);
///
/// assert_eq!(resolver.select_value("service.http.port", 80u16), 8080);
/// assert_eq!(resolver.select_value("service.http.host", String::from("::")), "::");
/// # Ok::<(), cfgpath::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PathResolver {
    store: Arc<dyn HierarchicalStore>,
}

impl PathResolver {
    pub fn new(store: impl HierarchicalStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Creates a resolver over a store that is shared with its owner.
    pub fn from_shared(store: Arc<dyn HierarchicalStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn HierarchicalStore> {
        &self.store
    }

    /// Returns the value at `path`, or `default` if it cannot be resolved.
    pub fn select_value<T: DeserializeOwned>(&self, path: &str, default: T) -> T {
        self.try_select_value(path, default).1
    }

    /// Resolves the value at `path`.
    ///
    /// Returns `(true, value)` on success. Otherwise returns `(false, default)`
    /// with `default` unchanged. A leaf that cannot be converted to `T` counts
    /// as missing.
    pub fn try_select_value<T: DeserializeOwned>(&self, path: &str, default: T) -> (bool, T) {
        match self.resolve_value(path) {
            Ok(value) => (true, value),
            Err(err) => {
                trace!(path, %err, "falling back to default value");
                (false, default)
            }
        }
    }

    /// Returns a `T` populated from the section at `path`.
    ///
    /// Falls back to `T::default()` if the section cannot be resolved.
    pub fn populate_object<T>(&self, path: &str) -> T
    where
        T: Default + Serialize + DeserializeOwned,
    {
        self.try_populate_object(path).1
    }

    /// Resolves the section at `path` and binds its leaves onto a fresh `T::default()`.
    ///
    /// Leaves are matched to fields by name; fields without a leaf keep their
    /// default and leaves without a field are ignored. On failure the
    /// returned instance is an untouched `T::default()`.
    pub fn try_populate_object<T>(&self, path: &str) -> (bool, T)
    where
        T: Default + Serialize + DeserializeOwned,
    {
        match self.resolve_object(path) {
            Ok(object) => (true, object),
            Err(err) => {
                trace!(path, %err, "falling back to default object");
                (false, T::default())
            }
        }
    }

    /// Binds the section at `path` onto an existing `target`.
    ///
    /// The target's current field values act as the defaults. Returns `false`
    /// and leaves `target` untouched if the section cannot be resolved or bound.
    pub fn bind<T>(&self, path: &str, target: &mut T) -> bool
    where
        T: Serialize + DeserializeOwned,
    {
        match self.bind_checked(path, target) {
            Ok(bound) => {
                *target = bound;
                true
            }
            Err(err) => {
                trace!(path, %err, "section not bound");
                false
            }
        }
    }

    /// Resolves the value at `path`, reporting why it could not be found.
    pub fn resolve_value<T: DeserializeOwned>(&self, path: &str) -> Result<T, ResolveError> {
        let split = parse(path)?;
        let parent = walk(self.store.as_ref(), &split.parents);

        let leaf = parent
            .leaf(split.terminal)
            .ok_or_else(|| ResolveError::LeafNotFound(path.to_owned()))?;

        let keys = |key: &str, name: &str| parent.keys_match(key, name);
        convert::from_leaf(leaf, &keys).map_err(|err| {
            trace!(path, %err, "leaf not convertible");
            ResolveError::LeafNotFound(path.to_owned())
        })
    }

    /// Resolves the section at `path` into a fresh `T`, reporting why it
    /// could not be found.
    pub fn resolve_object<T>(&self, path: &str) -> Result<T, ResolveError>
    where
        T: Default + Serialize + DeserializeOwned,
    {
        self.bind_checked(path, &T::default())
    }

    fn bind_checked<T>(&self, path: &str, target: &T) -> Result<T, ResolveError>
    where
        T: Serialize + DeserializeOwned,
    {
        let split = parse(path)?;
        let parent = walk(self.store.as_ref(), &split.parents);

        if !parent.exists() {
            let parent_path = split.parents.join(".");
            return Err(ResolveError::SectionNotFound(parent_path));
        }

        let section = parent.section(split.terminal);
        let tree = match section.tree() {
            Some(tree) if section.exists() => tree,
            _ => return Err(ResolveError::SectionNotFound(path.to_owned())),
        };

        let keys = |key: &str, name: &str| section.keys_match(key, name);
        bind::bind_section(tree, target, &keys).map_err(|err| {
            trace!(path, %err, "section not bindable");
            match err {
                BindError::Capture(reason) => ResolveError::Unbindable {
                    path: path.to_owned(),
                    reason: reason.to_string(),
                },
                BindError::Convert(_) => ResolveError::LeafNotFound(path.to_owned()),
            }
        })
    }
}

fn parse(path: &str) -> Result<SplitPath<'_>, ResolveError> {
    SplitPath::parse(path).ok_or_else(|| ResolveError::InvalidPath(path.to_owned()))
}

/// Walks `parents` from the root without checking existence along the way.
fn walk<'a>(store: &'a dyn HierarchicalStore, parents: &[&str]) -> Box<dyn Section<'a> + 'a> {
    parents
        .iter()
        .fold(store.root(), |section, segment| section.section(segment))
}
