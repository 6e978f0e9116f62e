//! Process-wide configuration handle.
//!
//! Holds at most one [`PathResolver`] for code that cannot have one passed
//! in. The handle is swapped atomically (`arc-swap`), so a lookup racing an
//! [`initialize`] or [`destroy`] sees either the old store or the new one.
//! Before [`initialize`] and after [`destroy`], every lookup falls back to
//! its default.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use cfgpath::{context, TomlStore};
//!
//! let store = TomlStore::from_toml_str("[app]\nname = \"dragon\"")?;
//! context::initialize(Arc::new(store));
//!
//! let name: String = context::select_value("app.name", String::new());
//! assert_eq!(name, "dragon");
//!
//! context::destroy();
//! assert_eq!(context::select_value("app.name", String::from("unset")), "unset");
//! # Ok::<(), cfgpath::ConfigError>(())
//! ```

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

use crate::resolve::{PathResolver, ResolveError};
use crate::store::HierarchicalStore;

static CURRENT: ArcSwapOption<PathResolver> = ArcSwapOption::const_empty();

/// Makes `store` the process-wide configuration, replacing any previous one.
pub fn initialize(store: Arc<dyn HierarchicalStore>) {
    let previous = CURRENT.swap(Some(Arc::new(PathResolver::from_shared(store))));
    debug!(replaced = previous.is_some(), "configuration store initialized");
}

/// Releases the process-wide configuration.
///
/// The store itself is only dropped once its other owners let go of it.
pub fn destroy() {
    let previous = CURRENT.swap(None);
    debug!(was_set = previous.is_some(), "configuration store destroyed");
}

/// Returns the process-wide resolver, if one is initialized.
#[inline]
pub fn resolver() -> Option<Arc<PathResolver>> {
    CURRENT.load_full()
}

pub fn is_initialized() -> bool {
    CURRENT.load().is_some()
}

/// See [`PathResolver::select_value`].
pub fn select_value<T: DeserializeOwned>(path: &str, default: T) -> T {
    try_select_value(path, default).1
}

/// See [`PathResolver::try_select_value`]. Returns `(false, default)` when no
/// store is initialized.
pub fn try_select_value<T: DeserializeOwned>(path: &str, default: T) -> (bool, T) {
    match resolver() {
        Some(resolver) => resolver.try_select_value(path, default),
        None => {
            trace!(path, err = %ResolveError::StoreUnset, "falling back to default value");
            (false, default)
        }
    }
}

/// See [`PathResolver::populate_object`].
pub fn populate_object<T>(path: &str) -> T
where
    T: Default + Serialize + DeserializeOwned,
{
    try_populate_object(path).1
}

/// See [`PathResolver::try_populate_object`]. Returns `(false, T::default())`
/// when no store is initialized.
pub fn try_populate_object<T>(path: &str) -> (bool, T)
where
    T: Default + Serialize + DeserializeOwned,
{
    match resolver() {
        Some(resolver) => resolver.try_populate_object(path),
        None => {
            trace!(path, err = %ResolveError::StoreUnset, "falling back to default object");
            (false, T::default())
        }
    }
}

/// See [`PathResolver::resolve_value`].
pub fn resolve_value<T: DeserializeOwned>(path: &str) -> Result<T, ResolveError> {
    resolver().ok_or(ResolveError::StoreUnset)?.resolve_value(path)
}

/// See [`PathResolver::resolve_object`].
pub fn resolve_object<T>(path: &str) -> Result<T, ResolveError>
where
    T: Default + Serialize + DeserializeOwned,
{
    resolver().ok_or(ResolveError::StoreUnset)?.resolve_object(path)
}
