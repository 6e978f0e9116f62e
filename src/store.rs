//! The read-only hierarchical store that paths are resolved against.
//!
//! A store is a tree of named sections. Each section may hold child sections
//! and leaf values. Key matching (including case sensitivity) is entirely up
//! to the implementation.

use std::fmt;

use toml::Value;

/// A handle to one section of a [`HierarchicalStore`].
///
/// Handles are cheap to produce and may refer to sections that do not exist;
/// use [`exists`](Section::exists) to find out.
pub trait Section<'a>: fmt::Debug {
    /// Whether this section is present in the store, regardless of content.
    fn exists(&self) -> bool;

    /// Returns the child section named `key`.
    ///
    /// Always yields a handle, even when this section or the child is missing.
    fn section(&self, key: &str) -> Box<dyn Section<'a> + 'a>;

    /// Returns the raw leaf value named `key`, or `None` if there is none.
    fn leaf(&self, key: &str) -> Option<Value>;

    /// Returns a snapshot of this section's contents, or `None` if it does not exist.
    fn tree(&self) -> Option<Value>;

    /// Whether the store key `key` refers to the field or variant `name`.
    ///
    /// Used when binding sections onto typed targets, so a store decides
    /// case sensitivity for field names the same way it does for lookups.
    /// Defaults to exact matching.
    fn keys_match(&self, key: &str, name: &str) -> bool {
        key == name
    }
}

/// A read-only tree of configuration sections.
pub trait HierarchicalStore: Send + Sync + fmt::Debug {
    /// Returns the root section. The root always exists.
    fn root(&self) -> Box<dyn Section<'_> + '_>;
}
