use thiserror::Error;

/// Why a path failed to resolve.
///
/// The `try_*` and plain lookup forms on [`PathResolver`](super::PathResolver)
/// never surface this; they fall back to the default instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ResolveError {
    #[error("invalid configuration path: {0:?}")]
    InvalidPath(String),

    #[error("no configuration store is initialized")]
    StoreUnset,

    #[error("configuration section not found: {0}")]
    SectionNotFound(String),

    /// The leaf is missing or could not be converted to the requested type.
    #[error("configuration value not found: {0}")]
    LeafNotFound(String),

    /// The section exists but the target's current state could not be
    /// taken apart for binding.
    #[error("cannot bind section {path}: {reason}")]
    Unbindable { path: String, reason: String },
}
