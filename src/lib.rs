//! Typed, dot-path access to a hierarchical configuration tree.
//!
//! [`PathResolver`] looks up leaves (`"service.http.port"`) and binds whole
//! sections onto structs, falling back to caller-supplied defaults whenever
//! something is missing. [`context`] holds a process-wide resolver for code
//! that cannot have one passed in.

pub mod config;
pub mod context;
mod error;
pub mod resolve;
mod store;

pub use config::{ConfigError, StoreBuilder, TomlStore};
pub use error::Error;
pub use resolve::{PathResolver, ResolveError};
pub use store::{HierarchicalStore, Section};
