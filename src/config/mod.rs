//! The bundled TOML-backed store and the layered builder that assembles it.

mod builder;
mod env;
mod error;
mod file;
mod overrides;
mod source;
mod store;

pub use builder::StoreBuilder;
pub use env::EnvSource;
pub use error::ConfigError;
pub use file::FileSource;
pub use overrides::OverrideSource;
pub use source::{ConfigEntry, ConfigSource};
pub use store::TomlStore;
