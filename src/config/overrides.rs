//! In-memory overrides addressed by dot-path.

use toml::Value;

use super::source::{ConfigEntry, ConfigSource};
use super::ConfigError;
use crate::resolve::segments;

/// Values set directly by the application, keyed by dot-path.
#[derive(Debug, Clone, Default)]
pub struct OverrideSource {
    values: Vec<(String, Value)>,
}

impl OverrideSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: impl Into<String>, value: impl Into<Value>) {
        self.values.push((path.into(), value.into()));
    }
}

impl ConfigSource for OverrideSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        self.values
            .iter()
            .map(|(path, value)| {
                let segments: Vec<String> = segments(path).into_iter().map(str::to_owned).collect();
                if segments.is_empty() {
                    return Err(ConfigError::InvalidOverridePath(path.clone()));
                }
                Ok(ConfigEntry::at_path(segments, value.clone()))
            })
            .collect()
    }
}
