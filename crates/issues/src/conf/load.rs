//! Load: read options from TOML files and validation.

use std::fs;
use std::path::Path;

use super::model::ReadOptions;
use crate::error::{Error, Result};

impl ReadOptions {
    /// Load options from a TOML file; missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "Loaded read options");
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let options: ReadOptions =
            toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))?;
        options.validate().map_err(Error::Config)?;
        Ok(options)
    }

    /// Validate that configuration values are sane
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_log_size == 0 {
            return Err("max_log_size must be > 0".to_string());
        }
        for (index, template) in self.rule_urls.iter().enumerate() {
            if template.category.trim().is_empty() {
                return Err(format!("rule_urls[{}].category must not be empty", index));
            }
            if !template.has_placeholder() {
                return Err(format!(
                    "rule_urls[{}].template must contain {{rule}}, {{category}} or {{id}}",
                    index
                ));
            }
        }
        Ok(())
    }
}
