//! Configuration file loading for Codefluent
//!
//! Handles loading and parsing configuration files using the config crate.

use std::path::Path;

use config::{Config as ConfigBuilder, File, FileFormat};

use crate::config::{Config, ConfigError};

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = ConfigBuilder::builder()
            .add_source(File::from(path))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config = ConfigBuilder::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        if self.sentinel.is_empty() {
            return Err(ConfigError::Invalid("sentinel must not be empty".to_string()));
        }

        for (id, runner) in &self.runners {
            if runner.name.is_empty() {
                return Err(ConfigError::Invalid(format!("runner '{id}' has empty name")));
            }
            if runner.command.first().is_none_or(|program| program.is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "runner '{id}' has empty command"
                )));
            }
        }

        if let Some(ref id) = self.default_runner
            && !self.runners.contains_key(id)
        {
            return Err(ConfigError::Invalid(format!(
                "default runner '{id}' is not configured"
            )));
        }

        Ok(())
    }
}
