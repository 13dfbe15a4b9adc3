//! Configuration management

use crate::error::{Result, TagflowError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "tagflow.toml";

/// Environment variable overriding `strict_variables`
pub const STRICT_ENV: &str = "TAGFLOW_STRICT";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Undefined variables are render errors instead of nil
    pub strict_variables: bool,

    /// Default variables file, relative to the config file
    pub variables: Option<PathBuf>,
}

impl Config {
    /// Load config from tagflow.toml in the given directory
    ///
    /// A missing file yields the default configuration.
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let config_path = path.join(CONFIG_FILE);

        let contents = match fs::read_to_string(&config_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(TagflowError::Io(e)),
        };

        let mut config: Config = toml::from_str(&contents).map_err(|e| {
            TagflowError::Config(format!("Failed to parse {}: {}", CONFIG_FILE, e))
        })?;

        if let Some(vars) = config.variables.take() {
            config.variables = Some(if vars.is_relative() {
                path.join(vars)
            } else {
                vars
            });
        }

        Ok(config)
    }

    /// Apply environment overrides
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(value) = std::env::var(STRICT_ENV) {
            self.strict_variables = parse_flag(&value).ok_or_else(|| {
                TagflowError::Config(format!(
                    "{} must be true/false or 1/0, got '{}'",
                    STRICT_ENV, value
                ))
            })?;
        }
        Ok(self)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
