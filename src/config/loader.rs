//! Configuration loader
//!
//! Reads the TOML file, substitutes `${VAR}` environment references, and
//! validates the result. A missing file at the default location falls
//! back to the built-in defaults so the tool works out of the box.

use super::schema::DocveilConfig;
use crate::domain::errors::{DocveilError, Result};
use regex::Regex;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> Result<DocveilConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DocveilError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = std::fs::read_to_string(path).map_err(|e| {
        DocveilError::Configuration(format!(
            "Failed to read configuration file {}: {e}",
            path.display()
        ))
    })?;
    let contents = substitute_env_vars(&contents)?;

    let config: DocveilConfig = toml::from_str(&contents)?;
    config.validate().map_err(DocveilError::Configuration)?;
    Ok(config)
}

/// Load configuration, falling back to defaults when the file is absent
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<DocveilConfig> {
    if path.as_ref().exists() {
        load_config(path)
    } else {
        Ok(DocveilConfig::default())
    }
}

/// Replace `${VAR}` references with environment values
fn substitute_env_vars(contents: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex");
    let mut missing = Vec::new();
    let substituted = re.replace_all(contents, |caps: &regex::Captures| {
        let name = &caps[1];
        match std::env::var(name) {
            Ok(value) => value,
            Err(_) => {
                missing.push(name.to_string());
                String::new()
            }
        }
    });
    if !missing.is_empty() {
        return Err(DocveilError::Configuration(format!(
            "Undefined environment variables in configuration: {}",
            missing.join(", ")
        )));
    }
    Ok(substituted.into_owned())
}
