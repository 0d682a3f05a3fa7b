//! Rules file loading for the CLI
//!
//! This module handles finding and loading TOML rules files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use copybook::{CopybookError, config::RulesConfig};

/// Rules-file errors for the CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML rules: {0}")]
    Parse(String),

    #[error("Missing rules file: {0}")]
    MissingFile(PathBuf),
}

impl From<ConfigError> for CopybookError {
    fn from(err: ConfigError) -> Self {
        CopybookError::Io(io::Error::other(err.to_string()))
    }
}

/// Find and load rules from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (copybook/rules.toml)
/// 3. Platform-specific config directory
/// 4. Default rules if none found
///
/// # Arguments
///
/// * `explicit_path` - Optional explicit path to a rules file
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Rules file exists but cannot be parsed
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<RulesConfig, CopybookError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading rules from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("copybook/rules.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading rules from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "copybook", "copybook") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading rules from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System rules file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No rules file found, using default rules");
    Ok(RulesConfig::default())
}

/// Load rules from a TOML file
///
/// # Errors
///
/// Returns error if:
/// - File doesn't exist
/// - File cannot be read
/// - TOML parsing fails
fn load_config_file(path: impl AsRef<Path>) -> Result<RulesConfig, CopybookError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config: RulesConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    Ok(config)
}
