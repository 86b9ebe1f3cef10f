//! Configuration file discovery and loading.

use crate::config::schema::SafeEnvConfig;
use crate::error::{Result, SafeEnvError};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = ".safe-env.yml";

/// Find `.safe-env.yml` by walking up from `start`.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load a single config file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<SafeEnvConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SafeEnvError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            SafeEnvError::Io(e)
        }
    })?;

    parse_config(&content, path)
}

/// Parse YAML content. `source_path` is only used for error reporting.
pub fn parse_config(content: &str, source_path: &Path) -> Result<SafeEnvConfig> {
    if content.trim().is_empty() {
        return Ok(SafeEnvConfig::default());
    }

    serde_yaml::from_str(content).map_err(|e| SafeEnvError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load the configuration for a build.
///
/// An explicit path must exist. Without one, the nearest `.safe-env.yml`
/// above `context_root` is used, and its absence yields the default config.
pub fn load_config(explicit: Option<&Path>, context_root: &Path) -> Result<SafeEnvConfig> {
    if let Some(path) = explicit {
        tracing::debug!("Loading config from {}", path.display());
        return load_config_file(path);
    }

    match find_config(context_root) {
        Some(path) => {
            tracing::debug!("Found config at {}", path.display());
            load_config_file(&path)
        }
        None => {
            tracing::debug!("No {} above {}", CONFIG_FILE_NAME, context_root.display());
            Ok(SafeEnvConfig::default())
        }
    }
}
