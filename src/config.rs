use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-project / per-user configuration file.
pub const CONFIG_FILE: &str = ".coccigrep.toml";

/// Optional user configuration.
///
/// Looked up in the working directory first, then in the home directory;
/// the first file found wins. Every key is optional and CLI flags override
/// whatever is configured here.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct EngineConfig {
    /// Path to the spatch binary.
    pub binary: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct DisplayConfig {
    /// Default context lines before each match.
    pub before: Option<usize>,
    /// Default context lines after each match.
    pub after: Option<usize>,
    /// Default render mode: plain, color or editor.
    pub mode: Option<String>,
    /// Default color-mode format: terminal, html or raw.
    pub format: Option<String>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config from {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml_edit::de::Error,
    },
}

impl Config {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml_edit::de::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the first config file found in the standard locations, or the
    /// defaults when there is none. A file that exists but fails to read or
    /// parse is an error, not a silent fallback.
    pub fn load() -> Result<Self, ConfigError> {
        let mut candidates = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(home) = home::home_dir() {
            candidates.push(home.join(CONFIG_FILE));
        }

        for candidate in candidates {
            if candidate.exists() {
                return Self::load_from_path(&candidate);
            }
        }

        Ok(Self::default())
    }
}
