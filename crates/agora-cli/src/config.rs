//! CLI configuration, read from `.agora/config.json`.

use agora_graph::CentralityConfig;
use agora_ingest::LoadOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Directory holding Agora's per-project files.
pub const CONFIG_DIR: &str = ".agora";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("delimiter must be a single ASCII character, got '{0}'")]
    InvalidDelimiter(char),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgoraConfig {
    /// How many nodes to show per ranking.
    pub top: usize,
    pub damping: f64,
    pub iterations: usize,
    pub tolerance: f64,
    /// Field separator of the interaction log.
    pub delimiter: char,
}

impl Default for AgoraConfig {
    fn default() -> Self {
        let centrality = CentralityConfig::default();
        Self {
            top: 10,
            damping: centrality.damping,
            iterations: centrality.iterations,
            tolerance: centrality.tolerance,
            delimiter: ',',
        }
    }
}

impl AgoraConfig {
    /// Loads the config at `path`, falling back to defaults if it is absent.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn centrality(&self) -> CentralityConfig {
        CentralityConfig {
            damping: self.damping,
            iterations: self.iterations,
            tolerance: self.tolerance,
        }
    }

    pub fn load_options(&self) -> Result<LoadOptions, ConfigError> {
        if !self.delimiter.is_ascii() {
            return Err(ConfigError::InvalidDelimiter(self.delimiter));
        }
        Ok(LoadOptions {
            delimiter: self.delimiter as u8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = AgoraConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, AgoraConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{ "top": 3, "delimiter": ";" }"#).unwrap();

        let config = AgoraConfig::load(&path).unwrap();
        assert_eq!(config.top, 3);
        assert_eq!(config.damping, 0.85);
        assert_eq!(config.load_options().unwrap().delimiter, b';');
    }

    #[test]
    fn test_rejects_non_ascii_delimiter() {
        let config = AgoraConfig {
            delimiter: '→',
            ..Default::default()
        };
        assert!(matches!(
            config.load_options(),
            Err(ConfigError::InvalidDelimiter('→'))
        ));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{ top: ").unwrap();
        assert!(matches!(AgoraConfig::load(&path), Err(ConfigError::Parse(_))));
    }
}
