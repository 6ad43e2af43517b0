//! Configuration Management
//!
//! Persisted defaults for placement-explorer, and the explicit configuration
//! handed to the collector.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default listen address for `serve`
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// How providers are keyed inside a cloud's `nodes` map
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NodeKey {
    /// Provider display name; providers sharing a name overwrite each other
    #[default]
    Name,
    /// Provider uuid
    Uuid,
}

/// User configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Clouds to query when none is given on the command line
    #[serde(default)]
    pub clouds: Vec<String>,
    /// Recorded snapshot to serve instead of querying clouds
    #[serde(default)]
    pub fake_data: Option<PathBuf>,
    /// clouds.yaml location
    #[serde(default)]
    pub clouds_file: Option<PathBuf>,
    #[serde(default)]
    pub node_key: Option<NodeKey>,
    /// Listen address for `serve`
    #[serde(default)]
    pub bind: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("placement-explorer").join("config.json"))
    }

    /// Load configuration from disk, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config file: {:#}", e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Get effective clouds (CLI/env > config file)
    pub fn effective_clouds(&self, cli: &[String]) -> Vec<String> {
        if cli.is_empty() {
            self.clouds.clone()
        } else {
            cli.to_vec()
        }
    }

    /// Get effective fake-data path (CLI/env > config file)
    pub fn effective_fake_data(&self, cli: Option<PathBuf>) -> Option<PathBuf> {
        cli.or_else(|| self.fake_data.clone())
    }

    /// Get effective clouds.yaml path (CLI/env > config file > standard locations)
    pub fn effective_clouds_file(&self, cli: Option<PathBuf>) -> Option<PathBuf> {
        cli.or_else(|| self.clouds_file.clone())
    }

    /// Get effective node key (CLI > config file > name)
    pub fn effective_node_key(&self, cli: Option<NodeKey>) -> NodeKey {
        cli.or(self.node_key).unwrap_or_default()
    }

    /// Get effective listen address (CLI > config file > default)
    pub fn effective_bind(&self, cli: Option<String>) -> String {
        cli.or_else(|| self.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
    }
}

/// Everything one collection needs to know, resolved up front
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectorConfig {
    pub clouds: Vec<String>,
    pub fake_data: Option<PathBuf>,
    pub node_key: NodeKey,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_values_win_over_file() {
        let config = Config {
            clouds: vec!["from-file".to_string()],
            fake_data: Some(PathBuf::from("/srv/fake.json")),
            node_key: Some(NodeKey::Uuid),
            ..Default::default()
        };

        assert_eq!(
            config.effective_clouds(&["cli".to_string()]),
            vec!["cli".to_string()]
        );
        assert_eq!(config.effective_clouds(&[]), vec!["from-file".to_string()]);
        assert_eq!(
            config.effective_fake_data(None),
            Some(PathBuf::from("/srv/fake.json"))
        );
        assert_eq!(config.effective_node_key(Some(NodeKey::Name)), NodeKey::Name);
        assert_eq!(config.effective_node_key(None), NodeKey::Uuid);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.effective_node_key(None), NodeKey::Name);
        assert_eq!(config.effective_bind(None), DEFAULT_BIND);
        assert!(config.effective_fake_data(None).is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"clouds": ["devstack"], "node_key": "uuid", "bind": "0.0.0.0:8080"}"#)
            .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.clouds, vec!["devstack".to_string()]);
        assert_eq!(config.node_key, Some(NodeKey::Uuid));
        assert_eq!(config.effective_bind(None), "0.0.0.0:8080");
    }

    #[test]
    fn test_load_from_invalid_file_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not json").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }
}
