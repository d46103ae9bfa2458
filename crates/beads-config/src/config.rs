//! Configuration types and loading for the beads system.
//!
//! The main entry point is [`BeadsConfig`], which represents the contents of
//! `.beads/config.yaml`. Configuration is loaded with [`load_config`] and
//! saved with [`save_config`].

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The configuration file contained invalid YAML.
    #[error("failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// The `.beads/` directory was not found.
    #[error("no .beads directory found (run 'bd init' first)")]
    BeadsDirNotFound,
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Main config struct
// ---------------------------------------------------------------------------

/// The beads configuration, corresponding to `.beads/config.yaml`. Only the
/// fields this workspace's operations actually consult: the ID prefix and an
/// actor override that outranks the environment-variable chain (§4.4 of the
/// identity resolution design). All fields use `serde` defaults so a
/// partially-specified or missing file deserializes correctly.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct BeadsConfig {
    /// Issue ID prefix (e.g., `"bd-"`).
    #[serde(default, rename = "issue-prefix")]
    pub prefix: Option<String>,

    /// Actor identity override, ahead of `BD_ACTOR`/`BEADS_ACTOR`/git/`USER`.
    #[serde(default)]
    pub actor: Option<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load configuration from `.beads/config.yaml` inside the given `.beads/` directory.
///
/// If the file does not exist, a default [`BeadsConfig`] is returned.
///
/// # Errors
///
/// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
/// or [`ConfigError::ParseError`] if it contains invalid YAML.
pub fn load_config(beads_dir: &Path) -> Result<BeadsConfig> {
    let config_path = beads_dir.join("config.yaml");

    if !config_path.exists() {
        return Ok(BeadsConfig::default());
    }

    let content = std::fs::read_to_string(&config_path)?;

    // An empty file is valid and yields default config.
    if content.trim().is_empty() {
        return Ok(BeadsConfig::default());
    }

    let config: BeadsConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to `.beads/config.yaml` inside the given `.beads/` directory.
///
/// The directory is created if it does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::ReadError`] on I/O failure or [`ConfigError::ParseError`]
/// if serialization fails.
pub fn save_config(beads_dir: &Path, config: &BeadsConfig) -> Result<()> {
    std::fs::create_dir_all(beads_dir)?;

    let config_path = beads_dir.join("config.yaml");
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(config_path, yaml)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let cfg = BeadsConfig::default();
        assert!(cfg.prefix.is_none());
        assert!(cfg.actor.is_none());
    }

    #[test]
    fn test_load_missing_config_returns_default() {
        let dir = PathBuf::from("/nonexistent/path/.beads");
        let cfg = load_config(&dir).unwrap();
        assert!(cfg.prefix.is_none());
    }

    #[test]
    fn test_roundtrip_config() {
        let dir = tempfile::tempdir().unwrap();
        let beads_dir = dir.path().join(".beads");

        let mut cfg = BeadsConfig::default();
        cfg.prefix = Some("test-".to_string());
        cfg.actor = Some("alice".to_string());

        save_config(&beads_dir, &cfg).unwrap();
        let loaded = load_config(&beads_dir).unwrap();

        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_deserialize_partial_yaml() {
        let yaml = "issue-prefix: proj-\n";
        let cfg: BeadsConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.prefix.as_deref(), Some("proj-"));
        assert!(cfg.actor.is_none());
    }

    #[test]
    fn test_empty_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let beads_dir = dir.path().join(".beads");
        std::fs::create_dir_all(&beads_dir).unwrap();
        std::fs::write(beads_dir.join("config.yaml"), "").unwrap();
        let cfg = load_config(&beads_dir).unwrap();
        assert_eq!(cfg, BeadsConfig::default());
    }
}
