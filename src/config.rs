//! Configuration: built-in defaults, then a `testid.toml` file, then CLI
//! overrides.
//!
//! ```toml
//! marker = "pytest.mark.test_id"
//! test_prefix = "test_"
//! include = ["test_*.py", "*_test.py"]
//! exclude = [".git", "__pycache__"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::marker::{MarkerName, DEFAULT_MARKER};
use crate::predicate::PrefixRule;
use crate::rewriter::Annotator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Canonical name of the traceability marker.
    pub marker: String,
    /// Definitions whose names start with this are tests.
    pub test_prefix: String,
    /// File name globs selected when walking directories.
    pub include: Vec<String>,
    /// Directory names never descended into.
    pub exclude: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            test_prefix: PrefixRule::DEFAULT_PREFIX.to_string(),
            include: vec!["test_*.py".to_string(), "*_test.py".to_string()],
            exclude: [".git", "__pycache__", ".venv", "venv", ".tox", "node_modules"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Config {
    pub const FILE_NAME: &'static str = "testid.toml";

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Config file to use when none is given explicitly: `testid.toml` in
    /// `dir`, else the user-level `testid/config.toml`.
    pub fn locate(dir: &Path) -> Option<PathBuf> {
        let local = dir.join(Self::FILE_NAME);
        if local.is_file() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|d| d.join("testid").join("config.toml"))
            .filter(|p| p.is_file())
    }

    /// Resolve the effective config: `explicit` if given, else whatever
    /// [`Config::locate`] finds in `dir`, else the defaults.
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        match explicit.map(Path::to_path_buf).or_else(|| Self::locate(dir)) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        MarkerName::new(&self.marker)?;
        if self.test_prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        Ok(())
    }

    /// An annotator for this config, generating UUIDs.
    pub fn annotator(&self) -> Result<Annotator, ConfigError> {
        self.validate()?;
        Ok(Annotator::new(MarkerName::new(&self.marker)?)
            .with_predicate(PrefixRule::new(self.test_prefix.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.marker, "pytest.mark.test_id");
        assert_eq!(config.test_prefix, "test_");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml("marker = \"trace.case_id\"\n").unwrap();
        assert_eq!(config.marker, "trace.case_id");
        assert_eq!(config.include, Config::default().include);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Config::from_toml("markers = \"x\"\n").is_err());
    }

    #[test]
    fn test_invalid_marker() {
        let config = Config {
            marker: "not a name".into(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidMarker(_))));
    }

    #[test]
    fn test_empty_prefix() {
        let config = Config {
            test_prefix: String::new(),
            ..Config::default()
        };
        assert!(matches!(config.annotator(), Err(ConfigError::EmptyPrefix)));
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(Config::FILE_NAME), "test_prefix = \"check_\"\n").unwrap();
        let config = Config::resolve(None, dir.path()).unwrap();
        assert_eq!(config.test_prefix, "check_");
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::resolve(Some(&missing), dir.path()),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(Config::FILE_NAME);
        std::fs::write(&path, "marker = [").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }
}
