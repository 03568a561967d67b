//! Manifest configuration
//!
//! Resolution order, highest first: command-line flags, environment
//! (`RTM_INPUTS_DIR`, `WHICH_TESTS`), `rtm.toml`, built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::COMPONENT;
use crate::error::ConfigError;

/// Environment variable naming the inputs root
pub const INPUTS_DIR_ENV: &str = "RTM_INPUTS_DIR";

/// Environment variable naming the selected suite
pub const SUITE_ENV: &str = "WHICH_TESTS";

/// Default config file name
pub const CONFIG_FILE: &str = "rtm.toml";

/// Where templates live and which suite to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Directory holding one subdirectory per component
    pub inputs_root: PathBuf,
    /// Component subdirectory
    pub component: String,
    /// Selected suite, if any
    pub suite: Option<String>,
}

impl ManifestConfig {
    /// Parse from TOML text
    ///
    /// # Errors
    ///
    /// [`ConfigError::Toml`] on malformed input; `origin` names the source.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Read a TOML config file
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if unreadable, [`ConfigError::Toml`] if malformed.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Read `path` if given, else `rtm.toml` if present, else defaults
    ///
    /// # Errors
    ///
    /// Propagates read and parse failures of an existing file.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_toml_file(path),
            None if Path::new(CONFIG_FILE).is_file() => Self::from_toml_file(Path::new(CONFIG_FILE)),
            None => Ok(Self::default()),
        }
    }

    /// Apply `RTM_INPUTS_DIR` and `WHICH_TESTS` from the process environment
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    #[must_use]
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(root) = lookup(INPUTS_DIR_ENV).filter(|v| !v.is_empty()) {
            self.inputs_root = PathBuf::from(root);
        }
        if let Some(suite) = lookup(SUITE_ENV).filter(|v| !v.is_empty()) {
            self.suite = Some(suite);
        }
        self
    }

    #[must_use]
    pub fn with_inputs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.inputs_root = root.into();
        self
    }

    #[must_use]
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = component.into();
        self
    }

    #[must_use]
    pub fn with_suite(mut self, suite: impl Into<String>) -> Self {
        self.suite = Some(suite.into());
        self
    }

    /// `<inputs_root>/<component>`, the root catalogs resolve templates against
    #[must_use]
    pub fn component_dir(&self) -> PathBuf {
        self.inputs_root.join(&self.component)
    }
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            inputs_root: PathBuf::from("inputs"),
            component: COMPONENT.to_string(),
            suite: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ManifestConfig::default();
        assert_eq!(config.component_dir(), PathBuf::from("inputs/PhaseField"));
        assert_eq!(config.suite, None);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config =
            ManifestConfig::from_toml_str("inputs_root = \"/data/inputs\"\n", Path::new("rtm.toml")).unwrap();
        assert_eq!(config.inputs_root, PathBuf::from("/data/inputs"));
        assert_eq!(config.component, "PhaseField");
    }

    #[test]
    fn malformed_toml_names_file() {
        let err = ManifestConfig::from_toml_str("suite = [", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(&err, ConfigError::Toml { path, .. } if path == Path::new("bad.toml")));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn env_overrides_file_and_cli_overrides_env() {
        let file = ManifestConfig::default()
            .with_inputs_root("/from/file")
            .with_suite("HEATTEST");
        let env = file.with_env_from(|key| match key {
            INPUTS_DIR_ENV => Some("/from/env".to_string()),
            SUITE_ENV => Some("LOCALTESTS".to_string()),
            _ => None,
        });
        assert_eq!(env.inputs_root, PathBuf::from("/from/env"));
        assert_eq!(env.suite.as_deref(), Some("LOCALTESTS"));

        let cli = env.with_suite("DEBUGTESTS");
        assert_eq!(cli.suite.as_deref(), Some("DEBUGTESTS"));
    }

    #[test]
    fn empty_env_values_ignored() {
        let config = ManifestConfig::default().with_env_from(|_| Some(String::new()));
        assert_eq!(config, ManifestConfig::default());
    }
}
