//! Error types for the test registry
//!
//! Provides error handling for:
//! - Suite lookup and composition
//! - Test case registration
//! - Template loading
//! - Catalog construction
//! - Configuration loading

use std::path::PathBuf;

use rtm_document::{DocumentError, PatchError};

/// Suite and test case errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Requested suite name has no definition
    #[error("the test list ({name}) does not exist")]
    UnknownSuite { name: String },

    /// Suite name defined twice
    #[error("suite '{0}' is already defined")]
    DuplicateSuite(String),

    /// Composite suite refers to itself
    #[error("suite composition is cyclic: {}", cycle.join(" -> "))]
    CyclicSuite { cycle: Vec<String> },

    /// Zero processes requested
    #[error("test case '{name}' must run on at least one process")]
    InvalidProcessCount { name: String },

    /// Flag text could not be parsed
    #[error("invalid flag '{0}'")]
    InvalidFlag(String),

    /// Platform name not recognised
    #[error("unknown platform '{0}' (expected All, Linux or Darwin)")]
    UnknownPlatform(String),
}

impl RegistryError {
    /// Create unknown-suite error
    #[inline]
    pub fn unknown_suite(name: impl Into<String>) -> Self {
        Self::UnknownSuite { name: name.into() }
    }
}

/// Errors loading base templates
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// IO error during read
    #[error("io error reading template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Template is not a well-formed document
    #[error("cannot parse template {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    /// No template registered under this path
    #[error("no template at {0}")]
    Missing(PathBuf),
}

impl TemplateError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create parse error for path
    pub fn parse_error(path: impl Into<PathBuf>, source: DocumentError) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }
}

/// Errors building a catalog of test cases
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Base template could not be loaded
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Patch list failed for a case
    #[error("cannot derive '{case}': {source}")]
    Patch {
        case: String,
        #[source]
        source: PatchError,
    },

    /// Registration or composition failed
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl CatalogError {
    /// Attach the case name to a patch failure
    pub fn patch(case: impl Into<String>, source: PatchError) -> Self {
        Self::Patch {
            case: case.into(),
            source,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("io error reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML
    #[error("invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_suite_names_identifier() {
        let err = RegistryError::unknown_suite("DOES_NOT_EXIST");
        assert!(err.to_string().contains("DOES_NOT_EXIST"));
    }

    #[test]
    fn cyclic_suite_display() {
        let err = RegistryError::CyclicSuite {
            cycle: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "suite composition is cyclic: A -> B -> A");
    }

    #[test]
    fn catalog_error_wraps_case() {
        let err = CatalogError::patch(
            "heat_periodic_cc_2d_fe",
            PatchError::PathNotFound {
                path: "/U/Time".parse().unwrap(),
            },
        );
        assert!(err.to_string().contains("heat_periodic_cc_2d_fe"));
    }
}
