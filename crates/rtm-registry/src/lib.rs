//! RTM Test Registry
//!
//! Named, ordered suites of regression-test cases, each case a base template
//! derived through a patch list.
//!
//! # Core Concepts
//!
//! - [`TestCase`]: name, derived document, process count, platform and flags
//! - [`SuiteRegistry`]: leaf and composite suites, looked up by identifier
//! - [`Family`]: Cartesian-product case generation over named axes
//! - [`TemplateSource`]: where base documents come from
//! - [`Sweep`]: convergence-study input generation
//!
//! # Example
//!
//! ```rust
//! use rtm_document::{Document, Element};
//! use rtm_registry::{register_case, Flags, Platform, SuiteRegistry};
//!
//! let doc = Document::new(Element::new("Uintah_specification"));
//! let case = register_case("smoke", doc, 1, Platform::All, Flags::new()).unwrap();
//!
//! let mut registry = SuiteRegistry::new();
//! registry.define_suite("SMOKETEST", vec![case]).unwrap();
//! registry.define_composite("ALL", ["SMOKETEST", "SMOKETEST"]).unwrap();
//! registry.validate().unwrap();
//!
//! assert_eq!(registry.suite("ALL").unwrap().len(), 2);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod catalog;
mod case;
mod config;
mod error;
mod family;
mod registry;
mod sweep;
mod templates;

// Re-exports
pub use case::{register_case, CaseSummary, Flags, Platform, TestCase};
pub use config::{ManifestConfig, CONFIG_FILE, INPUTS_DIR_ENV, SUITE_ENV};
pub use error::{CatalogError, ConfigError, RegistryError, TemplateError};
pub use family::{
    Axis, Combination, Dim, Family, FamilyCases, Fci, FciSet, Frequency, Refinement, Scheme, Var,
    EXACT_COMPARISON, MPI_PROCESSES,
};
pub use registry::{SuiteDefinition, SuiteRegistry, SuiteView};
pub use sweep::{Sweep, SweepKind, SweepPoint};
pub use templates::{TemplateDir, TemplateMap, TemplateSource};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
