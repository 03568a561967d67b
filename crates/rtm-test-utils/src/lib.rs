//! Testing utilities for RTM workspace
//!
//! Shared fixtures: a minimal PhaseField input skeleton, a template source
//! that serves it for every path, and helpers to lay it out on disk.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rtm_document::Document;
use rtm_registry::{register_case, Flags, Platform, TemplateError, TemplateSource, TestCase};

/// Smallest input carrying every field the catalog patches
pub const PHASEFIELD_SKELETON: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Uintah_specification>
  <Meta>
    <title>skeleton</title>
  </Meta>
  <SimulationComponent type="phasefield"/>
  <Time>
    <maxTime>1.</maxTime>
    <initTime>0.</initTime>
    <delt_min>0.</delt_min>
    <delt_max>1.</delt_max>
  </Time>
  <DataArchiver>
    <filebase>skeleton.uda</filebase>
    <outputInterval>1.</outputInterval>
    <outputTimestepInterval>1</outputTimestepInterval>
    <checkpoint cycle="2" timestepInterval="1"/>
  </DataArchiver>
</Uintah_specification>
"#;

pub fn phasefield_skeleton() -> Document {
    Document::parse_xml(PHASEFIELD_SKELETON).unwrap()
}

/// Serves the skeleton for every path and records what was asked for
#[derive(Debug, Default)]
pub struct StubTemplates {
    requested: Mutex<Vec<PathBuf>>,
}

impl StubTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths requested so far, in order
    pub fn requested(&self) -> Vec<PathBuf> {
        self.requested.lock().clone()
    }
}

impl TemplateSource for StubTemplates {
    fn load(&self, relative: &Path) -> Result<Arc<Document>, TemplateError> {
        self.requested.lock().push(relative.to_path_buf());
        Ok(Arc::new(phasefield_skeleton()))
    }
}

/// Write the skeleton at each relative path under `root`
pub fn write_templates<'a>(root: &Path, relatives: impl IntoIterator<Item = &'a Path>) {
    for relative in relatives {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, PHASEFIELD_SKELETON).unwrap();
    }
}

/// Single-process case over the skeleton
pub fn create_case(name: &str) -> TestCase {
    register_case(name, phasefield_skeleton(), 1, Platform::All, Flags::new()).unwrap()
}

/// Names of a slice of cases
pub fn names<'a>(cases: impl IntoIterator<Item = &'a TestCase>) -> Vec<String> {
    cases.into_iter().map(|c| c.name().to_string()).collect()
}
