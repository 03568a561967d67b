//! Test case descriptors
//!
//! A [`TestCase`] is a named, fully-derived input document together with the
//! execution parameters an external runner needs: process count, platform
//! restriction and comparison flags.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use indexmap::IndexMap;
use rtm_document::{Document, Fingerprint};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Platforms a test case may be restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Platform {
    /// Runs everywhere
    #[default]
    All,
    Linux,
    Darwin,
}

impl Display for Platform {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::All => "All",
            Self::Linux => "Linux",
            Self::Darwin => "Darwin",
        };
        f.write_str(name)
    }
}

impl FromStr for Platform {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "All" => Ok(Self::All),
            "Linux" => Ok(Self::Linux),
            "Darwin" => Ok(Self::Darwin),
            other => Err(RegistryError::UnknownPlatform(other.to_string())),
        }
    }
}

/// Ordered set of runner flags, each with an optional value
///
/// Parsed from `name` or `name=value`. Re-adding a flag replaces its value
/// but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flags(IndexMap<String, Option<String>>);

impl Flags {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every entry as `name` or `name=value`
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidFlag`] for an entry with an empty or
    /// whitespace-bearing name.
    pub fn parse<I, S>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags = Self::new();
        for entry in entries {
            flags.insert_text(entry.as_ref())?;
        }
        Ok(flags)
    }

    /// Insert a flag without a value
    #[must_use]
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.0.insert(name.into(), None);
        self
    }

    /// Insert a flag with a value
    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), Some(value.into()));
        self
    }

    fn insert_text(&mut self, entry: &str) -> Result<(), RegistryError> {
        let entry = entry.trim();
        let (name, value) = match entry.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim().to_string())),
            None => (entry, None),
        };
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(RegistryError::InvalidFlag(entry.to_string()));
        }
        self.0.insert(name.to_string(), value);
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Value of a flag, `None` if absent or valueless
    #[inline]
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for Flags {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match value {
                Some(v) => write!(f, "{name}={v}")?,
                None => f.write_str(name)?,
            }
        }
        Ok(())
    }
}

/// A named, fully-parameterized scenario
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    name: String,
    document: Document,
    processes: u32,
    platform: Platform,
    flags: Flags,
}

impl TestCase {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Derived input document owned by this case
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    #[inline]
    #[must_use]
    pub fn processes(&self) -> u32 {
        self.processes
    }

    #[inline]
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    #[inline]
    #[must_use]
    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    /// Runs on more than one process
    #[inline]
    #[must_use]
    pub fn is_parallel(&self) -> bool {
        self.processes > 1
    }

    /// File name the runner expects for this case's input
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.ups", self.name)
    }

    /// Fingerprint over the descriptor and its rendered document
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let mut builder = rtm_document::FingerprintBuilder::new();
        builder
            .update_str(&self.name)
            .update(&self.processes.to_le_bytes())
            .update_str(&self.platform.to_string())
            .update_str(&self.flags.to_string())
            .update_str(&self.document.to_xml());
        builder.finish()
    }

    /// Manifest entry for the runner (no document body)
    #[must_use]
    pub fn summary(&self) -> CaseSummary {
        CaseSummary {
            name: self.name.clone(),
            input: self.file_name(),
            processes: self.processes,
            platform: self.platform,
            flags: self.flags.clone(),
        }
    }
}

/// Serializable view of a [`TestCase`] for listings and manifests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseSummary {
    pub name: String,
    pub input: String,
    pub processes: u32,
    pub platform: Platform,
    pub flags: Flags,
}

/// Build a test case descriptor
///
/// # Errors
///
/// [`RegistryError::InvalidProcessCount`] if `processes` is zero.
pub fn register_case(
    name: impl Into<String>,
    document: Document,
    processes: u32,
    platform: Platform,
    flags: Flags,
) -> Result<TestCase, RegistryError> {
    let name = name.into();
    if processes == 0 {
        return Err(RegistryError::InvalidProcessCount { name });
    }
    Ok(TestCase {
        name,
        document,
        processes,
        platform,
        flags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtm_document::Element;

    fn doc() -> Document {
        Document::new(Element::new("Uintah_specification"))
    }

    #[test]
    fn zero_processes_rejected() {
        let err = register_case("x", doc(), 0, Platform::All, Flags::new()).unwrap_err();
        assert_eq!(err, RegistryError::InvalidProcessCount { name: "x".into() });
    }

    #[test]
    fn case_accessors() {
        let flags = Flags::new().with("exactComparison");
        let case = register_case("heat_mpi", doc(), 4, Platform::Linux, flags).unwrap();
        assert_eq!(case.name(), "heat_mpi");
        assert_eq!(case.processes(), 4);
        assert!(case.is_parallel());
        assert_eq!(case.platform(), Platform::Linux);
        assert!(case.flags().contains("exactComparison"));
        assert_eq!(case.file_name(), "heat_mpi.ups");
    }

    #[test]
    fn flags_parse_name_and_value() {
        let flags = Flags::parse(["exactComparison", "abs_tolerance=1e-9 "]).unwrap();
        assert_eq!(flags.len(), 2);
        assert!(flags.contains("exactComparison"));
        assert_eq!(flags.value("exactComparison"), None);
        assert_eq!(flags.value("abs_tolerance"), Some("1e-9"));
        assert_eq!(flags.to_string(), "exactComparison,abs_tolerance=1e-9");
    }

    #[test]
    fn flags_reject_empty_name() {
        assert_eq!(
            Flags::parse(["=3"]).unwrap_err(),
            RegistryError::InvalidFlag("=3".into())
        );
        assert!(Flags::parse([""]).is_err());
    }

    #[test]
    fn platform_parse() {
        assert_eq!("Darwin".parse::<Platform>().unwrap(), Platform::Darwin);
        assert!("Windows".parse::<Platform>().is_err());
        assert_eq!(Platform::default().to_string(), "All");
    }

    #[test]
    fn fingerprint_covers_processes() {
        let a = register_case("a", doc(), 1, Platform::All, Flags::new()).unwrap();
        let b = register_case("a", doc(), 4, Platform::All, Flags::new()).unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
    }

    #[test]
    fn summary_json_shape() {
        let flags = Flags::new().with("exactComparison").with_value("abs_tolerance", "1e-9");
        let case = register_case("heat_mpi", doc(), 4, Platform::Linux, flags).unwrap();
        let json = serde_json::to_value(case.summary()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "heat_mpi",
                "input": "heat_mpi.ups",
                "processes": 4,
                "platform": "Linux",
                "flags": { "exactComparison": null, "abs_tolerance": "1e-9" },
            })
        );
        let back: CaseSummary = serde_json::from_value(json).unwrap();
        assert_eq!(back, case.summary());
    }
}
