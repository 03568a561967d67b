//! Suite registry
//!
//! Provides [`SuiteRegistry`], an explicit identifier → definition map.
//! Leaf suites own their cases; composite suites name other suites and are
//! flattened by concatenation when looked up.

use indexmap::IndexMap;

use crate::case::TestCase;
use crate::error::RegistryError;

/// How a suite is defined
#[derive(Debug, Clone, PartialEq)]
pub enum SuiteDefinition {
    /// Suite owns its cases
    Cases(Vec<TestCase>),
    /// Suite is the concatenation of other suites, in order
    Concat(Vec<String>),
}

impl SuiteDefinition {
    /// Cases owned directly by this definition
    #[inline]
    #[must_use]
    pub fn cases(&self) -> &[TestCase] {
        match self {
            Self::Cases(cases) => cases,
            Self::Concat(_) => &[],
        }
    }
}

/// Flattened, ordered view of a suite's cases
#[derive(Debug, Clone)]
pub struct SuiteView<'a> {
    name: String,
    cases: Vec<&'a TestCase>,
}

impl<'a> SuiteView<'a> {
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, cases: Vec<&'a TestCase>) -> Self {
        Self {
            name: name.into(),
            cases,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn cases(&self) -> &[&'a TestCase] {
        &self.cases
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a TestCase> + '_ {
        self.cases.iter().copied()
    }

    /// Case names in order
    #[must_use]
    pub fn case_names(&self) -> Vec<&'a str> {
        self.cases.iter().map(|c| c.name()).collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Concatenate two views; `self` first, duplicates kept
    #[must_use]
    pub fn concat(mut self, other: SuiteView<'a>) -> Self {
        self.name = format!("{}+{}", self.name, other.name);
        self.cases.extend(other.cases);
        self
    }

    /// Fingerprint over every case in order
    #[must_use]
    pub fn fingerprint(&self) -> rtm_document::Fingerprint {
        let mut builder = rtm_document::FingerprintBuilder::new();
        for case in &self.cases {
            builder.update(case.fingerprint().as_bytes());
        }
        builder.finish()
    }
}

/// Registry of named suites in definition order
#[derive(Debug, Default, Clone)]
pub struct SuiteRegistry {
    suites: IndexMap<String, SuiteDefinition>,
}

impl SuiteRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a leaf suite owning `cases`
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateSuite`] if the name is taken.
    pub fn define_suite(
        &mut self,
        name: impl Into<String>,
        cases: Vec<TestCase>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        tracing::debug!(suite = %name, cases = cases.len(), "defining suite");
        self.insert(name, SuiteDefinition::Cases(cases))
    }

    /// Define a composite suite as the concatenation of `parts`
    ///
    /// Parts are not resolved here; call [`validate`](Self::validate) once
    /// every suite is defined.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateSuite`] if the name is taken.
    pub fn define_composite<I, S>(&mut self, name: impl Into<String>, parts: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let parts: Vec<String> = parts.into_iter().map(Into::into).collect();
        tracing::debug!(suite = %name, parts = parts.len(), "defining composite suite");
        self.insert(name, SuiteDefinition::Concat(parts))
    }

    fn insert(&mut self, name: String, definition: SuiteDefinition) -> Result<(), RegistryError> {
        if self.suites.contains_key(&name) {
            return Err(RegistryError::DuplicateSuite(name));
        }
        self.suites.insert(name, definition);
        Ok(())
    }

    /// Check that every composite resolves and none is cyclic
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownSuite`] for a dangling part,
    /// [`RegistryError::CyclicSuite`] for a cycle (reported as the path that
    /// closes it).
    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut done = Vec::new();
        for name in self.suites.keys() {
            let mut stack = Vec::new();
            self.visit(name, &mut stack, &mut done)?;
        }
        Ok(())
    }

    fn visit<'s>(
        &'s self,
        name: &'s str,
        stack: &mut Vec<&'s str>,
        done: &mut Vec<&'s str>,
    ) -> Result<(), RegistryError> {
        if done.contains(&name) {
            return Ok(());
        }
        if let Some(start) = stack.iter().position(|s| *s == name) {
            let mut cycle: Vec<String> = stack[start..].iter().map(ToString::to_string).collect();
            cycle.push(name.to_string());
            return Err(RegistryError::CyclicSuite { cycle });
        }
        let definition = self
            .suites
            .get(name)
            .ok_or_else(|| RegistryError::unknown_suite(name))?;

        if let SuiteDefinition::Concat(parts) = definition {
            stack.push(name);
            for part in parts {
                self.visit(part, stack, done)?;
            }
            stack.pop();
        }
        done.push(name);
        Ok(())
    }

    /// Look up a suite and flatten it
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownSuite`] if `name` (or any part) is undefined,
    /// [`RegistryError::CyclicSuite`] if the registry was never validated and
    /// the composition loops.
    pub fn suite(&self, name: &str) -> Result<SuiteView<'_>, RegistryError> {
        let mut cases = Vec::new();
        let mut stack = Vec::new();
        self.flatten(name, &mut stack, &mut cases)?;
        Ok(SuiteView::new(name, cases))
    }

    fn flatten<'s>(
        &'s self,
        name: &str,
        stack: &mut Vec<String>,
        out: &mut Vec<&'s TestCase>,
    ) -> Result<(), RegistryError> {
        if stack.iter().any(|s| s == name) {
            let mut cycle = stack.clone();
            cycle.push(name.to_string());
            return Err(RegistryError::CyclicSuite { cycle });
        }
        match self.suites.get(name) {
            None => Err(RegistryError::unknown_suite(name)),
            Some(SuiteDefinition::Cases(cases)) => {
                out.extend(cases.iter());
                Ok(())
            }
            Some(SuiteDefinition::Concat(parts)) => {
                stack.push(name.to_string());
                for part in parts {
                    self.flatten(part, stack, out)?;
                }
                stack.pop();
                Ok(())
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn definition(&self, name: &str) -> Option<&SuiteDefinition> {
        self.suites.get(name)
    }

    /// Check if suite exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.suites.contains_key(name)
    }

    /// Suite identifiers in definition order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.suites.keys().map(String::as_str).collect()
    }

    /// Every distinct leaf case, in definition order
    pub fn cases(&self) -> impl Iterator<Item = &TestCase> {
        self.suites.values().flat_map(SuiteDefinition::cases)
    }

    /// Get number of defined suites
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.suites.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }
}
