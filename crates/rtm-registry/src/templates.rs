//! Base template sources
//!
//! Provides the [`TemplateSource`] trait through which catalogs obtain base
//! documents, and [`TemplateDir`], which reads them from an inputs directory
//! and caches each parsed document.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rtm_document::Document;

use crate::error::TemplateError;

/// Something that can hand out parsed base templates
pub trait TemplateSource {
    /// Load the template at `relative`
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if the template is missing or malformed.
    fn load(&self, relative: &Path) -> Result<Arc<Document>, TemplateError>;
}

impl<T: TemplateSource + ?Sized> TemplateSource for &T {
    fn load(&self, relative: &Path) -> Result<Arc<Document>, TemplateError> {
        (**self).load(relative)
    }
}

/// Templates read from a directory, parsed once per relative path
#[derive(Debug)]
pub struct TemplateDir {
    root: PathBuf,
    cache: Mutex<HashMap<PathBuf, Arc<Document>>>,
}

impl TemplateDir {
    /// Create source rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of parsed templates held
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }

    fn read(&self, relative: &Path) -> Result<Document, TemplateError> {
        let path = self.root.join(relative);
        let text = std::fs::read_to_string(&path).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "template unreadable");
            TemplateError::io_error(&path, e)
        })?;
        Document::parse_xml(&text).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "template malformed");
            TemplateError::parse_error(&path, e)
        })
    }
}

impl TemplateSource for TemplateDir {
    fn load(&self, relative: &Path) -> Result<Arc<Document>, TemplateError> {
        if let Some(doc) = self.cache.lock().get(relative) {
            return Ok(Arc::clone(doc));
        }

        // Parse outside the lock; a racing load of the same path keeps the first.
        let doc = Arc::new(self.read(relative)?);
        tracing::trace!(path = %relative.display(), "template cached");
        let mut cache = self.cache.lock();
        Ok(Arc::clone(
            cache.entry(relative.to_path_buf()).or_insert(doc),
        ))
    }
}

/// In-memory templates keyed by relative path
#[derive(Debug, Default, Clone)]
pub struct TemplateMap {
    templates: HashMap<PathBuf, Arc<Document>>,
}

impl TemplateMap {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parsed template
    #[must_use]
    pub fn with(mut self, relative: impl Into<PathBuf>, document: Document) -> Self {
        self.insert(relative, document);
        self
    }

    pub fn insert(&mut self, relative: impl Into<PathBuf>, document: Document) {
        self.templates.insert(relative.into(), Arc::new(document));
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateSource for TemplateMap {
    fn load(&self, relative: &Path) -> Result<Arc<Document>, TemplateError> {
        self.templates
            .get(relative)
            .cloned()
            .ok_or_else(|| TemplateError::Missing(relative.to_path_buf()))
    }
}
