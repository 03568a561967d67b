//! Patch operations for deriving documents from templates
//!
//! Provides [`PatchOp`] and [`apply`] for path-addressed edits on a
//! [`Document`]. A patch list is applied in order on a private copy of the
//! base document; the base is never touched.

use std::fmt::{self, Display, Formatter};

use crate::document::{Document, Element};
use crate::path::{DocPath, Inserted, Leaf, PathError};

/// Path-addressed edit on a document
///
/// Values are stored verbatim; numbers are not reformatted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatchOp {
    /// Remove the addressed attribute, or every element sharing the final
    /// tag under the resolved parent
    ///
    /// A missing target is a no-op, so deleting twice equals deleting once.
    Delete(DocPath),

    /// Set the text or attribute value at the path
    ///
    /// Fails if the target cannot be resolved. The `anchor:elem:tag` form
    /// only requires the anchor: `tag` is created right after it if absent,
    /// along with any inner steps and attribute.
    Update(DocPath, String),

    /// Add a new element or attribute at the path
    ///
    /// Never fails on a missing target; the parent chain is created. The
    /// `anchor:elem:tag` form always inserts a fresh `tag` subtree.
    Append(DocPath, Option<String>),
}

impl PatchOp {
    /// Update shorthand
    #[inline]
    #[must_use]
    pub fn update(path: DocPath, value: impl Into<String>) -> Self {
        Self::Update(path, value.into())
    }

    /// Append shorthand
    #[inline]
    #[must_use]
    pub fn append(path: DocPath, value: impl Into<String>) -> Self {
        Self::Append(path, Some(value.into()))
    }

    /// Target path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &DocPath {
        match self {
            Self::Delete(path) | Self::Update(path, _) | Self::Append(path, _) => path,
        }
    }

    /// Operation kind as used in the directive form
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Delete(_) => "delete",
            Self::Update(..) => "update",
            Self::Append(..) => "append",
        }
    }

    /// Parse the directive form used by the test tables
    ///
    /// `kind` is one of `delete`, `update`, `append`. `text` is
    /// `path[: value]`; the path may use the `anchor:elem:tag` form and the
    /// value is trimmed.
    ///
    /// # Examples
    /// ```
    /// # use rtm_document::PatchOp;
    /// let op = PatchOp::from_directive("update", "/U/Time/maxTime: 100 ").unwrap();
    /// assert_eq!(op.to_string(), "update /U/Time/maxTime: 100");
    /// ```
    ///
    /// # Errors
    /// Returns error on unknown kinds, bad paths or a missing update value
    pub fn from_directive(kind: &str, text: &str) -> Result<Self, PatchError> {
        let (path_text, value) = split_directive(text);
        let path: DocPath = path_text.parse()?;

        match kind.trim() {
            "delete" => match value {
                None => Ok(Self::Delete(path)),
                Some(_) => Err(PatchError::invalid_directive(text, "delete takes no value")),
            },
            "update" => value
                .map(|v| Self::Update(path, v))
                .ok_or_else(|| PatchError::invalid_directive(text, "update requires a value")),
            "append" => Ok(Self::Append(path, value)),
            other => Err(PatchError::invalid_directive(
                text,
                format!("unknown operation '{other}'"),
            )),
        }
    }
}

impl Display for PatchOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete(path) | Self::Append(path, None) => write!(f, "{} {path}", self.kind()),
            Self::Update(path, value) | Self::Append(path, Some(value)) => {
                write!(f, "{} {path}: {value}", self.kind())
            }
        }
    }
}

/// Split `path[: value]`, honouring the `anchor:elem:tag` form
fn split_directive(text: &str) -> (&str, Option<String>) {
    let text = text.trim();
    let search_from = text.find(":elem:").map_or(0, |i| i + ":elem:".len());
    match text[search_from..].find(':') {
        Some(offset) => {
            let split = search_from + offset;
            let value = text[split + 1..].trim();
            (&text[..split], Some(value.to_string()))
        }
        None => (text, None),
    }
}

/// Ordered list of patch operations
///
/// Order is significant: later operations observe the effects of earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchList {
    ops: Vec<PatchOp>,
}

impl PatchList {
    /// Create empty list
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Add an operation
    #[inline]
    #[must_use]
    pub fn push(mut self, op: PatchOp) -> Self {
        self.ops.push(op);
        self
    }

    /// Add an update
    #[inline]
    #[must_use]
    pub fn update(self, path: DocPath, value: impl Into<String>) -> Self {
        self.push(PatchOp::update(path, value))
    }

    /// Add a delete
    #[inline]
    #[must_use]
    pub fn delete(self, path: DocPath) -> Self {
        self.push(PatchOp::Delete(path))
    }

    /// Add an append
    #[inline]
    #[must_use]
    pub fn append(self, path: DocPath, value: impl Into<String>) -> Self {
        self.push(PatchOp::append(path, value))
    }

    /// Add an operation in directive form
    ///
    /// # Errors
    /// Returns error if the directive cannot be parsed
    pub fn directive(self, kind: &str, text: &str) -> Result<Self, PatchError> {
        Ok(self.push(PatchOp::from_directive(kind, text)?))
    }

    /// Build a list from `(kind, text)` directive pairs
    ///
    /// # Errors
    /// Returns error on the first directive that cannot be parsed
    pub fn from_directives<'a, I>(directives: I) -> Result<Self, PatchError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        directives
            .into_iter()
            .try_fold(Self::new(), |list, (kind, text)| list.directive(kind, text))
    }

    #[inline]
    #[must_use]
    pub fn ops(&self) -> &[PatchOp] {
        &self.ops
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply to a base document
    ///
    /// # Errors
    /// See [`apply`]
    pub fn apply(&self, base: &Document) -> Result<Document, PatchError> {
        apply(base, &self.ops)
    }
}

impl FromIterator<PatchOp> for PatchList {
    fn from_iter<I: IntoIterator<Item = PatchOp>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<PatchOp>> for PatchList {
    fn from(ops: Vec<PatchOp>) -> Self {
        Self { ops }
    }
}

impl Document {
    /// Derive a patched copy of this document
    ///
    /// # Errors
    /// See [`apply`]
    #[inline]
    pub fn patched(&self, patches: &[PatchOp]) -> Result<Document, PatchError> {
        apply(self, patches)
    }
}

/// Apply a patch list to a copy of `base`
///
/// All-or-nothing: the first failing operation aborts and no document is
/// returned.
///
/// # Errors
/// - [`PatchError::PathNotFound`] if an `Update` target cannot be resolved
/// - [`PatchError::RootMismatch`] if an `Append` names a different root
pub fn apply(base: &Document, patches: &[PatchOp]) -> Result<Document, PatchError> {
    let mut working = base.clone();
    for op in patches {
        apply_one(&mut working, op)?;
    }
    tracing::trace!(ops = patches.len(), root = base.root().tag(), "applied patch list");
    Ok(working)
}

fn apply_one(doc: &mut Document, op: &PatchOp) -> Result<(), PatchError> {
    match op {
        PatchOp::Delete(path) => {
            delete(doc, path);
            Ok(())
        }
        PatchOp::Update(path, value) => update(doc, path, value),
        PatchOp::Append(path, value) => append(doc, path, value.as_deref()),
    }
}

fn delete(doc: &mut Document, path: &DocPath) {
    match path.leaf() {
        Leaf::Element => {
            // The root itself cannot be deleted.
            let (Some(parent), Some(tag)) = (path.parent(), path.last()) else {
                return;
            };
            if let Some(parent) = doc.element_mut(parent.segments()) {
                parent.remove_children(tag);
            }
        }
        Leaf::Attribute(name) => {
            if let Some(element) = doc.element_mut(path.segments()) {
                element.remove_attribute(name);
            }
        }
        Leaf::After(inserted) => {
            if let Some((parent, _)) = anchor_parent_mut(doc, path) {
                delete_inserted(parent, inserted);
            }
        }
    }
}

fn delete_inserted(parent: &mut Element, inserted: &Inserted) {
    let chain: Vec<&str> = inserted.chain().collect();
    match inserted.attribute() {
        Some(name) => {
            if let Some(element) = descend_mut(parent, &chain) {
                element.remove_attribute(name);
            }
        }
        None => {
            let Some((last, leading)) = chain.split_last() else {
                return;
            };
            if let Some(owner) = descend_mut(parent, leading) {
                owner.remove_children(last);
            }
        }
    }
}

fn update(doc: &mut Document, path: &DocPath, value: &str) -> Result<(), PatchError> {
    let not_found = || PatchError::PathNotFound { path: path.clone() };
    match path.leaf() {
        Leaf::Element => {
            let element = doc.element_mut(path.segments()).ok_or_else(not_found)?;
            element.set_text(value);
        }
        Leaf::Attribute(name) => {
            let element = doc.element_mut(path.segments()).ok_or_else(not_found)?;
            if element.attribute(name).is_none() {
                return Err(not_found());
            }
            element.set_attribute(name.as_str(), value);
        }
        Leaf::After(inserted) => {
            let (parent, anchor) = anchor_parent_mut(doc, path).ok_or_else(not_found)?;
            if parent.position(inserted.tag()).is_none() {
                let index = parent.position(&anchor).ok_or_else(not_found)?;
                parent.insert_child(index + 1, Element::new(inserted.tag()));
            }
            let element = parent.child_mut(inserted.tag()).ok_or_else(not_found)?;
            let target = inserted
                .steps()
                .iter()
                .fold(element, |current, seg| current.child_or_insert(seg));
            match inserted.attribute() {
                Some(name) => target.set_attribute(name, value),
                None => target.set_text(value),
            }
        }
    }
    Ok(())
}

fn append(doc: &mut Document, path: &DocPath, value: Option<&str>) -> Result<(), PatchError> {
    match path.leaf() {
        Leaf::Element => {
            let parent = path.parent().ok_or_else(|| root_mismatch(doc, path))?;
            let tag = path.last().unwrap_or_default();
            ensure_element(doc, &parent)?.push_child(with_value(Element::new(tag), value));
        }
        Leaf::Attribute(name) => {
            ensure_element(doc, path)?.set_attribute(name.as_str(), value.unwrap_or_default());
        }
        Leaf::After(inserted) => {
            let anchor_path = DocPath::new(path.segments().to_vec());
            let parent_path = anchor_path.parent().ok_or_else(|| root_mismatch(doc, path))?;
            let anchor = anchor_path.last().unwrap_or_default().to_string();
            let parent = ensure_element(doc, &parent_path)?;
            let index = parent
                .position(&anchor)
                .map_or(parent.children().len(), |i| i + 1);
            parent.insert_child(index, inserted_subtree(inserted, value));
        }
    }
    Ok(())
}

/// Fresh `tag` element holding the inner steps, with the value at the end
fn inserted_subtree(inserted: &Inserted, value: Option<&str>) -> Element {
    let mut element = Element::new(inserted.tag());
    let target = inserted
        .steps()
        .iter()
        .fold(&mut element, |current, seg| current.child_or_insert(seg));
    match inserted.attribute() {
        Some(name) => target.set_attribute(name, value.unwrap_or_default()),
        None => {
            if let Some(text) = value.filter(|t| !t.is_empty()) {
                target.set_text(text);
            }
        }
    }
    element
}

fn with_value(element: Element, value: Option<&str>) -> Element {
    match value {
        Some(text) if !text.is_empty() => element.with_text(text),
        _ => element,
    }
}

fn root_mismatch(doc: &Document, path: &DocPath) -> PatchError {
    PatchError::RootMismatch {
        path: path.clone(),
        root: doc.root().tag().to_string(),
    }
}

fn descend_mut<'a, S: AsRef<str>>(from: &'a mut Element, steps: &[S]) -> Option<&'a mut Element> {
    steps
        .iter()
        .try_fold(from, |current, seg| current.child_mut(seg.as_ref()))
}

/// Parent element of the anchor and the anchor tag, if the anchor exists
fn anchor_parent_mut<'a>(doc: &'a mut Document, path: &DocPath) -> Option<(&'a mut Element, String)> {
    doc.element(path.segments())?;
    let anchor = path.last()?.to_string();
    let parent = path.parent()?;
    doc.element_mut(parent.segments()).map(|p| (p, anchor))
}

/// Element at `path`, creating missing elements along the way
fn ensure_element<'a>(doc: &'a mut Document, path: &DocPath) -> Result<&'a mut Element, PatchError> {
    let (first, rest) = path
        .segments()
        .split_first()
        .ok_or_else(|| PatchError::PathNotFound { path: path.clone() })?;
    if first != doc.root().tag() {
        return Err(root_mismatch(doc, path));
    }
    Ok(rest
        .iter()
        .fold(doc.root_mut(), |current, seg| current.child_or_insert(seg)))
}

/// Errors raised while applying patches
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// Target of an update could not be resolved
    #[error("path not found: {path}")]
    PathNotFound { path: DocPath },

    /// Path names a root other than the document's
    #[error("path '{path}' does not start at document root '{root}'")]
    RootMismatch { path: DocPath, root: String },

    /// Directive text could not be interpreted
    #[error("invalid directive '{directive}': {reason}")]
    InvalidDirective { directive: String, reason: String },

    /// Malformed path
    #[error("invalid path: {0}")]
    Path(#[from] PathError),
}

impl PatchError {
    fn invalid_directive(directive: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDirective {
            directive: directive.trim().to_string(),
            reason: reason.into(),
        }
    }
}
