//! Document paths for addressing within input documents
//!
//! Provides [`DocPath`] for slash-separated addressing of elements and
//! attributes within a [`Document`](crate::Document).

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Marker separating an anchor segment from the tag of an element that
/// lives right after it.
const ELEM_MARKER: &str = ":elem:";

/// What the last step of a [`DocPath`] addresses
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Leaf {
    /// The element named by the last segment
    Element,

    /// An attribute of the element named by the last segment (`/a/b/@name`)
    Attribute(String),

    /// An element placed immediately after the anchor element named by the
    /// last segment (`/a/b/anchor:elem:tag`), possibly addressed further
    /// inside (`/a/b/anchor:elem:tag/c/@name`)
    After(Inserted),
}

/// Target of the `anchor:elem:` form
///
/// `tag` is the element living right after the anchor; `steps` and the
/// optional attribute are resolved inside it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Inserted {
    tag: String,
    steps: Vec<String>,
    attribute: Option<String>,
}

impl Inserted {
    #[inline]
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            steps: Vec::new(),
            attribute: None,
        }
    }

    /// Descend one more element below the inserted one
    #[inline]
    #[must_use]
    pub fn step(mut self, segment: impl Into<String>) -> Self {
        self.steps.push(segment.into());
        self
    }

    /// Address an attribute of the innermost element
    #[inline]
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>) -> Self {
        self.attribute = Some(name.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    #[inline]
    #[must_use]
    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    /// Tag followed by the inner steps
    pub fn chain(&self) -> impl Iterator<Item = &str> + '_ {
        std::iter::once(self.tag.as_str()).chain(self.steps.iter().map(String::as_str))
    }
}

impl From<&str> for Inserted {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for Inserted {
    fn from(tag: String) -> Self {
        Self::new(tag)
    }
}

impl Display for Inserted {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)?;
        for step in &self.steps {
            write!(f, "/{step}")?;
        }
        match &self.attribute {
            Some(name) => write!(f, "/@{name}"),
            None => Ok(()),
        }
    }
}

/// Absolute path within a document tree
///
/// The first segment names the root element. Each following segment selects
/// the first child with that tag.
///
/// # Examples
/// - `/Uintah_specification/Time/maxTime` → element
/// - `/Uintah_specification/DataArchiver/checkpoint/@timestepInterval` → attribute
/// - `/Uintah_specification/Time/initTime:elem:max_Timesteps` → element after `initTime`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocPath {
    segments: Vec<String>,
    leaf: Leaf,
}

impl DocPath {
    /// Create an element path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self {
            segments,
            leaf: Leaf::Element,
        }
    }

    /// Address an attribute of the element at this path
    #[inline]
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.leaf = Leaf::Attribute(name.into());
        self
    }

    /// Address an element placed right after the element at this path
    #[inline]
    #[must_use]
    pub fn after(mut self, inserted: impl Into<Inserted>) -> Self {
        self.leaf = Leaf::After(inserted.into());
        self
    }

    /// Element segments from the root
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Leaf addressing mode
    #[inline]
    #[must_use]
    pub fn leaf(&self) -> &Leaf {
        &self.leaf
    }

    /// Number of element segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if path has no segments
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Element path of the parent (drops the last segment and the leaf)
    ///
    /// `None` for the root, which has no parent.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        match self.segments.len() {
            0 | 1 => None,
            n => Some(Self::new(self.segments[..n - 1].to_vec())),
        }
    }

    /// Last element segment
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Element path extended by one segment
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self::new(segments)
    }
}

impl Display for DocPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))?;
        match &self.leaf {
            Leaf::Element => Ok(()),
            Leaf::Attribute(name) => write!(f, "/@{name}"),
            Leaf::After(inserted) => write!(f, "{ELEM_MARKER}{inserted}"),
        }
    }
}

impl FromStr for DocPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let body = s
            .strip_prefix('/')
            .ok_or_else(|| PathError::NotAbsolute(s.to_string()))?;

        let (body, after) = match body.split_once(ELEM_MARKER) {
            Some((anchor, tail)) => (anchor, Some(parse_inserted(s, tail)?)),
            None => (body, None),
        };

        let raw: Vec<&str> = body.split('/').collect();
        let mut segments = Vec::with_capacity(raw.len());
        let mut attribute = None;

        for (index, seg) in raw.iter().enumerate() {
            if let Some(name) = seg.strip_prefix('@') {
                if index + 1 != raw.len() || after.is_some() {
                    return Err(PathError::MisplacedAttribute(s.to_string()));
                }
                validate_segment(name)?;
                attribute = Some(name.to_string());
            } else {
                validate_segment(seg)?;
                segments.push((*seg).to_string());
            }
        }

        if segments.is_empty() {
            return Err(PathError::EmptySegment);
        }

        let path = Self::new(segments);
        Ok(match (attribute, after) {
            (Some(name), _) => path.attribute(name),
            (None, Some(inserted)) => path.after(inserted),
            (None, None) => path,
        })
    }
}

/// Parse the part after `:elem:`: `tag[/seg...][/@attr]`
fn parse_inserted(full: &str, tail: &str) -> Result<Inserted, PathError> {
    let mut parts = tail.split('/');
    let tag = parts.next().unwrap_or_default();
    validate_segment(tag)?;

    let mut inserted = Inserted::new(tag);
    let mut parts = parts.peekable();
    while let Some(seg) = parts.next() {
        if let Some(name) = seg.strip_prefix('@') {
            if parts.peek().is_some() {
                return Err(PathError::MisplacedAttribute(full.to_string()));
            }
            validate_segment(name)?;
            inserted = inserted.with_attribute(name);
        } else {
            validate_segment(seg)?;
            inserted = inserted.step(seg);
        }
    }
    Ok(inserted)
}

fn validate_segment(seg: &str) -> Result<(), PathError> {
    if seg.is_empty() {
        Err(PathError::EmptySegment)
    } else if seg.contains(|c: char| !c.is_ascii_alphanumeric() && !matches!(c, '_' | '-' | '.')) {
        Err(PathError::InvalidSegment(seg.to_string()))
    } else {
        Ok(())
    }
}

/// Errors related to document paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Path does not start at the root
    #[error("path must start with '/': {0}")]
    NotAbsolute(String),

    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Invalid segment characters
    #[error("invalid segment: {0} (must be alphanumeric, '_', '-' or '.')")]
    InvalidSegment(String),

    /// Attribute step that is not the final step
    #[error("attribute must be the last step: {0}")]
    MisplacedAttribute(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_element_path() {
        let path: DocPath = "/Uintah_specification/Time/maxTime".parse().unwrap();
        assert_eq!(path.segments(), &["Uintah_specification", "Time", "maxTime"]);
        assert_eq!(path.leaf(), &Leaf::Element);
    }

    #[test]
    fn parse_attribute_path() {
        let path: DocPath = "/U/DataArchiver/checkpoint/@timestepInterval".parse().unwrap();
        assert_eq!(path.segments(), &["U", "DataArchiver", "checkpoint"]);
        assert_eq!(path.leaf(), &Leaf::Attribute("timestepInterval".into()));
    }

    #[test]
    fn parse_elem_form() {
        let path: DocPath = "/U/Time/initTime:elem:max_Timesteps".parse().unwrap();
        assert_eq!(path.segments(), &["U", "Time", "initTime"]);
        assert_eq!(path.leaf(), &Leaf::After("max_Timesteps".into()));
    }

    #[test]
    fn display_round_trips() {
        for text in [
            "/a/b/c",
            "/a/b/@x",
            "/a/b:elem:c",
            "/a/b:elem:c/d/e",
            "/a/b:elem:c/d/@x",
        ] {
            let path: DocPath = text.parse().unwrap();
            assert_eq!(path.to_string(), text);
        }
    }

    #[test]
    fn parse_elem_form_with_inner_steps() {
        let path: DocPath = "/U/Time/initTime:elem:Limits/max_Timesteps".parse().unwrap();
        assert_eq!(path.segments(), &["U", "Time", "initTime"]);
        let Leaf::After(inserted) = path.leaf() else {
            panic!("expected elem form, got {:?}", path.leaf());
        };
        assert_eq!(inserted.tag(), "Limits");
        assert_eq!(inserted.steps(), &["max_Timesteps"]);
        assert_eq!(inserted.attribute(), None);
        assert_eq!(inserted.chain().collect::<Vec<_>>(), ["Limits", "max_Timesteps"]);

        let path: DocPath = "/U/Time/initTime:elem:Limits/@kind".parse().unwrap();
        let Leaf::After(inserted) = path.leaf() else {
            panic!("expected elem form");
        };
        assert!(inserted.steps().is_empty());
        assert_eq!(inserted.attribute(), Some("kind"));
    }

    #[test]
    fn elem_form_tail_is_validated() {
        assert!(matches!(
            "/U/a:elem:b/@x/c".parse::<DocPath>(),
            Err(PathError::MisplacedAttribute(_))
        ));
        assert!(matches!("/U/a:elem:b//c".parse::<DocPath>(), Err(PathError::EmptySegment)));
        assert!(matches!("/U/a:elem:".parse::<DocPath>(), Err(PathError::EmptySegment)));
        assert!(matches!(
            "/U/a:elem:b:elem:c".parse::<DocPath>(),
            Err(PathError::InvalidSegment(_))
        ));
    }

    #[test]
    fn relative_path_rejected() {
        let result: Result<DocPath, _> = "a/b".parse();
        assert!(matches!(result, Err(PathError::NotAbsolute(_))));
    }

    #[test]
    fn empty_segment_rejected() {
        assert!(matches!("/a//b".parse::<DocPath>(), Err(PathError::EmptySegment)));
        assert!(matches!("/".parse::<DocPath>(), Err(PathError::EmptySegment)));
    }

    #[test]
    fn attribute_must_be_last() {
        let result: Result<DocPath, _> = "/a/@x/b".parse();
        assert!(matches!(result, Err(PathError::MisplacedAttribute(_))));
    }

    #[test]
    fn invalid_chars_rejected() {
        let result: Result<DocPath, _> = "/a/b c".parse();
        assert!(matches!(result, Err(PathError::InvalidSegment(_))));
    }

    #[test]
    fn parent_and_child() {
        let path: DocPath = "/a/b/@x".parse().unwrap();
        let parent = path.parent().unwrap();
        assert_eq!(parent.to_string(), "/a");
        assert_eq!(parent.child("z").to_string(), "/a/z");
        assert_eq!(path.last(), Some("b"));
        assert_eq!("/a".parse::<DocPath>().unwrap().parent(), None);
    }
}
