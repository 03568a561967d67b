//! Content fingerprints for derived documents
//!
//! Provides [`Fingerprint`], a 32-byte Blake3 digest used to check that
//! regenerating test tables and sweeps yields byte-identical output.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::document::Document;

/// A 32-byte content fingerprint (Blake3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Create from raw bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Blake3 digest of arbitrary data
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self::new(*blake3::hash(data).as_bytes())
    }

    /// Digest of a document's rendered XML
    #[inline]
    #[must_use]
    pub fn of_document(document: &Document) -> Self {
        Self::compute(document.to_xml().as_bytes())
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Fingerprint {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let array: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| FingerprintError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(array))
    }
}

impl serde::Serialize for Fingerprint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Incremental fingerprint over several pieces of content
///
/// Each piece is length-prefixed so that `["ab", "c"]` and `["a", "bc"]`
/// produce different digests.
#[derive(Debug, Default, Clone)]
pub struct FingerprintBuilder {
    hasher: blake3::Hasher,
}

impl FingerprintBuilder {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one piece of content
    #[inline]
    pub fn update(&mut self, piece: &[u8]) -> &mut Self {
        self.hasher.update(&(piece.len() as u64).to_le_bytes());
        self.hasher.update(piece);
        self
    }

    /// Feed a string
    #[inline]
    pub fn update_str(&mut self, piece: &str) -> &mut Self {
        self.update(piece.as_bytes())
    }

    #[inline]
    #[must_use]
    pub fn finish(&self) -> Fingerprint {
        Fingerprint::new(*self.hasher.finalize().as_bytes())
    }
}

/// Errors parsing fingerprints
#[derive(Debug, thiserror::Error)]
pub enum FingerprintError {
    /// Wrong byte length
    #[error("invalid fingerprint length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Not hex
    #[error("invalid hex encoding: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Element;

    #[test]
    fn compute_is_deterministic() {
        assert_eq!(Fingerprint::compute(b"data"), Fingerprint::compute(b"data"));
        assert_ne!(Fingerprint::compute(b"data"), Fingerprint::compute(b"other"));
    }

    #[test]
    fn display_and_parse() {
        let fp = Fingerprint::compute(b"x");
        let text = fp.to_string();
        assert_eq!(text.len(), 64);
        assert_eq!(text.parse::<Fingerprint>().unwrap(), fp);
        assert_eq!(fp.short().len(), 16);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!(
            "abcd".parse::<Fingerprint>(),
            Err(FingerprintError::InvalidLength { actual: 2, .. })
        ));
        assert!(matches!("zz".parse::<Fingerprint>(), Err(FingerprintError::InvalidHex(_))));
    }

    #[test]
    fn builder_separates_pieces() {
        let a = FingerprintBuilder::new().update_str("ab").update_str("c").finish();
        let b = FingerprintBuilder::new().update_str("a").update_str("bc").finish();
        assert_ne!(a, b);
    }

    #[test]
    fn document_fingerprint_tracks_content() {
        let a = Document::new(Element::new("Time").with_child(Element::new("maxTime").with_text("10")));
        let b = Document::new(Element::new("Time").with_child(Element::new("maxTime").with_text("100")));
        assert_eq!(Fingerprint::of_document(&a), Fingerprint::of_document(&a.clone()));
        assert_ne!(Fingerprint::of_document(&a), Fingerprint::of_document(&b));
    }
}
