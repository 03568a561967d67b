//! RTM Document System
//!
//! Structured input documents with path-addressed patch operations.
//!
//! # Core Concepts
//!
//! - [`Document`]: ordered tree of [`Element`]s read from and written to XML
//! - [`DocPath`]: slash-separated addressing of elements and attributes
//! - [`PatchOp`]: delete / update / append edits, applied in order by [`apply`]
//! - [`Fingerprint`]: Blake3 digest for reproducibility checks
//!
//! # Example
//!
//! ```rust
//! use rtm_document::{apply, Document, PatchOp};
//!
//! let base = Document::parse_xml("<Time><maxTime>10</maxTime></Time>").unwrap();
//! let derived = apply(&base, &[PatchOp::update("/Time/maxTime".parse().unwrap(), "100")]).unwrap();
//!
//! assert_eq!(derived.value_at("/Time/maxTime"), Some("100"));
//! assert_eq!(base.value_at("/Time/maxTime"), Some("10"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod document;
mod fingerprint;
mod patch;
mod path;

// Re-exports
pub use document::{Declaration, Document, DocumentError, Element, Node};
pub use fingerprint::{Fingerprint, FingerprintBuilder, FingerprintError};
pub use patch::{apply, PatchError, PatchList, PatchOp};
pub use path::{DocPath, Inserted, Leaf, PathError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn parse_patch_render() {
        let base = Document::parse_xml(
            "<U><Time><maxTime>10</maxTime><initTime>0.</initTime></Time></U>",
        )
        .unwrap();
        let patches = PatchList::new()
            .update("/U/Time/maxTime".parse().unwrap(), "100")
            .append("/U/Time/initTime:elem:max_Timesteps".parse().unwrap(), "2001");

        let derived = patches.apply(&base).unwrap();
        let xml = derived.to_xml();
        assert!(xml.contains("<maxTime>100</maxTime>"));
        assert!(xml.contains("<initTime>0.</initTime>\n    <max_Timesteps>2001</max_Timesteps>"));
        assert_ne!(Fingerprint::of_document(&base), Fingerprint::of_document(&derived));
    }
}
