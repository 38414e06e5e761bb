//! Parsed container/package/content-document data (spec.md §4.D).
//!
//! Unlike the teacher's `ebook::epub` module — a lifetime-bound, lazily
//! borrowed read API meant to be held onto for the lifetime of an open
//! [`Epub`](https://docs.rs/rbook) — these types are plain owned data,
//! built once per validation run and then only ever read by the check
//! functions in [`checks`](crate::checks). There is no live view layer to
//! maintain because nothing here is ever edited or re-serialized.

pub mod collection;
pub mod container;
pub mod content_doc;
pub mod guide;
pub mod manifest;
pub mod metadata;
pub mod package;
pub mod spine;

pub use collection::Collection;
pub use container::ContainerDocument;
pub use content_doc::ContentDocument;
pub use guide::{Guide, GuideReference};
pub use manifest::{Manifest, ManifestItem};
pub use metadata::Metadata;
pub use package::PackageDocument;
pub use spine::{Spine, SpineItemRef};

/// Which EPUB version a package document declared, per its `version`
/// attribute (`OPF-001`). Content-model and metadata rules diverge
/// enough between the two (`<guide>` vs. the nav document, NCX vs.
/// EPUB 3 navigation, `dc:type` requirements) that most sub-checkers
/// branch on this directly.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EpubVersion {
    Epub2,
    Epub3,
}

impl EpubVersion {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "2.0" | "2.0.1" => Some(Self::Epub2),
            "3.0" | "3.0.1" | "3.1" | "3.2" | "3.3" => Some(Self::Epub3),
            _ => None,
        }
    }
}
