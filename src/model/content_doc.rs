//! Parsed facts about one content document (spec.md §4.D, §4.J): an XHTML,
//! SVG, SMIL, NCX, or CSS resource reachable from the manifest.
//!
//! Every variant carries a [`DocumentFacts`] (its id table and outbound
//! references) so cross-reference resolution (spec.md §4.J) can walk all
//! content documents uniformly without matching on the variant; the
//! variant-specific fields are only consulted by that format's own checker
//! in [`checks`](crate::checks).

use crate::location::Position;

/// One outbound reference from a content document: a manifest href (or
/// remote URL) plus an optional fragment, anchored at the position of the
/// attribute that declared it.
#[derive(Clone, Debug)]
pub struct Reference {
    /// Resolved, percent-decoded target path relative to the archive root.
    /// Empty for a same-document fragment-only reference (`href="#x"`).
    pub target_path: String,
    pub fragment: Option<String>,
    pub position: Position,
    pub remote: bool,
}

/// The id table and outbound references shared by every content-document
/// kind, used by [`checks::xref`](crate::checks::xref).
#[derive(Clone, Debug, Default)]
pub struct DocumentFacts {
    pub ids: Vec<(String, Position)>,
    pub references: Vec<Reference>,
}

impl DocumentFacts {
    pub fn has_id(&self, id: &str) -> bool {
        self.ids.iter().any(|(existing, _)| existing == id)
    }

    /// Ids that appear more than once (`HTM-014`/`NCX-004`).
    pub fn duplicate_ids(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut duplicates = Vec::new();
        for (id, _) in &self.ids {
            if !seen.insert(id.as_str()) {
                duplicates.push(id.as_str());
            }
        }
        duplicates
    }
}

#[derive(Clone, Debug, Default)]
pub struct XhtmlDocument {
    pub facts: DocumentFacts,
    pub doctype: Option<String>,
    pub lang: Option<String>,
    pub xml_lang: Option<String>,
    /// Raw `content` attribute of `<meta name="viewport">`, for
    /// [`viewport`](crate::viewport) to parse (`HTM-013`).
    pub viewport_content: Option<String>,
    pub uses_scripted_content: bool,
    pub uses_inline_svg: bool,
    pub uses_mathml: bool,
    /// `epub:switch` elements with a `<case>` appearing after `<default>`.
    pub switch_violations: Vec<Position>,
    /// Positions of `<img>` elements with no `alt` attribute at all
    /// (`alt=""` is a deliberate decorative-image marker and is not
    /// collected here).
    pub images_missing_alt: Vec<Position>,
}

#[derive(Clone, Debug, Default)]
pub struct SvgDocument {
    pub facts: DocumentFacts,
    pub has_view_box: bool,
}

/// One `<par>`/`<seq>` audio-clip pairing in a SMIL media overlay document.
#[derive(Clone, Debug)]
pub struct SmilClip {
    pub text_src_fragment: Option<String>,
    pub clip_begin: Option<String>,
    pub clip_end: Option<String>,
    pub position: Position,
}

#[derive(Clone, Debug, Default)]
pub struct SmilDocument {
    pub facts: DocumentFacts,
    pub clips: Vec<SmilClip>,
}

#[derive(Clone, Debug)]
pub struct NavPoint {
    pub id: Option<String>,
    pub play_order: Option<String>,
    pub text: String,
    pub depth: u32,
    pub position: Position,
}

#[derive(Clone, Debug, Default)]
pub struct NcxDocument {
    pub facts: DocumentFacts,
    pub dtb_uid: Option<String>,
    pub dtb_depth: Option<String>,
    pub nav_points: Vec<NavPoint>,
}

#[derive(Clone, Debug, Default)]
pub struct CssDocument {
    pub facts: DocumentFacts,
    pub charset: Option<String>,
    pub imports: Vec<Position>,
    pub font_faces: Vec<Position>,
    pub fixed_positions: Vec<Position>,
    pub parse_errors: Vec<(String, Position)>,
    /// Raw selector text preceding each rule's `{`, used only to check
    /// whether a well-known class name (e.g. a media-overlay active-class)
    /// is mentioned anywhere (`CSS-029`); never matched against elements.
    pub selectors: Vec<String>,
}

#[derive(Clone, Debug)]
pub enum ContentDocument {
    Xhtml(XhtmlDocument),
    Svg(SvgDocument),
    Smil(SmilDocument),
    Ncx(NcxDocument),
    Css(CssDocument),
}

impl ContentDocument {
    pub fn facts(&self) -> &DocumentFacts {
        match self {
            Self::Xhtml(doc) => &doc.facts,
            Self::Svg(doc) => &doc.facts,
            Self::Smil(doc) => &doc.facts,
            Self::Ncx(doc) => &doc.facts,
            Self::Css(doc) => &doc.facts,
        }
    }
}
