//! The package document's `<spine>` (spec.md §4.D, §4.F).

use crate::location::Position;
use crate::parser::xml::{XmlEventKind, XmlReader};
use crate::parser::ParserResult;
use crate::util::str::tokens;

/// One `<itemref>` in the spine.
#[derive(Clone, Debug)]
pub struct SpineItemRef {
    pub idref: String,
    /// Raw `linear` attribute value, unvalidated (`OPF-039b` checks this
    /// is exactly `"yes"` or `"no"`); `None` means the attribute was
    /// absent, which defaults to linear per the OPF schema.
    pub linear: Option<String>,
    pub properties: Vec<String>,
    pub position: Position,
}

impl SpineItemRef {
    /// Whether this itemref is in the primary linear reading order, per
    /// the OPF default (absent `linear` means `"yes"`). This does not
    /// validate `linear`'s value; malformed values are reported separately.
    pub fn is_linear(&self) -> bool {
        self.linear.as_deref() != Some("no")
    }
}

#[derive(Clone, Debug, Default)]
pub struct Spine {
    /// EPUB 2 `toc` attribute: the manifest id of the NCX document.
    pub toc: Option<String>,
    pub page_progression_direction: Option<String>,
    pub items: Vec<SpineItemRef>,
}

impl Spine {
    /// Parses the contents of a `<spine>` element up to (and consuming) its
    /// matching `</spine>`. The `<spine>` start tag's own attributes
    /// (`toc`, `page-progression-direction`) are read by the caller before
    /// this is called, since [`XmlReader::next`] has already yielded that
    /// event by the time a parser decides to descend into the section.
    pub(crate) fn parse_items(reader: &mut XmlReader<'_>, spine: &mut Spine) -> ParserResult<()> {
        while let Some(event) = reader.next() {
            let event = event?;
            match event.kind {
                XmlEventKind::Start(start) if start.local_name() == b"itemref" => {
                    spine.items.push(SpineItemRef {
                        idref: start.attribute("idref").unwrap_or_default(),
                        linear: start.attribute("linear"),
                        properties: start
                            .attribute("properties")
                            .map(|p| tokens(&p).map(str::to_owned).collect())
                            .unwrap_or_default(),
                        position: event.position,
                    });
                }
                XmlEventKind::End(name) if name == b"spine" => break,
                _ => {}
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpineItemRef> {
        self.items.iter()
    }
}
