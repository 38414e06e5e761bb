//! EPUB 3 `<collection>` elements (spec.md §4.D, `OPF-042`/`OPF-046`).

use crate::parser::xml::{XmlEventKind, XmlReader, XmlStartElement};
use crate::parser::ParserResult;

#[derive(Clone, Debug)]
pub struct Collection {
    pub role: String,
    /// `dc:type` elements nested directly under this collection's
    /// `<metadata>`, used by `OPF-046` (a `dictionary`-role collection must
    /// declare `dc:type="dictionary"`).
    pub dc_types: Vec<String>,
    pub links: Vec<String>,
    pub children: Vec<Collection>,
}

/// Roles with reserved meaning in EPUB 3.3; anything else triggers
/// `OPF-042`.
pub const RESERVED_ROLES: &[&str] = &[
    "index",
    "preview",
    "manuscript",
    "distributable",
    "virtual",
    "edition",
    "dictionary",
    "glossary",
    "annotations",
    "test-suite",
];

impl Collection {
    /// Parses one `<collection>` element, consuming everything up to (and
    /// including) its matching `</collection>`, recursing into any nested
    /// `<collection>` children (EPUB 3 allows collections to nest, e.g. a
    /// `manuscript` collection containing per-chapter sub-collections).
    pub(crate) fn parse(reader: &mut XmlReader<'_>, start: &XmlStartElement<'_>) -> ParserResult<Self> {
        let mut collection = Collection {
            role: start.attribute("role").unwrap_or_default(),
            dc_types: Vec::new(),
            links: Vec::new(),
            children: Vec::new(),
        };

        if start.is_self_closing() {
            return Ok(collection);
        }

        let mut in_metadata = false;
        while let Some(event) = reader.next() {
            let event = event?;
            match event.kind {
                XmlEventKind::Start(child) if child.local_name() == b"collection" => {
                    collection.children.push(Collection::parse(reader, &child)?);
                }
                XmlEventKind::Start(child) if child.local_name() == b"metadata" => {
                    in_metadata = !child.is_self_closing();
                }
                XmlEventKind::Start(child) if in_metadata && child.name() == b"dc:type" => {
                    collection.dc_types.push(reader.read_element_text(&child)?);
                }
                XmlEventKind::Start(child) if child.local_name() == b"link" => {
                    if let Some(href) = child.attribute("href") {
                        collection.links.push(href);
                    }
                }
                XmlEventKind::End(name) if name == b"metadata" => in_metadata = false,
                XmlEventKind::End(name) if name == b"collection" => break,
                _ => {}
            }
        }

        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_collections_and_dc_type() {
        let xml = br#"<collection role="dictionary">
            <metadata><dc:type>dictionary</dc:type></metadata>
            <link href="entries/a.xhtml"/>
            <collection role="index"><link href="index.xhtml"/></collection>
        </collection>"#;
        let mut reader = XmlReader::new(xml);
        let event = reader.next().unwrap().unwrap();
        let XmlEventKind::Start(start) = event.kind else { panic!("expected start") };

        let collection = Collection::parse(&mut reader, &start).unwrap();
        assert_eq!(collection.role, "dictionary");
        assert_eq!(collection.dc_types, vec!["dictionary".to_string()]);
        assert_eq!(collection.links, vec!["entries/a.xhtml".to_string()]);
        assert_eq!(collection.children.len(), 1);
        assert_eq!(collection.children[0].role, "index");
    }
}
