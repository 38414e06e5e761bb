//! The package document's `<metadata>` block (spec.md §4.D, §4.F).
//!
//! EPUB 3 metadata is a flat list of Dublin Core elements plus `<meta>`
//! refinement elements that attach additional facts to any element with an
//! `id` (including other `<meta>` elements, for the
//! `media:duration`/`media:active-class` chains `checks::opf`/`checks::css`
//! walk). That refinement graph is kept as a plain `Vec` rather than a
//! `KeyedVec` here, since the key (`refines`) is optional and many-to-one,
//! not the one-id-per-entry shape `KeyedVec` is built for.

use crate::location::Position;
use crate::parser::xml::{XmlEventKind, XmlReader};
use crate::parser::ParserResult;

#[derive(Clone, Debug)]
pub struct Identifier {
    pub id: Option<String>,
    pub value: String,
    pub scheme: Option<String>,
    pub position: Position,
}

#[derive(Clone, Debug)]
pub struct Title {
    pub id: Option<String>,
    pub value: String,
    pub position: Position,
}

#[derive(Clone, Debug)]
pub struct Language {
    pub id: Option<String>,
    pub value: String,
    pub position: Position,
}

#[derive(Clone, Debug)]
pub struct Contributor {
    pub id: Option<String>,
    pub value: String,
    pub file_as: Option<String>,
    pub role: Option<String>,
    pub position: Position,
}

/// A `<meta>` element: either a plain `property`/text value, or (EPUB 2
/// legacy form) a `name`/`content` pair. `refines` is `Some` when this meta
/// refines another element's `id` (spec.md §4.F's refinement-resolution
/// rule, checks `OPF-007`/`OPF-007a`/`OPF-007b`).
#[derive(Clone, Debug)]
pub struct Meta {
    pub id: Option<String>,
    pub property: String,
    pub value: String,
    pub refines: Option<String>,
    pub scheme: Option<String>,
    pub position: Position,
}

#[derive(Clone, Debug, Default)]
pub struct Metadata {
    pub identifiers: Vec<Identifier>,
    pub titles: Vec<Title>,
    pub languages: Vec<Language>,
    pub creators: Vec<Contributor>,
    pub contributors: Vec<Contributor>,
    pub meta: Vec<Meta>,
    /// Ids declared on any other Dublin Core element this model doesn't
    /// otherwise represent in full (`dc:subject`, `dc:date`,
    /// `dc:publisher`, `dc:rights`, `dc:description`, `dc:coverage`,
    /// `dc:type`, `dc:format`, `dc:source`, `dc:relation`). Spec.md §4.F
    /// requires `meta[refines]` resolution against an id declared
    /// *anywhere* under `<metadata>`, not only the DC elements with a
    /// dedicated field, so these ids still need to be known to
    /// `checks::opf::check_refines` even though their values are not
    /// otherwise modeled.
    pub dc_element_ids: Vec<String>,
    /// `prefix="..."` declarations from the package document's root
    /// element, parsed into `(prefix, iri)` pairs. Consulted by `OPF-029`/
    /// `OPF-030` when a manifest or meta `property` token uses a prefix
    /// outside the reserved vocabulary.
    pub prefixes: Vec<(String, String)>,
}

impl Metadata {
    /// Parses the contents of a `<metadata>` element up to (and consuming)
    /// its matching `</metadata>`. `prefixes` is threaded in from the
    /// `<package prefix="...">` attribute, parsed before `<metadata>` is
    /// ever reached.
    pub(crate) fn parse(
        reader: &mut XmlReader<'_>,
        prefixes: Vec<(String, String)>,
    ) -> ParserResult<Self> {
        let mut metadata = Metadata { prefixes, ..Metadata::default() };

        while let Some(event) = reader.next() {
            let event = event?;
            match event.kind {
                XmlEventKind::Start(start) => match start.name() {
                    b"dc:identifier" => {
                        let id = start.attribute("id");
                        let scheme = start.attribute("opf:scheme").or_else(|| start.attribute("scheme"));
                        let value = reader.read_element_text(&start)?;
                        metadata.identifiers.push(Identifier { id, value, scheme, position: event.position });
                    }
                    b"dc:title" => {
                        let id = start.attribute("id");
                        let value = reader.read_element_text(&start)?;
                        metadata.titles.push(Title { id, value, position: event.position });
                    }
                    b"dc:language" => {
                        let id = start.attribute("id");
                        let value = reader.read_element_text(&start)?;
                        metadata.languages.push(Language { id, value, position: event.position });
                    }
                    b"dc:creator" | b"dc:contributor" => {
                        let id = start.attribute("id");
                        let file_as = start.attribute("opf:file-as").or_else(|| start.attribute("file-as"));
                        let role = start.attribute("opf:role").or_else(|| start.attribute("role"));
                        let value = reader.read_element_text(&start)?;
                        let contributor = Contributor { id, value, file_as, role, position: event.position };
                        if start.name() == b"dc:creator" {
                            metadata.creators.push(contributor);
                        } else {
                            metadata.contributors.push(contributor);
                        }
                    }
                    b"meta" => {
                        let id = start.attribute("id");
                        let refines = start.attribute("refines");
                        let scheme = start.attribute("scheme");
                        let (property, value) = if let Some(property) = start.attribute("property") {
                            let value = if start.is_self_closing() {
                                String::new()
                            } else {
                                reader.read_element_text(&start)?
                            };
                            (property, value)
                        } else if let Some(name) = start.attribute("name") {
                            (name, start.attribute("content").unwrap_or_default())
                        } else {
                            continue;
                        };
                        metadata.meta.push(Meta { id, property, value, refines, scheme, position: event.position });
                    }
                    name if name.starts_with(b"dc:") => {
                        if let Some(id) = start.attribute("id") {
                            metadata.dc_element_ids.push(id);
                        }
                    }
                    _ => {}
                },
                XmlEventKind::End(name) if name == b"metadata" => break,
                _ => {}
            }
        }

        Ok(metadata)
    }

    pub fn meta_by_id<'a>(&'a self, id: &str) -> Option<&'a Meta> {
        self.meta.iter().find(|m| m.id.as_deref() == Some(id))
    }

    pub fn refinements_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Meta> {
        self.meta.iter().filter(move |m| m.refines.as_deref() == Some(id))
    }

    /// The single `dcterms:modified` value, if present exactly once.
    /// `OPF-004` fires when there are zero or more than one.
    pub fn modified(&self) -> Vec<&Meta> {
        self.meta.iter().filter(|m| m.property == "dcterms:modified").collect()
    }

    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.prefixes.iter().any(|(p, _)| p == prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_epub3_and_epub2_meta_forms() {
        let xml = br#"<metadata>
            <dc:identifier id="pub-id">urn:isbn:9780000000000</dc:identifier>
            <dc:title>Example</dc:title>
            <dc:language>en</dc:language>
            <dc:creator opf:file-as="Doe, Jane" opf:role="aut">Jane Doe</dc:creator>
            <meta property="dcterms:modified">2023-05-01T10:02:00Z</meta>
            <meta name="cover" content="cover-image"/>
        </metadata>"#;
        let mut reader = XmlReader::new(xml);
        let metadata = Metadata::parse(&mut reader, Vec::new()).unwrap();

        assert_eq!(metadata.identifiers.len(), 1);
        assert_eq!(metadata.identifiers[0].id.as_deref(), Some("pub-id"));
        assert_eq!(metadata.titles[0].value, "Example");
        assert_eq!(metadata.languages[0].value, "en");
        assert_eq!(metadata.creators[0].file_as.as_deref(), Some("Doe, Jane"));
        assert_eq!(metadata.modified().len(), 1);
        assert_eq!(metadata.meta.iter().find(|m| m.property == "cover").unwrap().value, "cover-image");
    }
}
