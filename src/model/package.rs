//! The package document as a whole (spec.md §4.D): `<package>`, its
//! `<metadata>`, `<manifest>`, `<spine>`, optional `<guide>`, and zero or
//! more `<collection>` elements.

use crate::model::{Collection, EpubVersion, Guide, Manifest, Metadata, Spine};
use crate::parser::xml::{XmlEventKind, XmlReader};
use crate::parser::ParserResult;

#[derive(Clone, Debug)]
pub struct PackageDocument {
    /// The declared EPUB version, or [`EpubVersion::Epub3`] as a harmless
    /// default when `version_raw` didn't parse. Callers that care about
    /// the unparsed case (`OPF-001`) must check `version_raw` themselves;
    /// by the time anything downstream reads `version` the orchestrator has
    /// already aborted on an unrecognized one.
    pub version: EpubVersion,
    /// The raw `version` attribute string, kept alongside the parsed
    /// [`EpubVersion`] so `OPF-001` can report exactly what was declared.
    pub version_raw: String,
    /// Archive-relative path to the package document itself, needed to
    /// resolve every manifest/spine href against (spec.md §4.J).
    pub path: String,
    /// `unique-identifier` attribute on `<package>`: the id of the
    /// `dc:identifier` this package nominates as canonical (`NCX-001`
    /// cross-checks this against the NCX's `dtb:uid`).
    pub unique_identifier_id: Option<String>,
    pub metadata: Metadata,
    pub manifest: Manifest,
    pub spine: Spine,
    pub guide: Option<Guide>,
    pub collections: Vec<Collection>,
}

impl PackageDocument {
    /// Parses a package document's bytes. `path` is this document's own
    /// archive-relative location (from the OCF container's rootfile entry),
    /// used to resolve every `href` the manifest, spine, and guide carry.
    pub fn parse(path: &str, bytes: &[u8]) -> ParserResult<Self> {
        let mut reader = XmlReader::new(bytes);

        let mut version = EpubVersion::Epub3;
        let mut version_raw = String::new();
        let mut unique_identifier_id = None;
        let mut prefixes = Vec::new();
        let mut metadata = None;
        let mut manifest = Manifest::default();
        let mut spine = Spine::default();
        let mut guide = None;
        let mut collections = Vec::new();

        while let Some(event) = reader.next() {
            let event = event?;
            let XmlEventKind::Start(start) = event.kind else { continue };

            match start.local_name() {
                b"package" => {
                    if let Some(raw) = start.attribute("version") {
                        version = EpubVersion::parse(&raw).unwrap_or(EpubVersion::Epub3);
                        version_raw = raw;
                    }
                    unique_identifier_id = start.attribute("unique-identifier");
                    if let Some(prefix_attr) = start.attribute("prefix") {
                        prefixes = parse_prefixes(&prefix_attr);
                    }
                }
                b"metadata" if !start.is_self_closing() => {
                    metadata = Some(Metadata::parse(&mut reader, std::mem::take(&mut prefixes))?);
                }
                b"manifest" if !start.is_self_closing() => {
                    manifest = Manifest::parse(&mut reader, path)?;
                }
                b"spine" if !start.is_self_closing() => {
                    spine.toc = start.attribute("toc");
                    spine.page_progression_direction = start.attribute("page-progression-direction");
                    Spine::parse_items(&mut reader, &mut spine)?;
                }
                b"guide" if !start.is_self_closing() => {
                    guide = Some(Guide::parse(&mut reader, path)?);
                }
                b"collection" => {
                    collections.push(Collection::parse(&mut reader, &start)?);
                }
                _ => {}
            }
        }

        Ok(Self {
            version,
            version_raw,
            path: path.to_owned(),
            unique_identifier_id,
            metadata: metadata.unwrap_or_default(),
            manifest,
            spine,
            guide,
            collections,
        })
    }

    /// The `dc:identifier` nominated by `unique-identifier`, if both are
    /// present and resolve to each other.
    pub fn unique_identifier(&self) -> Option<&str> {
        let id = self.unique_identifier_id.as_deref()?;
        self.metadata
            .identifiers
            .iter()
            .find(|identifier| identifier.id.as_deref() == Some(id))
            .map(|identifier| identifier.value.as_str())
    }
}

/// Splits a `prefix="name1: uri1 name2: uri2"` attribute value into
/// `(name, uri)` pairs (spec.md §4.F; consulted by `OPF-029`/`OPF-030`).
/// Malformed tokens (a name with no following URI) are skipped rather than
/// treated as a parse failure; an off-vocabulary `property` still gets
/// flagged downstream regardless of whether its declared prefix was
/// well-formed.
fn parse_prefixes(value: &str) -> Vec<(String, String)> {
    let mut tokens = value.split_whitespace().peekable();
    let mut prefixes = Vec::new();

    while let Some(name) = tokens.next() {
        let Some(name) = name.strip_suffix(':') else { continue };
        let Some(uri) = tokens.next() else { break };
        prefixes.push((name.to_owned(), uri.to_owned()));
    }

    prefixes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_epub3_package() {
        let xml = br#"<?xml version="1.0"?>
            <package version="3.0" unique-identifier="pub-id" prefix="foaf: http://xmlns.com/foaf/spec/">
              <metadata>
                <dc:identifier id="pub-id">urn:uuid:1234</dc:identifier>
                <dc:title>Sample</dc:title>
                <dc:language>en</dc:language>
              </metadata>
              <manifest>
                <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
                <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
              </manifest>
              <spine>
                <itemref idref="c1"/>
              </spine>
            </package>"#;

        let package = PackageDocument::parse("EPUB/package.opf", xml).unwrap();
        assert_eq!(package.version, EpubVersion::Epub3);
        assert_eq!(package.unique_identifier(), Some("urn:uuid:1234"));
        assert_eq!(package.manifest.iter().count(), 2);
        assert_eq!(package.spine.items.len(), 1);
        assert!(package.metadata.has_prefix("foaf"));
    }

    #[test]
    fn unrecognized_version_falls_back_without_erroring() {
        let xml = br#"<package version="9.9"><metadata/></package>"#;
        let package = PackageDocument::parse("package.opf", xml).unwrap();
        assert_eq!(package.version_raw, "9.9");
        assert!(EpubVersion::parse(&package.version_raw).is_none());
    }
}
