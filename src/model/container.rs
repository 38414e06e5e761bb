//! `META-INF/container.xml` (spec.md §4.D, checks `OCF-005`..`OCF-007`).

use crate::parser::xml::{XmlEventKind, XmlReader};
use crate::parser::ParserError;

/// One `<rootfile>` entry from `META-INF/container.xml`.
#[derive(Clone, Debug)]
pub struct RootFile {
    pub full_path: String,
    pub media_type: String,
}

/// The parsed contents of `META-INF/container.xml`. A conforming OCF
/// container has at least one [`RootFile`] whose `media_type` is
/// `application/oebps-package+xml` (`OCF-007`); everything else
/// (`META-INF/encryption.xml`, `META-INF/signatures.xml`, `META-INF/metadata.xml`)
/// is tracked separately by `checks::ocf` directly against the archive
/// listing rather than through this struct.
#[derive(Clone, Debug, Default)]
pub struct ContainerDocument {
    pub rootfiles: Vec<RootFile>,
    /// `full-path` values from every `<link>` in `<rootfiles>`/`<links>`,
    /// used by `OCF-009` to recognize files that belong to a sibling
    /// rendition rather than being genuinely unreferenced.
    pub links: Vec<String>,
}

impl ContainerDocument {
    /// The first rootfile whose media-type marks it as an OPF package
    /// document, per `OCF-007`.
    pub fn package_rootfile(&self) -> Option<&RootFile> {
        self.rootfiles
            .iter()
            .find(|rootfile| rootfile.media_type == "application/oebps-package+xml")
    }

    /// Parses `META-INF/container.xml`. A well-formed container with zero
    /// rootfiles is not itself a parse error (`OCF-007` catches that case);
    /// only malformed XML is surfaced here.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParserError> {
        let mut reader = XmlReader::new(bytes);
        let mut document = Self::default();

        while let Some(event) = reader.next() {
            let XmlEventKind::Start(start) = event?.kind else {
                continue;
            };
            match start.local_name() {
                b"rootfile" => {
                    let (Some(full_path), Some(media_type)) =
                        (start.attribute("full-path"), start.attribute("media-type"))
                    else {
                        continue;
                    };
                    document.rootfiles.push(RootFile { full_path, media_type });
                }
                b"link" => {
                    if let Some(href) = start.attribute("href") {
                        document.links.push(href);
                    }
                }
                _ => {}
            }
        }

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rootfile_and_link() {
        let xml = br#"<?xml version="1.0"?>
            <container>
              <rootfiles>
                <rootfile full-path="EPUB/package.opf" media-type="application/oebps-package+xml"/>
              </rootfiles>
              <links>
                <link rel="alternate" href="EPUB2/package.opf"/>
              </links>
            </container>"#;

        let document = ContainerDocument::parse(xml).unwrap();
        assert_eq!(document.rootfiles.len(), 1);
        assert_eq!(document.package_rootfile().unwrap().full_path, "EPUB/package.opf");
        assert_eq!(document.links, vec!["EPUB2/package.opf".to_string()]);
    }

    #[test]
    fn mismatched_end_tag_is_an_error() {
        assert!(ContainerDocument::parse(b"<container><rootfiles></container>").is_err());
    }
}
