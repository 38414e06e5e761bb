//! The EPUB 2 `<guide>` element (spec.md §4.D; `OPF-043` flags its
//! presence in an EPUB 3 package document, where the navigation document's
//! landmarks serve the same purpose).

use crate::parser::xml::{XmlEventKind, XmlReader};
use crate::parser::ParserResult;
use crate::util::uri;

#[derive(Clone, Debug)]
pub struct GuideReference {
    pub r#type: String,
    pub title: Option<String>,
    pub href: String,
}

#[derive(Clone, Debug, Default)]
pub struct Guide {
    pub references: Vec<GuideReference>,
}

impl Guide {
    /// Parses the contents of a `<guide>` element up to (and consuming)
    /// its matching `</guide>`.
    pub(crate) fn parse(reader: &mut XmlReader<'_>, package_path: &str) -> ParserResult<Self> {
        let package_dir = uri::parent(package_path);
        let mut guide = Guide::default();

        while let Some(event) = reader.next() {
            let event = event?;
            match event.kind {
                XmlEventKind::Start(start) if start.local_name() == b"reference" => {
                    let raw_href = start.attribute("href").unwrap_or_default();
                    let resolved = uri::resolve(package_dir, &raw_href);
                    guide.references.push(GuideReference {
                        r#type: start.attribute("type").unwrap_or_default(),
                        title: start.attribute("title"),
                        href: uri::decode(&resolved).into_owned(),
                    });
                }
                XmlEventKind::End(name) if name == b"guide" => break,
                _ => {}
            }
        }

        Ok(guide)
    }
}
