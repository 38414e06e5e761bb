//! The package document's `<manifest>` (spec.md §4.D, §4.F).

use crate::location::Position;
use crate::parser::xml::{XmlEventKind, XmlReader};
use crate::parser::ParserResult;
use crate::util::collection::{Keyed, KeyedVec};
use crate::util::str::tokens;
use crate::util::uri;

/// One `<item>` in the manifest.
#[derive(Clone, Debug)]
pub struct ManifestItem {
    pub id: String,
    /// URL-decoded, normalized against the package document's own
    /// directory, so every checker can hand it straight to
    /// [`Archive::read`](crate::archive::Archive::read).
    pub href: String,
    pub media_type: String,
    pub fallback: Option<String>,
    pub media_overlay: Option<String>,
    /// Whitespace-split `properties` tokens, as-is (case preserved; the
    /// reserved vocabulary is matched case-sensitively per spec.md §4.F).
    pub properties: Vec<String>,
    pub position: Position,
}

impl ManifestItem {
    pub fn has_property(&self, property: &str) -> bool {
        self.properties.iter().any(|p| p == property)
    }
}

impl Keyed for ManifestItem {
    type Key = str;

    fn key(&self) -> &str {
        &self.id
    }
}

/// All manifest items, keyed by `id`. Duplicate ids are themselves a
/// finding (`OPF` generic duplicate-id check under cross-reference
/// resolution); [`KeyedVec::push`] always appends so the duplicate is
/// still visible to the checker that looks for it.
#[derive(Clone, Debug, Default)]
pub struct Manifest(pub KeyedVec<ManifestItem>);

impl Manifest {
    /// Parses the contents of a `<manifest>` element up to (and consuming)
    /// its matching `</manifest>`. `package_path` is the archive-relative
    /// path of the package document itself, used to resolve each `href`.
    pub(crate) fn parse(reader: &mut XmlReader<'_>, package_path: &str) -> ParserResult<Self> {
        let package_dir = uri::parent(package_path);
        let mut manifest = Manifest::default();

        while let Some(event) = reader.next() {
            let event = event?;
            match event.kind {
                XmlEventKind::Start(start) if start.local_name() == b"item" => {
                    let id = start.attribute("id").unwrap_or_default();
                    let raw_href = start.attribute("href").unwrap_or_default();
                    let resolved = uri::resolve(package_dir, &raw_href);
                    let href = uri::decode(&resolved).into_owned();
                    manifest.0.push(ManifestItem {
                        id,
                        href,
                        media_type: start.attribute("media-type").unwrap_or_default(),
                        fallback: start.attribute("fallback"),
                        media_overlay: start.attribute("media-overlay"),
                        properties: start
                            .attribute("properties")
                            .map(|p| tokens(&p).map(str::to_owned).collect())
                            .unwrap_or_default(),
                        position: event.position,
                    });
                }
                XmlEventKind::End(name) if name == b"manifest" => break,
                _ => {}
            }
        }

        Ok(manifest)
    }

    pub fn by_id(&self, id: &str) -> Option<&ManifestItem> {
        self.0.by_key(id)
    }

    pub fn by_href(&self, href: &str) -> Option<&ManifestItem> {
        self.0.iter().find(|item| item.href == href)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestItem> {
        self.0.iter()
    }

    /// Follows `fallback` from `item` until a terminal item (no further
    /// fallback) is reached, or a cycle is detected. A cycle yields `None`
    /// rather than panicking or looping forever; the caller (`checks::opf`)
    /// is responsible for emitting `OPF-044` when that happens.
    pub fn fallback_chain<'a>(&'a self, item: &'a ManifestItem) -> Option<Vec<&'a ManifestItem>> {
        let mut chain = vec![item];
        let mut seen = std::collections::HashSet::new();
        seen.insert(item.id.as_str());

        let mut current = item;
        while let Some(fallback_id) = &current.fallback {
            if !seen.insert(fallback_id.as_str()) {
                return None;
            }
            let next = self.by_id(fallback_id)?;
            chain.push(next);
            current = next;
        }
        Some(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_href_against_package_directory() {
        let xml = br#"<manifest>
            <item id="c1" href="text/c1.xhtml" media-type="application/xhtml+xml" properties="scripted nav"/>
        </manifest>"#;
        let mut reader = XmlReader::new(xml);
        let manifest = Manifest::parse(&mut reader, "EPUB/package.opf").unwrap();

        let item = manifest.by_id("c1").unwrap();
        assert_eq!(item.href, "EPUB/text/c1.xhtml");
        assert!(item.has_property("nav"));
    }
}
