//! URI/href resolution helpers shared by the OPF, content-document, and
//! cross-reference checkers.
//!
//! Grounded on the teacher's `util::uri` (rbook), trimmed of its write-side
//! (`relativize`/`join`) since the validator never emits hrefs, only resolves
//! and classifies the ones it reads.

use crate::util::borrow::CowExt;
use std::borrow::Cow;

pub const SEPARATOR: char = '/';
const SEPARATOR_STR: &str = "/";
const CURRENT_DIR: &str = ".";
const PARENT_DIR: &str = "..";
const EMPTY: &str = "";

/// Resolver turning relative hrefs into paths absolute from a fixed directory.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct UriResolver<'a>(&'a str);

impl<'a> UriResolver<'a> {
    pub(crate) fn parent_of(absolute_path: &'a str) -> Self {
        Self(parent(absolute_path))
    }

    pub(crate) fn resolve(&self, href: &str) -> String {
        resolve(self.0, href).into_owned()
    }
}

pub(crate) fn into_absolute(mut path: String) -> String {
    if !path.starts_with(SEPARATOR) {
        path.insert(0, SEPARATOR);
    }
    path
}

pub(crate) fn parent(href: &str) -> &str {
    href.rfind(SEPARATOR).map_or(EMPTY, |index| {
        if index == 0 { SEPARATOR_STR } else { &href[..index] }
    })
}

/// Strips a trailing fragment (`#...`) or query (`?...`) from `href`.
pub(crate) fn path(href: &str) -> &str {
    href.find(['#', '?']).map_or(href, |index| &href[..index])
}

/// Returns the `#fragment` portion of `href`, if any (without the `#`).
pub(crate) fn fragment(href: &str) -> Option<&str> {
    href.find('#').map(|index| &href[index + 1..])
}

pub(crate) fn filename(href: &str) -> &str {
    path(href)
        .rsplit(SEPARATOR)
        .next()
        .expect("`rsplit` guarantees at least one entry")
}

pub(crate) fn file_extension(href: &str) -> Option<&str> {
    filename(href).rsplit_once('.').map(|(_, ext)| ext)
}

/// Returns `true` if `href` begins with an RFC 3986 scheme (`scheme:`).
/// The given href is assumed to be well-formed.
pub(crate) fn has_scheme(href: &str) -> bool {
    let ascii = href.as_bytes();

    let Some(colon_pos) = ascii.iter().position(|&c| c == b':') else {
        return false;
    };
    if ascii.is_empty() || !ascii[0].is_ascii_alphabetic() {
        return false;
    }

    ascii[1..colon_pos]
        .iter()
        .all(|c| c.is_ascii_alphanumeric() || matches!(*c, b'+' | b'.' | b'-'))
}

/// Extracts the scheme of `href`, if it has one, lowercased.
pub(crate) fn scheme(href: &str) -> Option<String> {
    has_scheme(href).then(|| {
        let colon = href.find(':').expect("has_scheme guarantees a colon");
        href[..colon].to_ascii_lowercase()
    })
}

pub(crate) fn decode(encoded: &str) -> Cow<'_, str> {
    percent_encoding::percent_decode_str(encoded).decode_utf8_lossy()
}

pub(crate) fn encode(original: &str) -> Cow<'_, str> {
    const ASCII_SET: &percent_encoding::AsciiSet = &percent_encoding::NON_ALPHANUMERIC
        .remove(b'%')
        .remove(b'.')
        .remove(b'/')
        .remove(b':')
        .remove(b'#')
        .remove(b'?')
        .remove(b'-')
        .remove(b'_')
        .remove(b'~')
        .remove(b'=')
        .remove(b'&');

    percent_encoding::percent_encode(original.as_bytes(), ASCII_SET).into()
}

/// Resolve a child path against its parent, normalizing if necessary.
pub(crate) fn resolve<'a>(parent_dir: &str, relative: &'a str) -> Cow<'a, str> {
    let (main_href, ext) = relative
        .find(['?', '#'])
        .map_or((relative, EMPTY), |position| {
            (&relative[..position], &relative[position..])
        });

    if main_href.starts_with(SEPARATOR) || has_scheme(main_href) {
        return Cow::Borrowed(relative);
    }

    let resolved_href = String::from(parent_dir) + SEPARATOR_STR + main_href + ext;

    Cow::Owned(
        normalize(&resolved_href)
            .take_owned()
            .unwrap_or(resolved_href),
    )
}

pub(crate) fn normalize(original: &str) -> Cow<'_, str> {
    let mut components = original.split(SEPARATOR);
    if original.starts_with(SEPARATOR) {
        components.next();
    }
    if !components.any(|c| matches!(c, EMPTY | CURRENT_DIR | PARENT_DIR)) {
        return Cow::Borrowed(original);
    }

    let mut stack = Vec::new();
    for component in original.split(SEPARATOR) {
        match component {
            EMPTY | CURRENT_DIR => {}
            PARENT_DIR => {
                stack.pop();
            }
            _ => stack.push(component),
        }
    }

    let capacity = stack.iter().map(|s| s.len()).sum::<usize>() + stack.len();
    let mut path = String::with_capacity(capacity);
    let mut components = stack.into_iter();

    if original.starts_with(SEPARATOR) {
        path.push(SEPARATOR);
    }
    if let Some(component) = components.next() {
        path.push_str(component);
    }
    for component in components {
        path.push(SEPARATOR);
        path.push_str(component);
    }
    Cow::Owned(path)
}

/// `true` if `href` looks like an in-document media-fragment or CFI that the
/// cross-reference resolver should skip id lookup for (spec.md §4.J).
pub(crate) fn is_media_fragment(fragment: &str) -> bool {
    fragment.starts_with("xywh=")
        || fragment.starts_with("xyn=")
        || fragment.starts_with("t=")
        || fragment.starts_with("epubcfi(")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_href() {
        #[rustfmt::skip]
        let expected = [
            ("OPS/content/toc", "OPS/content/toc/toc.xhtml?q=1#start"),
            ("OPS/content", "OPS/content/toc"),
            ("OPS/content", "OPS/content/c1.xhtml"),
            ("OPS", "OPS/c5.xhtml?q=1"),
            ("", "OPS"),
            ("/", "/OPS"),
            ("/", "/"),
            ("", ""),
        ];

        for (expect_href, href) in expected {
            assert_eq!(expect_href, parent(href));
        }
    }

    #[test]
    fn test_as_absolute_href() {
        #[rustfmt::skip]
        let expected = [
            ("/c3.xhtml", "OPS/content", "/c3.xhtml"),
            ("content/c3.xhtml", "./content", "c3.xhtml"),
            ("OPS/content/toc/toc.xhtml", "OPS/content/toc", "toc.xhtml"),
            ("OPS/content/toc/toc.xhtml", "OPS/content/toc", "./toc.xhtml",),
            ("OPS/content/c1.xhtml", "OPS/content/toc", "../c1.xhtml"),
        ];

        for (expect_href, absolute_dir, relative_href) in expected {
            assert_eq!(expect_href, resolve(absolute_dir, relative_href));
        }
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("https://ab.c"));
        assert!(has_scheme("mailto:a@b.c"));
        assert!(has_scheme("a:link"));
        assert!(!has_scheme("1https://ab.c"));
        assert!(!has_scheme(":abc"));
        assert!(!has_scheme(""));
        assert!(!has_scheme("not a scheme:..."));
    }

    #[test]
    fn test_is_media_fragment() {
        assert!(is_media_fragment("xywh=10,10,100,100"));
        assert!(is_media_fragment("t=10,20"));
        assert!(is_media_fragment("epubcfi(/6/4!/4)"));
        assert!(!is_media_fragment("chapter-1"));
    }
}
