//! The position-tracking XML pull-parser adapter used by every content-model
//! checker (`checks::content`, `checks::ncx`, `checks::nav`, the OPF/NCX/SMIL
//! parsers in [`model`](crate::model)).

use crate::location::Position;
use crate::parser::{ParserError, ParserResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use std::borrow::Cow;

/// One parsed XML event plus the byte offset (and derived line/column) it
/// started at.
pub struct XmlEvent<'a> {
    pub position: Position,
    pub kind: XmlEventKind<'a>,
}

pub enum XmlEventKind<'a> {
    Start(XmlStartElement<'a>),
    End(Vec<u8>),
    Text(String),
    CData(String),
    /// A `<!DOCTYPE ...>` declaration, raw (everything between `DOCTYPE`
    /// and the closing `>`). Only the XHTML checker inspects this
    /// (`HTM-010`/`HTM-011`); every other document kind ignores it.
    DocType(String),
    Eof,
}

/// A pull-parser over one document's bytes, tracking line/column as it
/// goes so every emitted [`XmlEvent`] can anchor a
/// [`Location`](crate::location::Location).
pub struct XmlReader<'a> {
    reader: quick_xml::Reader<&'a [u8]>,
    line_starts: Vec<usize>,
}

impl<'a> XmlReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        let mut reader = quick_xml::Reader::from_reader(bytes);
        reader.config_mut().trim_text(false);

        let mut line_starts = vec![0];
        for (i, byte) in bytes.iter().enumerate() {
            if *byte == b'\n' {
                line_starts.push(i + 1);
            }
        }

        Self { reader, line_starts }
    }

    fn position_at(&self, offset: usize) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let column = offset - self.line_starts[line];
        Position::new(line as u32 + 1, column as u32 + 1)
    }

    /// Reads the next event. Returns `None` once EOF has been consumed.
    pub fn next(&mut self) -> Option<ParserResult<XmlEvent<'a>>> {
        let offset = self.reader.buffer_position() as usize;
        let position = self.position_at(offset);

        let event = match self.reader.read_event() {
            Ok(Event::Eof) => return None,
            Ok(event) => event,
            Err(source) => {
                return Some(Err(ParserError::Malformed { offset, source }));
            }
        };

        let kind = match event {
            Event::Start(e) => XmlEventKind::Start(XmlStartElement::new(e, false)),
            Event::Empty(e) => XmlEventKind::Start(XmlStartElement::new(e, true)),
            Event::End(e) => XmlEventKind::End(e.name().as_ref().to_vec()),
            Event::Text(e) => match e.decode() {
                Ok(text) => XmlEventKind::Text(text.into_owned()),
                Err(_) => return Some(Err(ParserError::InvalidUtf8 { offset })),
            },
            Event::CData(e) => match e.minimal_escape() {
                Ok(text) => XmlEventKind::CData(String::from_utf8_lossy(&text).into_owned()),
                Err(_) => return Some(Err(ParserError::InvalidUtf8 { offset })),
            },
            Event::DocType(e) => XmlEventKind::DocType(String::from_utf8_lossy(e.as_ref()).into_owned()),
            _ => return self.next(),
        };

        Some(Ok(XmlEvent { position, kind }))
    }

    /// Skips to (and consumes) the matching end tag for `start`, returning
    /// the consolidated text content in between (attribute/child-element
    /// structure is discarded; callers that need structure use [`Self::next`]
    /// directly instead).
    pub fn read_element_text(&mut self, start: &XmlStartElement<'_>) -> ParserResult<String> {
        if start.is_self_closing {
            return Ok(String::new());
        }
        let name = start.name().to_vec();
        let mut depth = 0usize;
        let mut text = String::new();

        while let Some(result) = self.next() {
            match result?.kind {
                XmlEventKind::Start(child) if child.name() == name.as_slice() => depth += 1,
                XmlEventKind::End(end_name) if end_name == name => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                XmlEventKind::Text(t) | XmlEventKind::CData(t) => {
                    text.push_str(&t);
                }
                _ => {}
            }
        }
        Ok(text)
    }
}

pub struct XmlStartElement<'a> {
    element: BytesStart<'a>,
    is_self_closing: bool,
}

impl<'a> XmlStartElement<'a> {
    fn new(element: BytesStart<'a>, is_self_closing: bool) -> Self {
        Self { element, is_self_closing }
    }

    /// Raw (possibly prefixed) element name, e.g. `b"epub:switch"`.
    pub fn name(&self) -> &[u8] {
        self.element.name().as_ref()
    }

    pub fn name_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.name())
    }

    pub fn local_name(&self) -> &[u8] {
        self.element.local_name().as_ref()
    }

    pub fn local_name_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.local_name())
    }

    pub fn prefix(&self) -> Option<&[u8]> {
        self.element.name().prefix().map(|p| p.as_ref())
    }

    pub fn is_self_closing(&self) -> bool {
        self.is_self_closing
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.element
            .try_get_attribute(name)
            .ok()
            .flatten()
            .map(|attribute| String::from_utf8_lossy(&attribute.value).into_owned())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.element.try_get_attribute(name).ok().flatten().is_some()
    }

    pub fn attributes(&self) -> XmlAttributes {
        let attributes = self
            .element
            .attributes()
            .filter_map(Result::ok)
            .map(|attribute| {
                let name = QName(attribute.key.as_ref()).as_ref().to_vec();
                let value = String::from_utf8_lossy(&attribute.value).into_owned();
                (name, value)
            })
            .collect();
        XmlAttributes(attributes)
    }
}

pub struct XmlAttributes(Vec<(Vec<u8>, String)>);

impl XmlAttributes {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (std::str::from_utf8(k).unwrap_or(""), v.as_str()))
    }
}

impl FromIterator<(Vec<u8>, String)> for XmlAttributes {
    fn from_iter<I: IntoIterator<Item = (Vec<u8>, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_line_and_column() {
        let xml = b"<a>\n  <b id=\"x\"/>\n</a>";
        let mut reader = XmlReader::new(xml);

        let first = reader.next().unwrap().unwrap();
        assert_eq!(first.position, Position::new(1, 1));

        let second = reader.next().unwrap().unwrap();
        assert_eq!(second.position.line, 2);
    }

    #[test]
    fn reads_attribute_value() {
        let xml = b"<item id=\"c1\" href=\"c1.xhtml\"/>";
        let mut reader = XmlReader::new(xml);
        let event = reader.next().unwrap().unwrap();

        let XmlEventKind::Start(start) = event.kind else {
            panic!("expected start element");
        };
        assert_eq!(start.attribute("id").as_deref(), Some("c1"));
        assert_eq!(start.attribute("href").as_deref(), Some("c1.xhtml"));
        assert!(start.is_self_closing());
    }

    #[test]
    fn reads_element_text() {
        let xml = b"<title>Moby Dick</title>";
        let mut reader = XmlReader::new(xml);
        let event = reader.next().unwrap().unwrap();

        let XmlEventKind::Start(start) = event.kind else {
            panic!("expected start element");
        };
        let text = reader.read_element_text(&start).unwrap();
        assert_eq!(text, "Moby Dick");
    }

    #[test]
    fn malformed_xml_is_reported_not_panicked() {
        let xml = b"<a><b></a>";
        let mut reader = XmlReader::new(xml);
        let mut saw_error = false;
        while let Some(result) = reader.next() {
            if result.is_err() {
                saw_error = true;
                break;
            }
        }
        assert!(saw_error);
    }
}
