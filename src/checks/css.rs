//! CSS stylesheet checking (spec.md §4.H): syntactic-only scanning of
//! at-rules and declarations, with comment stripping and line/column
//! tracking for parse errors.
//!
//! No teacher or pack example tokenizes CSS (the corpus's nearest relative,
//! `parser::xml`, is a markup pull-parser, not useful here), so this scanner
//! is hand-rolled. It keeps `parser::xml`'s own idiom: a byte cursor that
//! tracks line/column as it advances, and an explicit brace-nesting depth
//! instead of a real grammar, since spec.md explicitly scopes this to
//! "tokenize and scan", not parse or match selectors against elements.

use crate::catalog::CheckId;
use crate::location::{Location, Position};
use crate::model::content_doc::{CssDocument, Reference};
use crate::model::manifest::ManifestItem;
use crate::parser::encoding;
use crate::report::Report;
use crate::util::uri;

pub fn check(item: &ManifestItem, bytes: &[u8], report: &mut Report) -> CssDocument {
    let mut doc = CssDocument::default();
    let text = String::from_utf8_lossy(bytes);
    let stripped = strip_comments(&text);
    let dir = uri::parent(&item.href);

    let mut cursor = Cursor::new(&stripped);
    let mut depth = 0i32;

    while let Some(c) = cursor.peek() {
        match c {
            '@' => {
                let position = cursor.position();
                let at_rule = cursor.take_at_rule_name();
                match at_rule.as_str() {
                    "import" => {
                        doc.imports.push(position);
                        if let Some(raw) = cursor.take_import_target() {
                            push_import_reference(item, &mut doc.facts.references, dir, &raw, position, report);
                        }
                    }
                    "font-face" => doc.font_faces.push(position),
                    "charset" => {
                        if depth == 0 {
                            doc.charset = cursor.take_charset_value();
                        }
                    }
                    _ => {}
                }
            }
            '{' => {
                depth += 1;
                cursor.advance();
            }
            '}' => {
                depth -= 1;
                if depth < 0 {
                    doc.parse_errors.push((
                        "unmatched closing brace '}'".to_owned(),
                        cursor.position(),
                    ));
                    depth = 0;
                }
                cursor.advance();
            }
            _ => {
                if depth > 0 {
                    if let Some(position) = cursor.take_fixed_position_declaration() {
                        doc.fixed_positions.push(position);
                        continue;
                    }
                }
                cursor.advance();
            }
        }
    }

    if depth != 0 {
        doc.parse_errors.push((
            format!("{depth} unclosed '{{' block(s) at end of file"),
            cursor.position(),
        ));
    }

    doc.selectors = collect_selectors(&stripped);

    for position in &doc.imports {
        report.emit_plain(
            CheckId::Css008,
            Location::path(item.href.clone()).with_position(*position),
        );
    }
    for position in &doc.font_faces {
        report.emit_plain(
            CheckId::Css009,
            Location::path(item.href.clone()).with_position(*position),
        );
    }
    for position in &doc.fixed_positions {
        report.emit_plain(
            CheckId::Css010,
            Location::path(item.href.clone()).with_position(*position),
        );
    }
    for (message, position) in &doc.parse_errors {
        report.emit(
            CheckId::Css012,
            Location::path(item.href.clone()).with_position(*position),
            &[message],
        );
    }

    check_charset(item, bytes, &doc, report);

    doc
}

/// `CSS-011`: an `@charset` value must match the file's actual encoding,
/// detected the same way `parser::encoding` detects it for XML documents.
fn check_charset(item: &ManifestItem, bytes: &[u8], doc: &CssDocument, report: &mut Report) {
    let Some(declared) = &doc.charset else { return };
    let actual = match encoding::sniff(bytes) {
        encoding::DetectedEncoding::Utf8 | encoding::DetectedEncoding::Utf8WithBom => "utf-8".to_owned(),
        encoding::DetectedEncoding::Utf16Le => "utf-16le".to_owned(),
        encoding::DetectedEncoding::Utf16Be => "utf-16be".to_owned(),
        encoding::DetectedEncoding::Ucs4 => "ucs-4".to_owned(),
        encoding::DetectedEncoding::Declared(value) => value.to_owned(),
    };
    if !declared.eq_ignore_ascii_case(&actual) {
        report.emit(
            CheckId::Css011,
            Location::path(item.href.clone()),
            &[declared, &actual],
        );
    }
}

/// `RSC-007`: a remote (scheme-qualified) `@import` target used without the
/// manifest item declaring `remote-resources`, the same gate `xhtml`/`svg`
/// apply to `HTM-021` for remote `src`/`href` attributes.
fn push_import_reference(
    item: &ManifestItem,
    references: &mut Vec<Reference>,
    dir: &str,
    raw: &str,
    position: Position,
    report: &mut Report,
) {
    if raw.is_empty() {
        return;
    }
    if uri::has_scheme(raw) {
        references.push(Reference {
            target_path: raw.to_owned(),
            fragment: None,
            position,
            remote: true,
        });
        if !item.has_property("remote-resources") {
            report.emit(
                CheckId::Rsc007,
                Location::path(item.href.clone()).with_position(position),
                &[raw],
            );
        }
        return;
    }
    let resolved = uri::resolve(dir, raw);
    let decoded = uri::decode(&resolved);
    references.push(Reference {
        target_path: uri::path(&decoded).to_owned(),
        fragment: None,
        position,
        remote: false,
    });
}

/// `CSS-029`: a media-overlay active-class declared on `<package>` that no
/// stylesheet defines a rule for. Checked once all stylesheets in the
/// publication have been scanned, so it lives on the aggregate rather than
/// a single document's [`CssDocument`].
pub fn check_active_class_declared(active_class: &str, stylesheets: &[&CssDocument], report: &mut Report) {
    let needle = format!(".{active_class}");
    let declared = stylesheets.iter().any(|doc| selector_mentions(doc, &needle));
    if !declared {
        report.emit(CheckId::Css029, Location::root(), &[active_class]);
    }
}

/// Whether `needle` (a `.class-name` token) appears as a whole class
/// selector anywhere in `doc`'s collected selector text. Tokenizes on
/// anything that isn't a CSS identifier character so `.active:hover` and
/// `.foo.active` both match `.active` without matching `.active-ish`.
fn selector_mentions(doc: &CssDocument, needle: &str) -> bool {
    doc.selectors.iter().any(|selector| {
        selector
            .split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_' || c == '.'))
            .any(|token| token == needle)
    })
}

/// Collects each top-level (nesting-depth-zero) rule's selector prelude,
/// skipping at-rule preludes (`@media ...`) since those aren't selectors.
fn collect_selectors(stripped: &str) -> Vec<String> {
    let mut selectors = Vec::new();
    let mut depth = 0i32;
    let mut buf = String::new();

    for c in stripped.chars() {
        match c {
            '{' => {
                if depth == 0 {
                    let trimmed = buf.trim();
                    if !trimmed.is_empty() && !trimmed.starts_with('@') {
                        selectors.push(trimmed.to_owned());
                    }
                }
                depth += 1;
                buf.clear();
            }
            '}' => {
                depth -= 1;
                buf.clear();
            }
            ';' if depth == 0 => buf.clear(),
            _ => buf.push(c),
        }
    }

    selectors
}

struct Cursor<'a> {
    text: &'a str,
    bytes: &'a [u8],
    offset: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, bytes: text.as_bytes(), offset: 0, line: 1, column: 1 }
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.text[self.offset..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn take_at_rule_name(&mut self) -> String {
        self.advance(); // '@'
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() || c == '-' {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        name
    }

    fn take_charset_value(&mut self) -> Option<String> {
        while let Some(c) = self.peek() {
            if c == '"' || c == '\'' {
                break;
            }
            if c == ';' {
                return None;
            }
            self.advance();
        }
        let quote = self.advance()?;
        let mut value = String::new();
        while let Some(c) = self.peek() {
            if c == quote {
                self.advance();
                break;
            }
            value.push(c);
            self.advance();
        }
        Some(value)
    }

    /// Reads an `@import` rule's target, as either `url(...)` (quoted or
    /// bare) or a bare quoted string, stopping at the first `;`. Returns
    /// `None` if no quote or `url(` token is found before the semicolon.
    fn take_import_target(&mut self) -> Option<String> {
        self.skip_whitespace();
        let in_url = self.bytes[self.offset..].starts_with(b"url(");
        if in_url {
            for _ in 0..4 {
                self.advance();
            }
            self.skip_whitespace();
        }

        let quote = self.peek()?;
        if quote != '"' && quote != '\'' {
            if !in_url {
                return None;
            }
            // bare, unquoted url(...) token
            let mut value = String::new();
            while let Some(c) = self.peek() {
                if c == ')' || c == ';' {
                    break;
                }
                value.push(c);
                self.advance();
            }
            return Some(value.trim().to_owned());
        }

        self.advance();
        let mut value = String::new();
        while let Some(c) = self.peek() {
            if c == quote {
                self.advance();
                break;
            }
            value.push(c);
            self.advance();
        }
        Some(value)
    }

    /// Recognizes a bare `position: fixed` declaration starting at the
    /// cursor, consuming it if found. Returns `None` (without consuming)
    /// for anything else, so the caller's default single-char advance
    /// still makes progress.
    fn take_fixed_position_declaration(&mut self) -> Option<Position> {
        const NEEDLE: &str = "position";
        if !self.bytes[self.offset..].starts_with(NEEDLE.as_bytes()) {
            return None;
        }
        let start = self.position();
        let save = (self.offset, self.line, self.column);

        for _ in 0..NEEDLE.len() {
            self.advance();
        }
        self.skip_whitespace();
        if self.peek() != Some(':') {
            (self.offset, self.line, self.column) = save;
            return None;
        }
        self.advance();
        self.skip_whitespace();
        if self.bytes[self.offset..].starts_with(b"fixed") {
            for _ in 0..5 {
                self.advance();
            }
            Some(start)
        } else {
            (self.offset, self.line, self.column) = save;
            None
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }
}

/// Strips `/* ... */` comments, replacing their contents with spaces (not
/// removing them outright) so every remaining byte offset still lines up
/// with the original source for position tracking.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    let mut in_comment = false;

    while let Some((_, c)) = chars.next() {
        if in_comment {
            if c == '*' {
                if let Some((_, '/')) = chars.peek().copied() {
                    chars.next();
                    out.push(' ');
                    out.push(' ');
                    in_comment = false;
                    continue;
                }
            }
            out.push(if c == '\n' { '\n' } else { ' ' });
            continue;
        }
        if c == '/' {
            if let Some((_, '*')) = chars.peek().copied() {
                chars.next();
                out.push(' ');
                out.push(' ');
                in_comment = true;
                continue;
            }
        }
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Position as Pos;

    fn item(href: &str) -> ManifestItem {
        ManifestItem {
            id: "s1".into(),
            href: href.into(),
            media_type: "text/css".into(),
            fallback: None,
            media_overlay: None,
            properties: Vec::new(),
            position: Pos::new(1, 1),
        }
    }

    #[test]
    fn strips_block_comments_preserving_offsets() {
        let stripped = strip_comments("a/* hi */b");
        assert_eq!(stripped.len(), "a/* hi */b".len());
        assert!(!stripped.contains("hi"));
    }

    #[test]
    fn detects_import_and_font_face() {
        let css = b"@import url(other.css);\n@font-face { font-family: X; }";
        let mut report = Report::new();
        let doc = check(&item("style.css"), css, &mut report);
        assert_eq!(doc.imports.len(), 1);
        assert_eq!(doc.font_faces.len(), 1);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Css008));
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Css009));
    }

    #[test]
    fn detects_fixed_position_declaration() {
        let css = b".banner { position: fixed; top: 0; }";
        let mut report = Report::new();
        let doc = check(&item("style.css"), css, &mut report);
        assert_eq!(doc.fixed_positions.len(), 1);
    }

    #[test]
    fn ignores_commented_out_at_import() {
        let css = b"/* @import url(x.css); */\nbody { color: red; }";
        let mut report = Report::new();
        let doc = check(&item("style.css"), css, &mut report);
        assert!(doc.imports.is_empty());
    }

    #[test]
    fn unmatched_brace_is_a_parse_error() {
        let css = b"body { color: red; }}";
        let mut report = Report::new();
        let doc = check(&item("style.css"), css, &mut report);
        assert_eq!(doc.parse_errors.len(), 1);
    }

    #[test]
    fn unclosed_block_is_a_parse_error() {
        let css = b"body { color: red;";
        let mut report = Report::new();
        let doc = check(&item("style.css"), css, &mut report);
        assert_eq!(doc.parse_errors.len(), 1);
    }

    #[test]
    fn charset_mismatch_is_flagged() {
        let css = br#"@charset "iso-8859-1"; body { color: red; }"#;
        let mut report = Report::new();
        check(&item("style.css"), css, &mut report);

        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Css011));
    }

    #[test]
    fn bare_url_import_resolves_to_a_reference() {
        let css = b"@import url(fonts/base.css);";
        let mut report = Report::new();
        let doc = check(&item("styles/main.css"), css, &mut report);

        assert_eq!(doc.facts.references.len(), 1);
        assert_eq!(doc.facts.references[0].target_path, "styles/fonts/base.css");
    }

    #[test]
    fn remote_import_without_property_is_flagged() {
        let css = b"@import url(https://fonts.example.com/base.css);";
        let mut report = Report::new();
        let doc = check(&item("style.css"), css, &mut report);

        assert!(doc.facts.references[0].remote);
        let finished = report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Rsc007));
    }

    #[test]
    fn active_class_declared_in_some_stylesheet_is_not_flagged() {
        let css = b".active { color: blue; }";
        let mut report = Report::new();
        let doc = check(&item("style.css"), css, &mut report);

        let mut active_report = Report::new();
        check_active_class_declared("active", &[&doc], &mut active_report);
        let finished = active_report.finish();
        assert!(!finished.findings.iter().any(|f| f.id == CheckId::Css029));
    }

    #[test]
    fn undeclared_active_class_is_flagged() {
        let css = b"body { color: red; }";
        let mut report = Report::new();
        let doc = check(&item("style.css"), css, &mut report);

        let mut active_report = Report::new();
        check_active_class_declared("active", &[&doc], &mut active_report);
        let finished = active_report.finish();
        assert!(finished.findings.iter().any(|f| f.id == CheckId::Css029));
    }
}
