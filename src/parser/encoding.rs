//! Byte-level encoding sniffing, ahead of the XML parser proper (spec.md
//! §4.B, checks `RSC-027`/`RSC-028`/`ENC-*`).
//!
//! There is no teacher analogue (the teacher always requires well-formed
//! UTF-8 XHTML and errors out otherwise); this module is grounded on
//! spec.md's own description of the detection order: byte-order mark,
//! then UTF-16/UCS-4 signature, then the XML declaration's `encoding`
//! pseudo-attribute, falling back to UTF-8.

/// The encoding detected for a document's raw bytes, before any XML
/// parsing is attempted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DetectedEncoding {
    Utf8,
    Utf8WithBom,
    Utf16Le,
    Utf16Be,
    Ucs4,
    /// No BOM/signature found; this is the XML declaration's stated value,
    /// if any, lowercased.
    Declared(&'static str),
}

/// Inspects the first bytes of `content` for a byte-order mark or a
/// UTF-16/UCS-4 signature. This runs before any attempt to decode the
/// document as UTF-8, since a UTF-16 document fed straight to a UTF-8
/// decoder produces a wall of `RSC-016`-style garbage instead of a single,
/// actionable finding.
pub fn sniff(content: &[u8]) -> DetectedEncoding {
    match content {
        [0xEF, 0xBB, 0xBF, ..] => DetectedEncoding::Utf8WithBom,
        [0xFF, 0xFE, 0x00, 0x00, ..] | [0x00, 0x00, 0xFE, 0xFF, ..] => DetectedEncoding::Ucs4,
        [0xFF, 0xFE, ..] => DetectedEncoding::Utf16Le,
        [0xFE, 0xFF, ..] => DetectedEncoding::Utf16Be,
        _ => DetectedEncoding::Utf8,
    }
}

/// Parses the `encoding="..."` pseudo-attribute out of a leading XML
/// declaration (`<?xml version="1.0" encoding="UTF-8"?>`), without
/// invoking the full XML parser (the declaration must be checked before
/// deciding how to decode the rest of the document).
pub fn declared_encoding(content: &[u8]) -> Option<String> {
    let head = &content[..content.len().min(256)];
    let head = std::str::from_utf8(head).ok()?;
    let decl_start = head.find("<?xml")?;
    let decl_end = head[decl_start..].find("?>")? + decl_start;
    let decl = &head[decl_start..decl_end];

    let key = "encoding=";
    let key_start = decl.find(key)? + key.len();
    let quote = decl[key_start..].chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let value_start = key_start + 1;
    let value_end = decl[value_start..].find(quote)? + value_start;
    Some(decl[value_start..value_end].to_ascii_lowercase())
}

/// Whether `encoding` (lowercased) is one this engine can decode.
/// Per spec.md §4.B, only UTF-8 is supported as a document encoding;
/// anything else is `ENC-002`, and UTF-16/UCS-4 signatures are their own
/// dedicated checks (`RSC-027`/`RSC-028`) rather than routed through this.
pub fn is_supported(encoding: &str) -> bool {
    matches!(encoding, "utf-8" | "utf8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_utf8_bom() {
        assert_eq!(sniff(&[0xEF, 0xBB, 0xBF, b'<']), DetectedEncoding::Utf8WithBom);
    }

    #[test]
    fn sniffs_utf16_le() {
        assert_eq!(sniff(&[0xFF, 0xFE, b'<', 0]), DetectedEncoding::Utf16Le);
    }

    #[test]
    fn sniffs_plain_utf8() {
        assert_eq!(sniff(b"<?xml version=\"1.0\"?>"), DetectedEncoding::Utf8);
    }

    #[test]
    fn parses_declared_encoding() {
        let doc = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><html/>";
        assert_eq!(declared_encoding(doc).as_deref(), Some("iso-8859-1"));
    }

    #[test]
    fn missing_declaration_yields_none() {
        assert_eq!(declared_encoding(b"<html/>"), None);
    }

    #[test]
    fn supported_encodings() {
        assert!(is_supported("utf-8"));
        assert!(!is_supported("iso-8859-1"));
    }
}
