//! The enumerated Tier 1/2 content-model rules (spec.md §4.G, §4.P): the
//! subset of the HTML content-model schema this engine replicates
//! programmatically rather than through a general RelaxNG/Schematron engine
//! (spec.md §1 Non-goals).
//!
//! Grounded on spec.md §4.G's own rule list; there is no teacher analogue
//! (`rbook` reads ebooks, it never validates their markup against a content
//! model). The element sets below are deliberately small — the reserved
//! subset spec.md actually names — rather than a transcription of the full
//! HTML Living Standard content categories.

/// Elements whose content model is restricted to phrasing content; a block
/// element appearing directly inside one of these is `HTM-004`.
pub const PHRASING_ONLY_PARENTS: &[&str] = &[
    "p", "span", "em", "strong", "b", "i", "small", "mark", "abbr", "cite", "q", "code", "var",
    "samp", "kbd", "sub", "sup", "label", "dfn", "time", "h1", "h2", "h3", "h4", "h5", "h6",
];

/// Elements treated as block-level for the phrasing-nesting check.
pub const BLOCK: &[&str] = &[
    "div", "p", "ul", "ol", "dl", "table", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote",
    "figure", "figcaption", "section", "article", "header", "footer", "nav", "aside", "form",
    "fieldset", "hr", "pre", "hgroup", "center",
];

/// Void elements: must never have content (`HTM-006`).
pub const VOID: &[&str] = &[
    "br", "hr", "img", "input", "meta", "link", "area", "base", "col", "embed", "param",
    "source", "track", "wbr",
];

/// Interactive elements: must not nest inside another interactive element
/// (`HTM-007`).
pub const INTERACTIVE: &[&str] = &["a", "button", "select", "textarea", "label", "details", "audio", "video"];

/// Elements whose content model is "transparent": they permit whatever
/// their parent permits, rather than a fixed set (spec.md §4.G). Still
/// subject to the interactive-nesting rule independently.
pub const TRANSPARENT: &[&str] = &["a", "ins", "del", "object"];

pub fn is_phrasing_only_parent(name: &str) -> bool {
    PHRASING_ONLY_PARENTS.contains(&name)
}

pub fn is_block(name: &str) -> bool {
    BLOCK.contains(&name)
}

pub fn is_void(name: &str) -> bool {
    VOID.contains(&name)
}

pub fn is_interactive(name: &str) -> bool {
    INTERACTIVE.contains(&name)
}

pub fn is_transparent(name: &str) -> bool {
    TRANSPARENT.contains(&name)
}

/// Returns the set of locally-permitted child element names for `parent`,
/// or `None` when `parent` does not restrict its children beyond the
/// general flow/phrasing rules.
pub fn restricted_children(parent: &str) -> Option<&'static [&'static str]> {
    match parent {
        "ul" | "ol" => Some(&["li", "script", "template"]),
        "dl" => Some(&["dt", "dd", "script", "template", "div"]),
        "hgroup" => Some(&["h1", "h2", "h3", "h4", "h5", "h6", "p", "template"]),
        "select" => Some(&["option", "optgroup", "hr"]),
        "optgroup" => Some(&["option"]),
        "tr" => Some(&["td", "th", "script", "template"]),
        "table" => Some(&["caption", "colgroup", "thead", "tbody", "tfoot", "tr", "script", "template"]),
        "thead" | "tbody" | "tfoot" => Some(&["tr", "script", "template"]),
        "colgroup" => Some(&["col", "template"]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_like_block_inside_phrasing_parent_is_flagged() {
        assert!(is_phrasing_only_parent("p"));
        assert!(is_block("div"));
    }

    #[test]
    fn restricted_children_rejects_foreign_child() {
        let allowed = restricted_children("ul").unwrap();
        assert!(allowed.contains(&"li"));
        assert!(!allowed.contains(&"p"));
    }

    #[test]
    fn transparent_elements_still_count_as_interactive_for_a() {
        assert!(is_transparent("a"));
        assert!(is_interactive("a"));
    }

    #[test]
    fn table_has_no_restriction_for_unrelated_parent() {
        assert!(restricted_children("div").is_none());
    }
}
