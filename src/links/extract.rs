// src/links/extract.rs
// =============================================================================
// Finds link-like attribute values in markup.
//
// This is a plain text scan for ` href="..."` and ` src='...'`, not an HTML
// parser. It never fails: broken markup just yields fewer matches. That is
// good enough for mirroring, where we only need the raw values and the
// resolver does the rest.
// =============================================================================

use regex::Regex;
use std::sync::OnceLock;

static RE_HREF: OnceLock<Regex> = OnceLock::new();
static RE_SRC: OnceLock<Regex> = OnceLock::new();

/// Which attribute to look for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Href,
    Src,
}

impl LinkKind {
    fn pattern(self) -> &'static Regex {
        match self {
            LinkKind::Href => RE_HREF.get_or_init(|| {
                Regex::new(r#"(?i) href=["']([^<>"']+)['"]"#).expect("href pattern is valid")
            }),
            LinkKind::Src => RE_SRC.get_or_init(|| {
                Regex::new(r#"(?i) src=["']([^<>"']+)['"]"#).expect("src pattern is valid")
            }),
        }
    }
}

// Yields every non-empty value of the given attribute, in document order
//
// Example:
//   <img src="https://example.com/imgs/logo.png"><img src="">
//   -> ["https://example.com/imgs/logo.png"]
pub fn extract(document: &str, kind: LinkKind) -> impl Iterator<Item = &str> {
    kind.pattern()
        .captures_iter(document)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|value| !value.is_empty())
}

// All href values followed by all src values
pub fn extract_links(document: &str) -> impl Iterator<Item = &str> {
    extract(document, LinkKind::Href).chain(extract(document, LinkKind::Src))
}
