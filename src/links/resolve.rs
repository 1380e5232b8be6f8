// src/links/resolve.rs
// =============================================================================
// Resolves a link found on a page against the URL of that page.
//
// url::Url::join would do most of this for us, but it only works on absolute
// bases and it follows RFC 3986 to the letter. The mirror needs slightly
// different rules:
// - a reference with a foreign host is returned as-is, never re-joined
// - same-host paths are joined against the *directory* of the page
//   ("/cat/subcats/list.html" + "../images/logo.png" = "/cat/images/logo.png")
// - a host that itself starts with "http" is a broken absolute URL glued into
//   the host slot by bad markup; it is passed through untouched
//
// So references are split into their parts by hand (scheme, host, path,
// query, fragment) and put back together after resolution.
// =============================================================================

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::error::MirrorError;

static RE_REFERENCE: OnceLock<Regex> = OnceLock::new();

// The generic URI-reference split from RFC 3986, appendix B
fn reference_pattern() -> &'static Regex {
    RE_REFERENCE.get_or_init(|| {
        Regex::new(r"(?s)^(?:([A-Za-z][A-Za-z0-9+.\-]*):)?(?://([^/?#]*))?([^?#]*)(?:\?([^#]*))?(?:#(.*))?$")
            .expect("reference pattern is valid")
    })
}

/// A URL reference split into its components. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reference {
    pub scheme: Option<String>,
    /// Everything between "//" and the path, port and userinfo included
    pub host: Option<String>,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl Reference {
    // Splits `raw` into a Reference
    //
    // Returns Err with a short reason for things no browser would accept
    // either: control characters, broken %-escapes, a colon in the first
    // path segment of a scheme-less reference, non-numeric ports.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if let Some(c) = raw.chars().find(|c| c.is_ascii_control()) {
            return Err(format!("invalid control character {:?} in URL", c));
        }

        check_escapes(raw)?;

        let caps = reference_pattern()
            .captures(raw)
            .ok_or_else(|| "not a URL reference".to_string())?;
        let group = |i: usize| caps.get(i).map(|m| m.as_str().to_string());

        let reference = Reference {
            scheme: group(1).map(|s| s.to_ascii_lowercase()),
            host: group(2).filter(|h| !h.is_empty()),
            path: group(3).unwrap_or_default(),
            query: group(4),
            fragment: group(5),
        };

        if reference.scheme.is_none() && reference.host.is_none() {
            let first_segment = reference.path.split('/').next().unwrap_or("");
            if first_segment.contains(':') {
                return Err("first path segment in URL cannot contain colon".to_string());
            }
        }

        if let Some(host) = &reference.host {
            check_port(host)?;
        }

        Ok(reference)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scheme) = &self.scheme {
            write!(f, "{}:", scheme)?;
        }
        if let Some(host) = &self.host {
            write!(f, "//{}", host)?;
            if !self.path.is_empty() && !self.path.starts_with('/') {
                f.write_str("/")?;
            }
        }
        f.write_str(&self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{}", query)?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{}", fragment)?;
        }
        Ok(())
    }
}

fn check_escapes(raw: &str) -> Result<(), String> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                let end = (i + 3).min(raw.len());
                return Err(format!("invalid URL escape {:?}", raw.get(i..end).unwrap_or("%")));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

fn check_port(host: &str) -> Result<(), String> {
    // drop userinfo, and skip over IPv6 literals like [::1]:8080
    let host = host.rsplit('@').next().unwrap_or(host);
    let after_brackets = match host.rfind(']') {
        Some(end) => &host[end + 1..],
        None => host,
    };

    if let Some(colon) = after_brackets.rfind(':') {
        let port = &after_brackets[colon + 1..];
        if !port.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("invalid port {:?} after host", port));
        }
    }
    Ok(())
}

// Resolves `reference` (as found on the page `base`) to an absolute URL
//
// Parameters:
//   base: URL of the page the reference was found on
//   reference: raw href/src value
//   unescape_entities: decode HTML entities (&amp; -> &) in both first
//
// Examples:
//   ("https://www.example.com", "home.html") -> "https://www.example.com/home.html"
//   ("https://www.example.com/", "../../home.html?lang=ja")
//       -> "https://www.example.com/home.html?lang=ja"
pub fn resolve(base: &str, reference: &str, unescape_entities: bool) -> Result<String, MirrorError> {
    let (base, reference) = if unescape_entities {
        (
            html_escape::decode_html_entities(base).into_owned(),
            html_escape::decode_html_entities(reference).into_owned(),
        )
    } else {
        (base.to_string(), reference.to_string())
    };

    let mut child = Reference::parse(&reference).map_err(|reason| MirrorError::InvalidReference {
        reference: reference.clone(),
        reason,
    })?;

    if child.host.as_deref().is_some_and(|host| host.starts_with("http")) {
        return Ok(child.to_string());
    }

    let parent = Reference::parse(&base).map_err(|reason| MirrorError::InvalidBase {
        base: base.clone(),
        reason,
    })?;

    if child.host.is_none() {
        child.host = parent.host.clone();
    }
    if child.scheme.is_none() {
        child.scheme = parent.scheme.clone();
    }

    // cross-site: nothing to join against
    if child.host != parent.host {
        return Ok(child.to_string());
    }

    child.path = resolve_path(&parent.path, &child.path);
    if child.path == "." {
        child.path = "/".to_string();
    }

    Ok(child.to_string())
}

// Joins `resource` onto the directory of `page`
//
// Examples:
//   ("/cat/list.html", "../../images/logo.png")       -> "/images/logo.png"
//   ("/cat/subcats/list.html", "./images/logo.png")   -> "/cat/subcats/images/logo.png"
//   ("/cat/list.html", "/logo.png")                   -> "/logo.png"
pub fn resolve_path(page: &str, resource: &str) -> String {
    if resource.starts_with('/') {
        return resource.to_string();
    }

    let dir = dir_of(page);
    if resource.is_empty() {
        return dir;
    }

    clean_path(&format!("{}/{}", dir, resource))
}

// "/cat/subcats/list.html" -> "/cat/subcats", "list.html" -> ".", "/" -> "/"
fn dir_of(path: &str) -> String {
    match path.rfind('/') {
        Some(slash) => clean_path(&path[..=slash]),
        None => ".".to_string(),
    }
}

// Lexical path cleanup: collapses "//", drops "." and resolves ".." where
// there is something to go back to. Rooted paths can't climb above "/";
// relative ones keep their leading "..".
fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}
