// src/links/normalize.rs
// =============================================================================
// Turns whatever the user (or a page) gave us into a fetchable absolute URL.
//
// Rules:
// - No scheme? Assume http ("example.com/home.html" -> "http://example.com/home.html")
// - Only http and https survive; ftp:, mailto:, javascript: etc. are rejected
// - The result goes through url::Url, so hosts are lower-cased and unsafe
//   characters are percent-encoded the same way every time
// =============================================================================

use url::Url;

use crate::error::MirrorError;

// Normalizes a raw URL string
//
// Returns: the canonical absolute URL, always starting with http:// or https://
//
// Example:
//   "example.com/home.html" -> "http://example.com/home.html"
//   "ftp://example.com/"    -> Err(UnsupportedScheme)
pub fn normalize(raw: &str) -> Result<String, MirrorError> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(MirrorError::MalformedUrl {
            url: raw.to_string(),
            reason: "empty URL".to_string(),
        });
    }

    let candidate = match scheme_of(trimmed) {
        Some(scheme) => {
            check_scheme(trimmed, scheme)?;
            trimmed.to_string()
        }
        // protocol-relative: "//cdn.example.com/app.js"
        None if trimmed.starts_with("//") => format!("http:{}", trimmed),
        None => format!("http://{}", trimmed),
    };

    let parsed = Url::parse(&candidate).map_err(|e| MirrorError::MalformedUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    check_scheme(trimmed, parsed.scheme())?;

    Ok(parsed.to_string())
}

fn check_scheme(url: &str, scheme: &str) -> Result<(), MirrorError> {
    if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") {
        Ok(())
    } else {
        Err(MirrorError::UnsupportedScheme {
            url: url.to_string(),
            scheme: scheme.to_ascii_lowercase(),
        })
    }
}

// Finds an explicit scheme at the start of `s`, if there is one.
//
// A scheme is a letter followed by letters, digits, '+', '-' or '.', then ':'.
// "example.com:8080/x" looks like one too, so a colon followed by a digit is
// read as a port instead.
pub(crate) fn scheme_of(s: &str) -> Option<&str> {
    let colon = s.find(':')?;
    let candidate = &s[..colon];

    let mut chars = candidate.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }

    let rest = &s[colon + 1..];
    if rest.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    Some(candidate)
}
