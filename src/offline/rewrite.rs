// src/offline/rewrite.rs
// =============================================================================
// Rewrites saved pages so they don't phone home when browsed offline.
//
// Every href="..." / src="..." pointing at a host from the offline list is
// redirected to 0.0.0.0, keeping the original host in the path so the
// reference stays recognisable:
//
//   src="https://cdn.tracker.com/t.js?id=1"
//   -> src="https://0.0.0.0/cdn.tracker.com/t.js?id=1"
//
// Values that don't parse at all become "#0". Nothing else in the document
// changes. Running the rewrite twice gives the same result as running it once.
//
// The same file also holds the small attribute/tag cleanups applied to saved
// pages (integrity and crossorigin break once assets are served locally).
// =============================================================================

use regex::bytes::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

use super::hosts::OfflineHosts;
use crate::links::Reference;

pub const LOOPBACK_HOST: &str = "0.0.0.0";

static RE_FILTERS: OnceLock<Vec<Regex>> = OnceLock::new();
static RE_CLEAN_ATTRS: OnceLock<Vec<Regex>> = OnceLock::new();
static RE_PINGBACK: OnceLock<Regex> = OnceLock::new();

fn filters() -> &'static [Regex] {
    RE_FILTERS.get_or_init(|| {
        [
            r#"(?is-u)(src=")([^<>"]+)(")"#,
            r#"(?is-u)(src=')([^<>']+)(')"#,
            r#"(?is-u)(href=")([^<>"]+)(")"#,
            r#"(?is-u)(href=')([^<>']+)(')"#,
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("offline filter pattern is valid"))
        .collect()
    })
}

// Rewrites references to offline hosts inside `document`
//
// Works on raw bytes, so pages in any encoding get the same treatment.
pub fn rewrite_for_offline(document: &[u8], hosts: &OfflineHosts) -> Vec<u8> {
    let mut data = document.to_vec();

    for re in filters() {
        data = re
            .replace_all(&data, |caps: &Captures| rewrite_value(caps, hosts))
            .into_owned();
    }

    data
}

fn rewrite_value(caps: &Captures, hosts: &OfflineHosts) -> Vec<u8> {
    let (open, value, close) = (&caps[1], &caps[2], &caps[3]);
    let with_value = |value: &[u8]| [open, value, close].concat();

    let parsed = match std::str::from_utf8(value).map(Reference::parse) {
        Ok(Ok(parsed)) => parsed,
        _ => return with_value(b"#0"),
    };

    let host = parsed.host.as_deref().unwrap_or("");
    if host == LOOPBACK_HOST || !hosts.matches(host) {
        return caps[0].to_vec();
    }

    let scheme = parsed
        .scheme
        .as_deref()
        .map(|scheme| format!("{}:", scheme))
        .unwrap_or_default();

    let mut request_uri = if parsed.path.is_empty() {
        "/".to_string()
    } else if parsed.path.starts_with('/') {
        parsed.path.clone()
    } else {
        format!("/{}", parsed.path)
    };
    if let Some(query) = &parsed.query {
        request_uri.push('?');
        request_uri.push_str(query);
    }

    with_value(format!("{}//{}/{}{}", scheme, LOOPBACK_HOST, host, request_uri).as_bytes())
}

// Drops crossorigin="..", integrity=".." and type="text/javascript" from tags
pub fn strip_integrity_attrs(document: &[u8]) -> Vec<u8> {
    let patterns = RE_CLEAN_ATTRS.get_or_init(|| {
        [
            r#"(?is-u)(<[^<>]+)(\scrossorigin=["'][^"'<>]*["'])"#,
            r#"(?is-u)(<[^<>]+)(\sintegrity=["'][^"'<>]*["'])"#,
            r#"(?is-u)(<[^<>]+)(\stype=["']\s*text/javascript\s*["'])"#,
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("attribute pattern is valid"))
        .collect()
    });

    let mut data = document.to_vec();
    for re in patterns {
        data = re.replace_all(&data, &b"${1}"[..]).into_owned();
    }
    data
}

// Drops <meta ... rel="pingback" ...> tags
pub fn strip_pingback_meta(document: &[u8]) -> Cow<'_, [u8]> {
    let re = RE_PINGBACK.get_or_init(|| {
        Regex::new(r#"(?is-u)<meta[^<>]+rel="pingback"[^<>]*>"#).expect("pingback pattern is valid")
    });
    re.replace_all(document, &b""[..])
}
