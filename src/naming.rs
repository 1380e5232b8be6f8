// src/naming.rs
// =============================================================================
// Maps a URL to the relative file path it is saved under.
//
// Layout:
//   <bucket>/<host>/<path segments...>
//
// The bucket comes from a guess at what the URL points to:
//   stylesheets -> assets/css        scripts -> assets/js
//   fonts       -> assets/fonts      images  -> assets/images/<png|jpg|...>
//   videos      -> media/videos/<x>  audio   -> media/audios/<x>
//   pdf, epub.. -> docs/<x>          archives -> archives/<x>
// and otherwise the file extension, with "html" for pages without one.
//
// Every segment is cleaned of characters that are awkward in file names
// (whitespace, quotes, brackets, ?, &, :, ...), each run replaced by "-".
// The same URL always yields the same path.
// =============================================================================

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use url::Url;

static RE_UGLY: OnceLock<Regex> = OnceLock::new();
static RE_HYPHENS: OnceLock<Regex> = OnceLock::new();

/// Directory names of the top-level buckets (--dir-assets etc.)
#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub assets: String,
    pub media: String,
    pub docs: String,
    pub archives: String,
    /// Bucket for pages and anything without a better guess
    pub pages: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            assets: "assets".to_string(),
            media: "media".to_string(),
            docs: "docs".to_string(),
            archives: "archives".to_string(),
            pages: "html".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Root {
    Assets,
    Media,
    Docs,
    Archives,
}

// (pattern, root, sub directory). First match wins.
const BUCKETS: &[(&str, Root, &str)] = &[
    // Google Fonts and Material Icons serve CSS from extension-less URLs
    ("fonts.googleapis.com/css2", Root::Assets, "css"),
    ("fonts.googleapis.com/css", Root::Assets, "css"),
    ("fonts.googleapis.com/icon", Root::Assets, "css"),
    (".css", Root::Assets, "css"),
    (".js", Root::Assets, "js"),
    (".woff2", Root::Assets, "fonts"),
    (".woff", Root::Assets, "fonts"),
    (".ttf", Root::Assets, "fonts"),
    (".otf", Root::Assets, "fonts"),
    (".eot", Root::Assets, "fonts"),
    (".svg", Root::Assets, "svg"),
    (".png", Root::Assets, "images/png"),
    (".jpg", Root::Assets, "images/jpg"),
    (".jpeg", Root::Assets, "images/jpg"),
    (".gif", Root::Assets, "images/gif"),
    (".webp", Root::Assets, "images/webp"),
    (".mp4", Root::Media, "videos/mp4"),
    (".m4v", Root::Media, "videos/mp4"),
    (".mkv", Root::Media, "videos/mkv"),
    (".wmv", Root::Media, "videos/wmv"),
    (".mov", Root::Media, "videos/mov"),
    (".avi", Root::Media, "videos/avi"),
    (".flv", Root::Media, "videos/flv"),
    (".ogv", Root::Media, "videos/ogv"),
    (".ogx", Root::Media, "videos/ogx"),
    (".webm", Root::Media, "videos/webm"),
    (".mp3", Root::Media, "audios/mp3"),
    (".mp2", Root::Media, "audios/mp2"),
    (".m4a", Root::Media, "audios/m4a"),
    (".aac", Root::Media, "audios/aac"),
    (".ogg", Root::Media, "audios/ogg"),
    (".oga", Root::Media, "audios/oga"),
    (".wma", Root::Media, "audios/wma"),
    (".wav", Root::Media, "audios/wav"),
    (".flac", Root::Media, "audios/flac"),
    (".pdf", Root::Docs, "pdf"),
    (".epub", Root::Docs, "epub"),
    (".docx", Root::Docs, "docx"),
    (".doc", Root::Docs, "doc"),
    (".odt", Root::Docs, "odt"),
    (".zip", Root::Archives, "zip"),
    (".tar", Root::Archives, "tar"),
    (".tgz", Root::Archives, "tgz"),
    (".gz", Root::Archives, "gz"),
    (".rar", Root::Archives, "rar"),
    (".7z", Root::Archives, "7z"),
    (".deb", Root::Archives, "deb"),
    (".rpm", Root::Archives, "rpm"),
];

// Server-side page extensions that are really HTML documents
const PAGE_EXTENSIONS: &[&str] = &["html", "htm", "xhtml", "shtml", "php", "asp", "aspx", "jsp", "cgi"];

impl Layout {
    fn root(&self, root: Root) -> &str {
        match root {
            Root::Assets => &self.assets,
            Root::Media => &self.media,
            Root::Docs => &self.docs,
            Root::Archives => &self.archives,
        }
    }

    // Bucket directory for `url`, e.g. "assets/css" or "html"
    pub fn bucket(&self, url: &str) -> String {
        let lowered = url.to_ascii_lowercase();

        for (pattern, root, sub) in BUCKETS {
            if contains_token(&lowered, pattern) {
                return format!("{}/{}", self.root(*root), sub);
            }
        }

        match extension(&lowered) {
            Some(ext) if !PAGE_EXTENSIONS.contains(&ext.as_str()) => ext,
            _ => self.pages.clone(),
        }
    }

    pub fn is_page_bucket(&self, bucket: &str) -> bool {
        bucket == self.pages
    }
}

// Like `haystack.contains(token)`, but ".js" must not be followed by another
// letter or digit, so it doesn't fire on ".json"
fn contains_token(haystack: &str, token: &str) -> bool {
    haystack.match_indices(token).any(|(start, _)| {
        haystack[start + token.len()..]
            .chars()
            .next()
            .map_or(true, |next| !next.is_ascii_alphanumeric())
    })
}

// Extension of the last path segment, already cleaned for use as a directory
fn extension(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or("").to_string(),
    };
    let last = path.rsplit('/').next()?;
    let (stem, ext) = last.rsplit_once('.')?;
    if stem.is_empty() && ext.is_empty() {
        return None;
    }
    let ext = pretty_segment(ext);
    if ext.is_empty() || ext == "-" {
        None
    } else {
        Some(ext)
    }
}

// Replaces every run of unsafe characters with a single "-"
pub fn pretty_segment(ugly: &str) -> String {
    let re_ugly = RE_UGLY.get_or_init(|| {
        Regex::new(r#"[;+\s"'`%?!~<>{}\[\]\\:,|*&^$@()]+"#).expect("ugly pattern is valid")
    });
    let re_hyphens = RE_HYPHENS.get_or_init(|| Regex::new(r"-{2,}").expect("hyphen pattern is valid"));

    let replaced = re_ugly.replace_all(ugly, "-");
    re_hyphens.replace_all(&replaced, "-").into_owned()
}

// Maps `url` to its relative path inside the mirror
//
// Examples (default layout):
//   "http://example.com/home.html"         -> "html/example.com/home.html"
//   "https://example.com/static/site.css"  -> "assets/css/example.com/static/site.css"
//   "http://example.com/"                  -> "html/example.com/index.html"
pub fn name_path(url: &str, layout: &Layout) -> String {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);

    let raw_segments: Vec<&str> = rest.split('/').collect();
    let last = raw_segments.len() - 1;

    let mut parts = vec![layout.bucket(url)];
    for (i, segment) in raw_segments.iter().enumerate() {
        let cleaned = pretty_segment(segment);
        match cleaned.as_str() {
            "" if i == last => parts.push("index.html".to_string()),
            "" | "." | ".." => {}
            _ => parts.push(cleaned),
        }
    }

    parts.join("/")
}
