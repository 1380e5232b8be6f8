// src/scope/content.rs
// =============================================================================
// Decisions based on what the server says it sent us (Content-Type).
//
// - archives (zip, tar, rpm, ...) are skipped unless --dl-archive
// - audio and video are skipped unless --dl-media
// - only HTML is scanned for links and rewritten for offline browsing
// =============================================================================

use mime::Mime;

const ARCHIVE_TYPES: &[&str] = &[
    "application/java-archive",
    "application/x-7z-compressed",
    "application/x-rar-compressed",
    "application/vnd.debian.binary-package",
    "application/x-redhat-package-manager",
    "application/zip",
    "application/x-gzip",
    "application/x-gtar",
    "application/x-shar",
    "application/x-stuffit",
    "application/x-tar",
    "application/x-ustar",
    "application/gzip",
    "application/x-cpio",
    "application/x-bcpio",
    "application/x-perfmon",
    "application/x-compress",
    "application/x-compressed",
];

// "Text/HTML; charset=utf-8" -> "text/html"
fn essence(content_type: &str) -> String {
    match content_type.parse::<Mime>() {
        Ok(parsed) => parsed.essence_str().to_ascii_lowercase(),
        Err(_) => content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase(),
    }
}

pub fn is_archive(content_type: &str) -> bool {
    let essence = essence(content_type);
    ARCHIVE_TYPES.contains(&essence.as_str())
}

pub fn is_media(content_type: &str) -> bool {
    let essence = essence(content_type);
    essence.starts_with("audio/") || essence.starts_with("video/")
}

// Some(true)/Some(false) when the header says so, None when there's no header
pub fn is_html(content_type: Option<&str>) -> Option<bool> {
    let essence = essence(content_type?);
    Some(essence == "text/html" || essence == "application/xhtml+xml")
}

/// What kinds of downloads the user opted into
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentPolicy {
    pub download_media: bool,
    pub download_archives: bool,
}

impl ContentPolicy {
    // Should a response with this Content-Type be stored?
    pub fn allows(&self, content_type: Option<&str>) -> bool {
        let Some(content_type) = content_type else {
            return true;
        };

        if !self.download_archives && is_archive(content_type) {
            return false;
        }
        if !self.download_media && is_media(content_type) {
            return false;
        }
        true
    }
}
