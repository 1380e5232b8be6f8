// src/crawl/store.rs
// =============================================================================
// Writing mirrored files to disk.
//
// A file is first written to a temporary file next to its destination and
// only renamed into place once every byte is on disk. If anything fails the
// temporary file is removed, so the mirror never holds half-written files.
//
// Paths come from the Path Namer and are always relative to the mirror root.
// Anything that would land outside the root ("..", absolute paths) is refused.
// =============================================================================

use async_trait::async_trait;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::Builder;
use tracing::debug;

use crate::error::MirrorError;

/// Capability to durably write `body` at a mirror-relative `path`
#[async_trait]
pub trait Store: Send + Sync {
    async fn store(&self, body: &[u8], path: &str) -> Result<(), MirrorError>;
}

pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    // Absolute destination of a mirror-relative path
    pub fn destination(&self, path: &str) -> Result<PathBuf, MirrorError> {
        let relative = Path::new(path);
        let escapes = path.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

        if escapes {
            return Err(MirrorError::store(
                relative,
                io::Error::new(io::ErrorKind::InvalidInput, "path escapes the mirror root"),
            ));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl Store for DiskStore {
    async fn store(&self, body: &[u8], path: &str) -> Result<(), MirrorError> {
        let destination = self.destination(path)?;
        let body = body.to_vec();

        // File system calls block, so keep them off the async worker threads
        let written = destination.clone();
        tokio::task::spawn_blocking(move || write_atomically(&written, &body))
            .await
            .map_err(|e| MirrorError::store(&destination, io::Error::new(io::ErrorKind::Other, e)))?
            .map_err(|e| MirrorError::store(&destination, e))?;

        debug!(path = %destination.display(), "stored");
        Ok(())
    }
}

fn write_atomically(destination: &Path, body: &[u8]) -> io::Result<()> {
    let dir = destination
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent"))?;
    std::fs::create_dir_all(dir)?;

    // NamedTempFile deletes itself when dropped, which covers every early return
    let mut tmp = Builder::new().prefix(".site-mirror-").tempfile_in(dir)?;
    tmp.write_all(body)?;
    tmp.as_file().sync_all()?;
    tmp.persist(destination).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());

        store
            .store(b"<html></html>", "html/example.com/docs/index.html")
            .await
            .unwrap();

        let saved = std::fs::read(dir.path().join("html/example.com/docs/index.html")).unwrap();
        assert_eq!(saved, b"<html></html>");
    }

    #[tokio::test]
    async fn test_store_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());

        store.store(b"first", "html/example.com/a.html").await.unwrap();
        store.store(b"second", "html/example.com/a.html").await.unwrap();

        let saved = std::fs::read(dir.path().join("html/example.com/a.html")).unwrap();
        assert_eq!(saved, b"second");

        // no temporary files left behind
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("html/example.com"))
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(".site-mirror-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_failed_store_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());

        // "html/example.com/a" is a file, so it can't also be a directory
        store.store(b"page", "html/example.com/a").await.unwrap();
        let err = store.store(b"child", "html/example.com/a/b.html").await.unwrap_err();

        assert!(matches!(err, MirrorError::StoreFailure { .. }));
        assert_eq!(std::fs::read(dir.path().join("html/example.com/a")).unwrap(), b"page");
    }

    #[test]
    fn test_paths_cannot_escape_root() {
        let store = DiskStore::new("/tmp/mirror");

        assert!(store.destination("../etc/passwd").is_err());
        assert!(store.destination("/etc/passwd").is_err());
        assert!(store.destination("html/../../x").is_err());
        assert!(store.destination("").is_err());
        assert_eq!(
            store.destination("html/example.com/index.html").unwrap(),
            PathBuf::from("/tmp/mirror/html/example.com/index.html")
        );
    }
}
