//! Page persistence.
//!
//! Each page is one file, `<slug>.txt`, in the pages directory, holding
//! the raw body bytes with no header or metadata. The store is the only
//! persistence layer: an in-memory [`Page`] is a transient caller-owned
//! copy and nothing is cached between requests.
//!
//! Saves are atomic (write to a temp file in the same directory, then
//! rename over the destination), so a concurrent reader never observes
//! a partially written payload. Concurrent saves to the same slug are
//! last-write-wins; there is no locking and no versioning.

use std::borrow::Cow;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use thiserror::Error;

/// File extension for stored pages.
const PAGE_EXT: &str = "txt";

/// Page persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No payload exists for the slug. Read failures of any kind
    /// collapse into this variant: the caller cannot distinguish a
    /// transient I/O miss from a page that was never saved.
    #[error("no page stored under `{0}`")]
    NotFound(String),

    /// The slug could address something outside the pages directory.
    #[error("invalid slug `{0}`")]
    InvalidSlug(String),

    /// A write failed. Fatal to the request, never to the process.
    #[error("failed to write page `{0}`")]
    Io(String, #[source] std::io::Error),
}

/// A plain-text page: a slug and its raw body bytes.
///
/// No encoding is assumed for the body and no size limit is enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub slug: String,
    pub body: Vec<u8>,
}

impl Page {
    pub fn new(slug: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            slug: slug.into(),
            body: body.into(),
        }
    }

    /// Body as text for rendering. Non-UTF-8 bytes degrade to U+FFFD
    /// in HTML output only; the stored bytes are untouched.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Maps slugs to page files under a single directory.
#[derive(Debug, Clone)]
pub struct PageStore {
    dir: PathBuf,
}

impl PageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Read the page stored under `slug`.
    ///
    /// Every failure to produce the payload, including I/O errors, is
    /// reported as [`StoreError::NotFound`] except for slugs rejected
    /// by validation.
    pub fn load(&self, slug: &str) -> Result<Page, StoreError> {
        validate_slug(slug)?;
        match fs::read(self.page_path(slug)) {
            Ok(body) => Ok(Page::new(slug, body)),
            Err(_) => Err(StoreError::NotFound(slug.to_owned())),
        }
    }

    /// Write `page.body` under `page.slug`, creating or fully
    /// overwriting the file.
    ///
    /// The body goes to a temp file in the pages directory first and is
    /// renamed into place, so readers see either the old payload or the
    /// complete new one.
    pub fn save(&self, page: &Page) -> Result<(), StoreError> {
        validate_slug(&page.slug)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| StoreError::Io(page.slug.clone(), e))?;
        tmp.write_all(&page.body)
            .map_err(|e| StoreError::Io(page.slug.clone(), e))?;
        tmp.persist(self.page_path(&page.slug))
            .map_err(|e| StoreError::Io(page.slug.clone(), e.error))?;
        Ok(())
    }

    fn page_path(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{slug}.{PAGE_EXT}"))
    }
}

/// Reject slugs that could escape the pages directory.
///
/// Without separators a slug names exactly one path component, and a
/// leading dot is refused so hidden files and `..` stay unreachable.
fn validate_slug(slug: &str) -> Result<(), StoreError> {
    if slug.is_empty() || slug.starts_with('.') || slug.contains(['/', '\\']) {
        return Err(StoreError::InvalidSlug(slug.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, PageStore) {
        let dir = TempDir::new().unwrap();
        let store = PageStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let (_dir, store) = store();
        let page = Page::new("abc123", "hello\nworld");

        store.save(&page).unwrap();
        let loaded = store.load("abc123").unwrap();

        assert_eq!(loaded, page);
    }

    #[test]
    fn test_round_trip_preserves_raw_bytes() {
        let (_dir, store) = store();
        let body: Vec<u8> = vec![0x00, 0xff, 0xfe, b'a', 0x80];
        store.save(&Page::new("bin", body.clone())).unwrap();

        assert_eq!(store.load("bin").unwrap().body, body);
    }

    #[test]
    fn test_load_missing_slug_is_not_found() {
        let (_dir, store) = store();
        assert!(matches!(
            store.load("nope"),
            Err(StoreError::NotFound(s)) if s == "nope"
        ));
    }

    #[test]
    fn test_save_overwrites_previous_body() {
        let (_dir, store) = store();
        store.save(&Page::new("p", "first")).unwrap();
        store.save(&Page::new("p", "second")).unwrap();

        assert_eq!(store.load("p").unwrap().body, b"second");
    }

    #[test]
    fn test_page_file_layout() {
        let (dir, store) = store();
        store.save(&Page::new("xyz", "payload")).unwrap();

        // Raw bytes, no metadata, named <slug>.txt
        let on_disk = fs::read(dir.path().join("xyz.txt")).unwrap();
        assert_eq!(on_disk, b"payload");
    }

    #[test]
    fn test_traversal_slugs_rejected() {
        let (dir, store) = store();
        for slug in ["../evil", "a/b", "a\\b", "..", ".hidden", ""] {
            assert!(
                matches!(store.load(slug), Err(StoreError::InvalidSlug(_))),
                "load accepted `{slug}`"
            );
            assert!(
                matches!(
                    store.save(&Page::new(slug, "x")),
                    Err(StoreError::InvalidSlug(_))
                ),
                "save accepted `{slug}`"
            );
        }
        // Nothing escaped into the parent of the pages dir
        assert!(!dir.path().parent().unwrap().join("evil.txt").exists());
    }

    #[test]
    fn test_save_into_missing_dir_is_io_error() {
        let dir = TempDir::new().unwrap();
        let store = PageStore::new(dir.path().join("does-not-exist"));

        assert!(matches!(
            store.save(&Page::new("p", "x")),
            Err(StoreError::Io(..))
        ));
    }

    #[test]
    fn test_body_text_lossy_conversion() {
        let page = Page::new("p", vec![b'h', b'i', 0xff]);
        assert_eq!(page.body_text(), "hi\u{fffd}");
    }
}
