//! Book loading.
//!
//! Opens an EPUB (or a directory of unpacked markup files) and returns its
//! content documents in reading order. Paths are kept as identifiers only;
//! the paginator never opens files itself.

use anyhow::{Context, Result, bail};
use epub::doc::EpubDoc;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

const MARKUP_EXTENSIONS: [&str; 3] = ["xhtml", "html", "htm"];

/// One content document of a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFile {
    pub path: String,
    pub markup: String,
}

/// The ordered content documents of a book.
#[derive(Debug, Clone, Default)]
pub struct BookSource {
    pub files: Vec<BookFile>,
}

impl BookSource {
    pub fn paths(&self) -> Vec<String> {
        self.files.iter().map(|file| file.path.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn into_documents(self) -> impl Iterator<Item = (String, String)> {
        self.files.into_iter().map(|file| (file.path, file.markup))
    }
}

/// Load a book from an `.epub` archive or a directory of markup files.
pub fn load_book(path: &Path) -> Result<BookSource> {
    let source = if path.is_dir() {
        load_markup_dir(path)?
    } else if is_epub(path) {
        load_epub(path)?
    } else {
        bail!(
            "Unsupported book format at {} (expected .epub or a directory)",
            path.display()
        );
    };

    if source.is_empty() {
        bail!("No content documents found in {}", path.display());
    }
    info!(
        path = %path.display(),
        files = source.len(),
        "Finished loading book"
    );
    Ok(source)
}

/// Walk the EPUB spine in reading order.
pub fn load_epub(path: &Path) -> Result<BookSource> {
    info!(path = %path.display(), "Loading EPUB content");
    let mut doc =
        EpubDoc::new(path).with_context(|| format!("Failed to open EPUB at {}", path.display()))?;

    let mut files = Vec::new();
    loop {
        let current = doc.get_current_path();
        match (current, doc.get_current_str()) {
            (Some(item_path), Some((markup, _mime))) => {
                let item_path = item_path.to_string_lossy().into_owned();
                debug!(
                    file = files.len(),
                    path = %item_path,
                    bytes = markup.len(),
                    "Read spine item"
                );
                files.push(BookFile {
                    path: item_path,
                    markup,
                });
            }
            _ => warn!(index = files.len(), "Skipping unreadable spine item"),
        }

        if !doc.go_next() {
            break;
        }
    }

    Ok(BookSource { files })
}

/// Markup files in a directory, ordered by file name.
pub fn load_markup_dir(dir: &Path) -> Result<BookSource> {
    info!(path = %dir.display(), "Loading unpacked book directory");
    let mut paths = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?
    {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_file() && is_markup(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let markup = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        debug!(path = %path.display(), bytes = markup.len(), "Read markup file");
        files.push(BookFile {
            path: path.to_string_lossy().into_owned(),
            markup,
        });
    }
    Ok(BookSource { files })
}

fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn is_epub(path: &Path) -> bool {
    matches!(extension_lowercase(path), Some(ext) if ext == "epub")
}

fn is_markup(path: &Path) -> bool {
    matches!(
        extension_lowercase(path),
        Some(ext) if MARKUP_EXTENSIONS.contains(&ext.as_str())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_files_load_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ch02.xhtml"), "<p>two</p>").unwrap();
        fs::write(dir.path().join("ch01.XHTML"), "<p>one</p>").unwrap();
        fs::write(dir.path().join("ch03.htm"), "<p>three</p>").unwrap();
        fs::write(dir.path().join("cover.jpg"), [0u8, 1, 2]).unwrap();
        fs::write(dir.path().join("style.css"), "p {}").unwrap();

        let book = load_book(dir.path()).unwrap();
        let names: Vec<String> = book
            .files
            .iter()
            .map(|file| {
                Path::new(&file.path)
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(names, vec!["ch01.XHTML", "ch02.xhtml", "ch03.htm"]);
        assert_eq!(book.files[1].markup, "<p>two</p>");
    }

    #[test]
    fn directory_without_markup_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "plain").unwrap();
        let err = load_book(dir.path()).unwrap_err();
        assert!(err.to_string().contains("No content documents"));
    }

    #[test]
    fn unsupported_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.pdf");
        fs::write(&path, "%PDF").unwrap();
        assert!(load_book(&path).is_err());
    }

    #[test]
    fn extension_checks_ignore_case() {
        assert!(is_epub(Path::new("Book.EPUB")));
        assert!(is_markup(Path::new("a/b/c.Html")));
        assert!(!is_markup(Path::new("a/b/c.xml")));
    }
}
