//! The page table produced by the paginator.
//!
//! A `BookLayout` maps 1-based virtual page numbers onto (file, scroll
//! fraction) pairs. It is built one measured file at a time and is read-only
//! once every file has been appended.

use super::error::PaginationError;
use serde::Serialize;
use std::collections::HashMap;
use std::ops::RangeInclusive;

/// URI scheme stripped from file identifiers before they are used as keys.
pub const FILE_URI_SCHEME: &str = "file://";

/// Upper bound on the virtual pages a single file may span.
pub const MAX_PAGES_PER_FILE: usize = 100_000;

/// Strip a leading `file://` so URIs and plain paths address the same file.
pub fn resolve_path(identifier: &str) -> &str {
    identifier
        .strip_prefix(FILE_URI_SCHEME)
        .unwrap_or(identifier)
}

/// One measured file of the book.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileEntry {
    pub path: String,
    pub rendered_height_px: f64,
    pub pages_in_file: usize,
    /// Fraction of the file's last virtual page left empty, in `[0, 1)`.
    pub remainder_factor: f64,
    pub first_page: usize,
}

impl FileEntry {
    pub fn last_page(&self) -> usize {
        self.first_page + self.pages_in_file - 1
    }

    pub fn pages(&self) -> RangeInclusive<usize> {
        self.first_page..=self.last_page()
    }
}

/// Where a virtual page sits inside its file's scroll range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageRecord {
    /// Index into the layout's file list.
    pub file: usize,
    pub position_fraction: f64,
    pub length_fraction: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookLayout {
    single_page_height_px: f64,
    file_list: Vec<String>,
    files: Vec<FileEntry>,
    /// `pages[n - 1]` describes virtual page `n`.
    pages: Vec<PageRecord>,
    total_height_px: f64,
    #[serde(skip)]
    by_path: HashMap<String, usize>,
}

impl BookLayout {
    pub(super) fn new(single_page_height_px: f64, file_list: &[String]) -> Self {
        let file_list: Vec<String> = file_list
            .iter()
            .map(|file| resolve_path(file).to_string())
            .collect();
        let mut by_path = HashMap::with_capacity(file_list.len());
        for (idx, path) in file_list.iter().enumerate() {
            // Duplicate spine entries resolve to their first occurrence.
            by_path.entry(path.clone()).or_insert(idx);
        }
        BookLayout {
            single_page_height_px,
            file_list,
            files: Vec::new(),
            pages: Vec::new(),
            total_height_px: 0.0,
            by_path,
        }
    }

    /// Append the next file in reading order, given its rendered height.
    pub(super) fn append_measured(&mut self, rendered_height_px: f64) -> &FileEntry {
        let file = self.files.len();
        let single = self.single_page_height_px;

        let pages = if rendered_height_px <= single {
            1.0
        } else {
            rendered_height_px / single
        };
        let pages_in_file = pages.ceil() as usize;
        let first_page = self.pages.len() + 1;

        // Positions divide by the whole page count while lengths divide by the
        // fractional one, so the two do not partition the file identically.
        for i in 1..=pages_in_file {
            let local = i as f64;
            let length_fraction = if pages - local < 0.0 {
                (pages - pages.floor()) / pages
            } else {
                1.0 / pages
            };
            let position_fraction = (local - 1.0) / pages_in_file as f64;
            self.pages.push(PageRecord {
                file,
                position_fraction,
                length_fraction,
            });
        }

        self.total_height_px += rendered_height_px;
        self.files.push(FileEntry {
            path: self.file_list[file].clone(),
            rendered_height_px,
            pages_in_file,
            remainder_factor: pages_in_file as f64 - pages,
            first_page,
        });
        &self.files[file]
    }

    pub(super) fn is_complete(&self) -> bool {
        self.files.len() == self.file_list.len()
    }

    pub fn single_page_height(&self) -> f64 {
        self.single_page_height_px
    }

    pub fn total_pagecount(&self) -> usize {
        self.pages.len()
    }

    pub fn total_height(&self) -> f64 {
        self.total_height_px
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Iterate `(page_number, record)` pairs in page order.
    pub fn pages(&self) -> impl Iterator<Item = (usize, &PageRecord)> {
        self.pages.iter().enumerate().map(|(idx, rec)| (idx + 1, rec))
    }

    pub fn page(&self, page: usize) -> Result<&PageRecord, PaginationError> {
        if page == 0 || page > self.pages.len() {
            return Err(PaginationError::PageOutOfRange {
                page,
                page_count: self.pages.len(),
            });
        }
        Ok(&self.pages[page - 1])
    }

    pub fn file_for_page(&self, page: usize) -> Result<&str, PaginationError> {
        let record = self.page(page)?;
        Ok(self.files[record.file].path.as_str())
    }

    pub fn scroll_position_for_page(&self, page: usize) -> Result<f64, PaginationError> {
        Ok(self.page(page)?.position_fraction)
    }

    pub fn scroll_length_for_page(&self, page: usize) -> Result<f64, PaginationError> {
        Ok(self.page(page)?.length_fraction)
    }

    /// Look up a measured file by path or `file://` URI.
    pub fn file(&self, path: &str) -> Result<&FileEntry, PaginationError> {
        let resolved = resolve_path(path);
        self.by_path
            .get(resolved)
            .and_then(|idx| self.files.get(*idx))
            .ok_or_else(|| PaginationError::FileNotFound(resolved.to_string()))
    }

    pub fn pagecount_for_file(&self, path: &str) -> Result<usize, PaginationError> {
        Ok(self.file(path)?.pages_in_file)
    }

    pub fn remainder_for_file(&self, path: &str) -> Result<f64, PaginationError> {
        Ok(self.file(path)?.remainder_factor)
    }

    pub fn base_page_for_file(&self, path: &str) -> Result<usize, PaginationError> {
        Ok(self.file(path)?.first_page)
    }

    /// The file following `path` in reading order, if any.
    pub fn next_file(&self, path: &str) -> Option<&str> {
        let idx = *self.by_path.get(resolve_path(path))?;
        self.file_list.get(idx + 1).map(String::as_str)
    }

    /// Whether two pages live in the same file. Out-of-range pages never do.
    pub fn same_file(&self, a: usize, b: usize) -> bool {
        match (self.page(a), self.page(b)) {
            (Ok(a), Ok(b)) => a.file == b.file,
            _ => false,
        }
    }
}
