//! The paginator state machine.
//!
//! A `Paginator` owns the layout under construction and hands out exactly one
//! measurement request at a time. Callers feed results back through
//! [`Paginator::on_file_measured`], which appends the file's pages and either
//! asks for the next file or reports that the book is paginated.

use super::error::PaginationError;
use super::geometry::PageGeometry;
use super::layout::{BookLayout, FileEntry, MAX_PAGES_PER_FILE};
use tracing::{debug, info, warn};

/// The single outstanding measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasureRequest {
    pub index: usize,
    /// Identifier exactly as it appeared in the file list.
    pub path: String,
}

/// What the caller should do after a measurement was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationStep {
    Measure(MeasureRequest),
    Paginated { total_pages: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaginatorState {
    Measuring { next: usize },
    Paginated,
    Failed(PaginationError),
}

#[derive(Debug)]
pub struct Paginator {
    files: Vec<String>,
    layout: BookLayout,
    state: PaginatorState,
}

impl Paginator {
    /// Validate the inputs and schedule the first measurement.
    pub fn new(files: Vec<String>, geometry: &PageGeometry) -> Result<Self, PaginationError> {
        let single_page_height_px = geometry.single_page_height_px()?;
        Self::with_page_height(files, single_page_height_px)
    }

    /// Like [`Paginator::new`] with an explicit page height in pixels.
    pub fn with_page_height(
        files: Vec<String>,
        single_page_height_px: f64,
    ) -> Result<Self, PaginationError> {
        if files.is_empty() {
            return Err(PaginationError::InvalidConfiguration(
                "file list is empty".to_string(),
            ));
        }
        if !single_page_height_px.is_finite() || single_page_height_px <= 0.0 {
            return Err(PaginationError::InvalidConfiguration(format!(
                "single page height must be positive, got {single_page_height_px}"
            )));
        }
        info!(
            files = files.len(),
            single_page_height_px, "Starting pagination"
        );
        let layout = BookLayout::new(single_page_height_px, &files);
        Ok(Paginator {
            files,
            layout,
            state: PaginatorState::Measuring { next: 0 },
        })
    }

    pub fn state(&self) -> &PaginatorState {
        &self.state
    }

    pub fn is_paginated(&self) -> bool {
        matches!(self.state, PaginatorState::Paginated)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Number of files already measured.
    pub fn measured(&self) -> usize {
        self.layout.files().len()
    }

    /// The measurement the paginator is waiting for, if any.
    pub fn pending(&self) -> Option<MeasureRequest> {
        match self.state {
            PaginatorState::Measuring { next } => Some(MeasureRequest {
                index: next,
                path: self.files[next].clone(),
            }),
            _ => None,
        }
    }

    /// Accept the rendered height of the outstanding file.
    pub fn on_file_measured(
        &mut self,
        file_index: usize,
        rendered_height_px: f64,
    ) -> Result<PaginationStep, PaginationError> {
        let expected = match self.state {
            PaginatorState::Measuring { next } => next,
            _ => {
                return Err(PaginationError::UnexpectedMeasurement {
                    expected: None,
                    got: file_index,
                });
            }
        };
        if file_index != expected {
            return Err(PaginationError::UnexpectedMeasurement {
                expected: Some(expected),
                got: file_index,
            });
        }
        if !rendered_height_px.is_finite() || rendered_height_px < 0.0 {
            return Err(self.on_measure_failed(
                file_index,
                format!("renderer reported an unusable height ({rendered_height_px})"),
            ));
        }
        let pages = rendered_height_px / self.layout.single_page_height();
        if pages > MAX_PAGES_PER_FILE as f64 {
            return Err(self.on_measure_failed(
                file_index,
                format!(
                    "height of {rendered_height_px} px spans more than {MAX_PAGES_PER_FILE} pages"
                ),
            ));
        }

        let entry: &FileEntry = self.layout.append_measured(rendered_height_px);
        debug!(
            path = %entry.path,
            height = rendered_height_px,
            pages = entry.pages_in_file,
            remainder = entry.remainder_factor,
            first_page = entry.first_page,
            "Measured file"
        );

        if self.layout.is_complete() {
            self.state = PaginatorState::Paginated;
            let total_pages = self.layout.total_pagecount();
            info!(
                total_pages,
                total_height = self.layout.total_height(),
                "Pagination finished"
            );
            Ok(PaginationStep::Paginated { total_pages })
        } else {
            let next = file_index + 1;
            self.state = PaginatorState::Measuring { next };
            Ok(PaginationStep::Measure(MeasureRequest {
                index: next,
                path: self.files[next].clone(),
            }))
        }
    }

    /// Record a collaborator failure for the outstanding file. Pagination
    /// halts for good.
    ///
    /// A failure for any other file, or one arriving once measuring is over,
    /// is answered with `UnexpectedMeasurement` and leaves the state alone.
    pub fn on_measure_failed(
        &mut self,
        file_index: usize,
        reason: impl Into<String>,
    ) -> PaginationError {
        let expected = match self.state {
            PaginatorState::Measuring { next } => next,
            _ => {
                return PaginationError::UnexpectedMeasurement {
                    expected: None,
                    got: file_index,
                };
            }
        };
        if file_index != expected {
            return PaginationError::UnexpectedMeasurement {
                expected: Some(expected),
                got: file_index,
            };
        }
        let err = PaginationError::MeasurementFailed {
            path: self.files[file_index].clone(),
            reason: reason.into(),
        };
        warn!("Pagination halted: {err}");
        self.state = PaginatorState::Failed(err.clone());
        err
    }

    pub fn layout(&self) -> Result<&BookLayout, PaginationError> {
        if self.is_paginated() {
            Ok(&self.layout)
        } else {
            Err(PaginationError::LayoutNotReady)
        }
    }

    pub fn into_layout(self) -> Result<BookLayout, PaginationError> {
        if self.is_paginated() {
            Ok(self.layout)
        } else {
            Err(PaginationError::LayoutNotReady)
        }
    }

    pub fn file_for_page(&self, page: usize) -> Result<&str, PaginationError> {
        self.layout()?.file_for_page(page)
    }

    pub fn scroll_position_for_page(&self, page: usize) -> Result<f64, PaginationError> {
        self.layout()?.scroll_position_for_page(page)
    }

    pub fn scroll_length_for_page(&self, page: usize) -> Result<f64, PaginationError> {
        self.layout()?.scroll_length_for_page(page)
    }

    pub fn pagecount_for_file(&self, path: &str) -> Result<usize, PaginationError> {
        self.layout()?.pagecount_for_file(path)
    }

    pub fn remainder_for_file(&self, path: &str) -> Result<f64, PaginationError> {
        self.layout()?.remainder_for_file(path)
    }

    pub fn base_page_for_file(&self, path: &str) -> Result<usize, PaginationError> {
        self.layout()?.base_page_for_file(path)
    }

    pub fn next_file(&self, path: &str) -> Result<Option<&str>, PaginationError> {
        Ok(self.layout()?.next_file(path))
    }

    pub fn total_pagecount(&self) -> Result<usize, PaginationError> {
        Ok(self.layout()?.total_pagecount())
    }

    pub fn total_height(&self) -> Result<f64, PaginationError> {
        Ok(self.layout()?.total_height())
    }

    /// Known from construction, so available before pagination finishes.
    pub fn single_page_height(&self) -> f64 {
        self.layout.single_page_height()
    }
}
