//! Virtual pagination of reflowable books.
//!
//! A book is a sequence of markup files that a renderer can only scroll, never
//! page. The paginator measures each file's rendered height, slices it into
//! fixed-height virtual pages, and keeps a table from page number to
//! (file, scroll fraction) so the rest of the reader can treat the book as a
//! flat, seekable run of pages.

pub mod driver;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod measure;
pub mod paginator;
pub mod tracking;

pub use driver::{PaginationEvent, PaginationJob, paginate, paginate_parallel, spawn_pagination};
pub use error::PaginationError;
pub use geometry::{PageGeometry, mm_to_pixels, pixels_to_mm};
pub use layout::{BookLayout, FileEntry, PageRecord, resolve_path};
pub use measure::{HeightMeasurer, TextFlowMeasurer, TextFlowSettings};
pub use paginator::{MeasureRequest, PaginationStep, Paginator, PaginatorState};
pub use tracking::{PageChange, PageTracker, ScrollDirection, ScrollMetrics};
