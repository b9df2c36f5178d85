//! Virtual pagination for EPUB books.
//!
//! - `epub_loader` reads a book's content documents in reading order.
//! - `pagination` measures them and builds the page table.
//! - `search` finds text across the book and maps hits onto pages.
//! - `config` holds page geometry and measuring settings.

pub mod cancellation;
pub mod config;
pub mod epub_loader;
pub mod pagination;
pub mod search;
