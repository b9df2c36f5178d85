//! Page tracking on top of a finished layout.
//!
//! The renderer only knows about one loaded file and a scroll offset inside
//! it. `PageTracker` keeps the current virtual page in step with that offset
//! and turns page navigation into "load this file, scroll to this fraction".

use super::error::PaginationError;
use super::layout::BookLayout;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollDirection {
    #[default]
    Forward,
    Backward,
}

/// A snapshot of the renderer's vertical scrollbar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub value: f64,
    pub upper: f64,
    pub page_size: f64,
}

impl ScrollMetrics {
    pub fn new(value: f64, upper: f64, page_size: f64) -> Self {
        ScrollMetrics {
            value,
            upper,
            page_size,
        }
    }

    /// Largest reachable scroll value.
    pub fn range(&self) -> f64 {
        (self.upper - self.page_size).max(0.0)
    }

    /// Scroll position as a fraction of the file, 0 at the top.
    pub fn fraction(&self) -> f64 {
        let range = self.range();
        if self.value <= 0.0 || range <= 0.0 {
            0.0
        } else {
            (self.value / range).min(1.0)
        }
    }

    pub fn at_end(&self) -> bool {
        self.value >= self.range()
    }

    pub fn at_start(&self) -> bool {
        self.value <= 0.0
    }
}

/// What the renderer has to do to show a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageChange {
    pub page: usize,
    pub file: String,
    /// The page lives in a different file than the one currently loaded.
    pub load_file: bool,
    pub scroll_fraction: f64,
}

#[derive(Debug, Clone)]
pub struct PageTracker {
    layout: Arc<BookLayout>,
    current: Option<usize>,
    loaded_file: Option<usize>,
    direction: ScrollDirection,
}

impl PageTracker {
    pub fn new(layout: Arc<BookLayout>) -> Self {
        PageTracker {
            layout,
            current: None,
            loaded_file: None,
            direction: ScrollDirection::Forward,
        }
    }

    pub fn layout(&self) -> &BookLayout {
        &self.layout
    }

    pub fn current_page(&self) -> Option<usize> {
        self.current
    }

    pub fn current_file(&self) -> Option<&str> {
        self.current
            .and_then(|page| self.layout.file_for_page(page).ok())
    }

    pub fn page_count(&self) -> usize {
        self.layout.total_pagecount()
    }

    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    pub fn set_direction(&mut self, direction: ScrollDirection) {
        self.direction = direction;
    }

    /// Jump to `page`. Out-of-range pages leave the tracker untouched.
    pub fn go_to_page(&mut self, page: usize) -> Option<PageChange> {
        let record = *self.layout.page(page).ok()?;
        let load_file = self.loaded_file != Some(record.file);
        let scroll_fraction = if load_file && self.direction == ScrollDirection::Backward {
            1.0
        } else {
            record.position_fraction
        };
        self.current = Some(page);
        self.loaded_file = Some(record.file);
        let file = self.layout.files()[record.file].path.clone();
        info!(page, file = %file, load_file, "Navigated to page");
        Some(PageChange {
            page,
            file,
            load_file,
            scroll_fraction,
        })
    }

    pub fn next_page(&mut self) -> Option<PageChange> {
        let page = self.current.unwrap_or(0) + 1;
        self.go_to_page(page)
    }

    pub fn previous_page(&mut self) -> Option<PageChange> {
        let page = self.current?.checked_sub(1)?;
        self.go_to_page(page)
    }

    /// First page of the file after the current one.
    pub fn next_file_page(&mut self) -> Option<PageChange> {
        let current = self.current?;
        let record = self.layout.page(current).ok()?;
        let next = self.layout.files().get(record.file + 1)?.first_page;
        self.direction = ScrollDirection::Forward;
        self.go_to_page(next)
    }

    /// Last page of the file before the current one, scrolled to its end.
    pub fn previous_file_page(&mut self) -> Option<PageChange> {
        let current = self.current?;
        let record = self.layout.page(current).ok()?;
        let first = self.layout.files()[record.file].first_page;
        if first <= 1 {
            return None;
        }
        self.direction = ScrollDirection::Backward;
        self.go_to_page(first - 1)
    }

    /// Follow a scroll inside the loaded file. Returns the new page when the
    /// virtual page changed.
    ///
    /// Moving forward advances once the fraction reaches the next page's
    /// position; moving back regresses once it falls to the current page's
    /// position. Neither crosses into another file.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics) -> Option<usize> {
        let page = self.current?;
        let fraction = metrics.fraction();
        let target = match self.direction {
            ScrollDirection::Forward => {
                let next = page + 1;
                if !self.layout.same_file(page, next) {
                    return None;
                }
                let next_position = self.layout.scroll_position_for_page(next).ok()?;
                (fraction >= next_position).then_some(next)
            }
            ScrollDirection::Backward => {
                let previous = page.checked_sub(1)?;
                if !self.layout.same_file(page, previous) {
                    return None;
                }
                let current_position = self.layout.scroll_position_for_page(page).ok()?;
                (fraction <= current_position).then_some(previous)
            }
        }?;
        debug!(from = page, to = target, fraction, "Scroll changed page");
        self.current = Some(target);
        Some(target)
    }

    /// Whether the renderer should move to another file: the scrollbar sits
    /// at the edge in the current direction.
    pub fn needs_file_transition(&self, metrics: ScrollMetrics) -> bool {
        match self.direction {
            ScrollDirection::Forward => metrics.at_end(),
            ScrollDirection::Backward => metrics.at_start(),
        }
    }

    /// Cross into the neighbouring file when the renderer hit an edge.
    pub fn transition_file(&mut self, metrics: ScrollMetrics) -> Option<PageChange> {
        if !self.needs_file_transition(metrics) {
            return None;
        }
        match self.direction {
            ScrollDirection::Forward => self.next_file_page(),
            ScrollDirection::Backward => self.previous_file_page(),
        }
    }

    pub fn scroll_offset_for_page(
        &self,
        page: usize,
        metrics: ScrollMetrics,
    ) -> Result<f64, PaginationError> {
        Ok(metrics.range() * self.layout.scroll_position_for_page(page)?)
    }

    /// Padding appended to a file so its last virtual page is a whole page.
    pub fn bottom_padding_px(
        &self,
        path: &str,
        view_page_height: f64,
    ) -> Result<f64, PaginationError> {
        let entry = self.layout.file(path)?;
        let remainder = entry.remainder_factor;
        let fractional_pages = entry.pages_in_file as f64 - remainder;
        Ok((remainder * view_page_height / fractional_pages).ceil())
    }

    /// First page of the first file whose path ends with `suffix`.
    pub fn page_for_file_suffix(&self, suffix: &str) -> Option<usize> {
        self.layout
            .files()
            .iter()
            .find(|entry| entry.path.ends_with(suffix))
            .map(|entry| entry.first_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::paginator::Paginator;

    fn layout(heights: &[f64]) -> Arc<BookLayout> {
        let files: Vec<String> = (0..heights.len())
            .map(|idx| format!("/book/OEBPS/ch{idx}.xhtml"))
            .collect();
        let mut paginator = Paginator::with_page_height(files, 1000.0).unwrap();
        for (idx, height) in heights.iter().enumerate() {
            paginator.on_file_measured(idx, *height).unwrap();
        }
        Arc::new(paginator.into_layout().unwrap())
    }

    fn at(fraction: f64) -> ScrollMetrics {
        // A unit scroll range keeps the fraction exact.
        ScrollMetrics::new(fraction, 2.0, 1.0)
    }

    #[test]
    fn scroll_fraction_handles_empty_ranges() {
        assert_eq!(ScrollMetrics::new(50.0, 100.0, 100.0).fraction(), 0.0);
        assert_eq!(ScrollMetrics::new(-3.0, 300.0, 100.0).fraction(), 0.0);
        assert_eq!(ScrollMetrics::new(100.0, 300.0, 100.0).fraction(), 0.5);
    }

    #[test]
    fn forward_scroll_advances_exactly_at_boundary() {
        let mut tracker = PageTracker::new(layout(&[2500.0, 800.0]));
        tracker.go_to_page(1).unwrap();

        assert_eq!(tracker.on_scroll(at(0.33)), None);
        assert_eq!(tracker.on_scroll(at(1.0 / 3.0)), Some(2));
        assert_eq!(tracker.on_scroll(at(0.5)), None);
        assert_eq!(tracker.on_scroll(at(2.0 / 3.0)), Some(3));
    }

    #[test]
    fn forward_scroll_never_crosses_files() {
        let mut tracker = PageTracker::new(layout(&[2500.0, 800.0]));
        tracker.go_to_page(3).unwrap();
        assert_eq!(tracker.on_scroll(at(1.0)), None);
        assert_eq!(tracker.current_page(), Some(3));
    }

    #[test]
    fn backward_scroll_regresses_at_current_position() {
        let mut tracker = PageTracker::new(layout(&[2500.0, 800.0]));
        tracker.go_to_page(3).unwrap();
        tracker.set_direction(ScrollDirection::Backward);

        assert_eq!(tracker.on_scroll(at(0.7)), None);
        assert_eq!(tracker.on_scroll(at(2.0 / 3.0)), Some(2));
        assert_eq!(tracker.on_scroll(at(0.34)), None);
        assert_eq!(tracker.on_scroll(at(1.0 / 3.0)), Some(1));
        // Page 1 starts the file: nothing before it in this file.
        assert_eq!(tracker.on_scroll(at(0.0)), None);
    }

    #[test]
    fn backward_scroll_stops_at_first_page_of_later_file() {
        let mut tracker = PageTracker::new(layout(&[2500.0, 800.0]));
        tracker.go_to_page(4).unwrap();
        tracker.set_direction(ScrollDirection::Backward);

        // Page 4 opens the second file; page 3 belongs to the first.
        assert_eq!(tracker.on_scroll(at(0.0)), None);
        assert_eq!(tracker.current_page(), Some(4));
        assert_eq!(tracker.current_file(), Some("/book/OEBPS/ch1.xhtml"));
    }

    #[test]
    fn go_to_page_reports_file_loads() {
        let mut tracker = PageTracker::new(layout(&[2500.0, 800.0]));
        assert!(tracker.go_to_page(0).is_none());
        assert!(tracker.go_to_page(5).is_none());
        assert_eq!(tracker.current_page(), None);

        let first = tracker.go_to_page(2).unwrap();
        assert!(first.load_file);
        assert!((first.scroll_fraction - 1.0 / 3.0).abs() < 1e-9);

        let same = tracker.next_page().unwrap();
        assert_eq!(same.page, 3);
        assert!(!same.load_file);

        let other = tracker.next_page().unwrap();
        assert_eq!(other.file, "/book/OEBPS/ch1.xhtml");
        assert!(other.load_file);
        assert!(tracker.next_page().is_none());
        assert_eq!(tracker.current_page(), Some(4));
    }

    #[test]
    fn previous_page_stops_at_first() {
        let mut tracker = PageTracker::new(layout(&[1500.0]));
        assert!(tracker.previous_page().is_none());
        tracker.go_to_page(1).unwrap();
        assert!(tracker.previous_page().is_none());
    }

    #[test]
    fn file_transitions_follow_scroll_edges() {
        let mut tracker = PageTracker::new(layout(&[2500.0, 800.0, 1500.0]));
        tracker.go_to_page(2).unwrap();

        assert!(tracker.transition_file(at(0.5)).is_none());
        let change = tracker.transition_file(at(1.0)).unwrap();
        assert_eq!(change.page, 4);
        assert!(change.load_file);
        assert_eq!(change.scroll_fraction, 0.0);

        tracker.set_direction(ScrollDirection::Backward);
        let change = tracker.transition_file(at(0.0)).unwrap();
        assert_eq!(change.page, 3);
        assert_eq!(change.file, "/book/OEBPS/ch0.xhtml");
        assert_eq!(change.scroll_fraction, 1.0);

        assert!(tracker.go_to_page(1).is_some());
        assert!(tracker.previous_file_page().is_none());
        tracker.go_to_page(6).unwrap();
        assert!(tracker.next_file_page().is_none());
    }

    #[test]
    fn bottom_padding_completes_last_page() {
        let tracker = PageTracker::new(layout(&[2500.0, 800.0, 3000.0]));
        // 2.5 pages of content in a 1000 px view: half a page is missing.
        assert_eq!(
            tracker
                .bottom_padding_px("/book/OEBPS/ch0.xhtml", 1000.0)
                .unwrap(),
            200.0
        );
        assert_eq!(
            tracker
                .bottom_padding_px("/book/OEBPS/ch2.xhtml", 1000.0)
                .unwrap(),
            0.0
        );
        assert!(tracker.bottom_padding_px("/book/none.xhtml", 1000.0).is_err());
    }

    #[test]
    fn scroll_offsets_and_suffix_lookup() {
        let tracker = PageTracker::new(layout(&[2500.0, 800.0]));
        let metrics = ScrollMetrics::new(0.0, 3000.0, 1000.0);
        let offset = tracker.scroll_offset_for_page(2, metrics).unwrap();
        assert!((offset - 2000.0 / 3.0).abs() < 1e-9);
        assert_eq!(tracker.page_for_file_suffix("ch1.xhtml"), Some(4));
        assert_eq!(tracker.page_for_file_suffix("ch9.xhtml"), None);
    }
}
