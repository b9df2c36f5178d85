//! Find-in-book.
//!
//! Scans every content document for a piece of text on a background thread
//! and keeps the matching files in reading order. Results are navigated one
//! file at a time, wrapping at either end, and mapped onto virtual pages
//! through the book layout.

use crate::cancellation::CancellationToken;
use crate::pagination::BookLayout;
use anyhow::{Context, Result, anyhow, bail};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Wide enough that html2text never wraps a paragraph mid-phrase.
const SEARCH_WRAP_COLUMNS: usize = 10_000;

/// Case-insensitive check of a document's visible text.
pub fn markup_contains(markup: &str, needle_lower: &str) -> Result<bool> {
    let text = html2text::from_read(markup.as_bytes(), SEARCH_WRAP_COLUMNS)
        .map_err(|err| anyhow!("html2text failed: {err}"))?;
    Ok(text
        .lines()
        .any(|line| line.to_lowercase().contains(needle_lower)))
}

/// Paths of the documents containing `text`, in the order given.
pub fn find_in_files(
    files: &[(String, String)],
    text: &str,
    cancel: &CancellationToken,
) -> Result<Vec<String>> {
    let needle = text.to_lowercase();
    let mut matches = Vec::new();
    for (path, markup) in files {
        cancel.check_cancelled("search")?;
        let found = markup_contains(markup, &needle)
            .with_context(|| format!("Failed to search {path}"))?;
        if found {
            debug!(path = %path, "Search text found");
            matches.push(path.clone());
        }
    }
    Ok(matches)
}

#[derive(Debug, Default)]
struct FindState {
    matches: Vec<String>,
    current: usize,
    failure: Option<String>,
}

/// A search running on its own thread.
pub struct FindJob {
    text: String,
    state: Arc<Mutex<FindState>>,
    finished: Arc<AtomicBool>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl FindJob {
    /// Start scanning `files` for `text`.
    pub fn spawn(
        files: Vec<(String, String)>,
        text: &str,
        cancel: CancellationToken,
    ) -> Result<Self> {
        if text.trim().is_empty() {
            bail!("Search text is empty");
        }
        let state = Arc::new(Mutex::new(FindState::default()));
        let finished = Arc::new(AtomicBool::new(false));

        let worker_state = Arc::clone(&state);
        let worker_finished = Arc::clone(&finished);
        let worker_cancel = cancel.clone();
        let needle = text.to_string();
        let handle = thread::Builder::new()
            .name("find".to_string())
            .spawn(move || {
                match find_in_files(&files, &needle, &worker_cancel) {
                    Ok(found) => {
                        info!(matches = found.len(), "Search finished");
                        if let Ok(mut guard) = worker_state.lock() {
                            guard.matches = found;
                        }
                    }
                    Err(err) if worker_cancel.is_cancelled() => debug!("Search stopped: {err}"),
                    Err(err) => {
                        warn!("Search failed: {err:#}");
                        if let Ok(mut guard) = worker_state.lock() {
                            guard.failure = Some(format!("{err:#}"));
                        }
                    }
                }
                worker_finished.store(true, Ordering::Release);
            })
            .context("Failed to spawn search worker")?;

        Ok(FindJob {
            text: text.to_string(),
            state,
            finished,
            cancel,
            handle: Some(handle),
        })
    }

    pub fn search_text(&self) -> &str {
        &self.text
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the scan completes. A document that could not be searched
    /// fails the whole scan.
    pub fn wait(&mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| anyhow!("Search worker panicked"))?;
        }
        let failure = self
            .state
            .lock()
            .map_err(|_| anyhow!("Search state poisoned"))?
            .failure
            .clone();
        if let Some(reason) = failure {
            bail!(reason);
        }
        Ok(())
    }

    pub fn matches(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|guard| guard.matches.clone())
            .unwrap_or_default()
    }

    /// Advance to the next matching file, wrapping to the first.
    pub fn next_file(&self) -> Option<String> {
        let mut guard = self.state.lock().ok()?;
        if guard.matches.is_empty() {
            return None;
        }
        guard.current = (guard.current + 1) % guard.matches.len();
        Some(guard.matches[guard.current].clone())
    }

    /// Step back to the previous matching file, wrapping to the last.
    pub fn prev_file(&self) -> Option<String> {
        let mut guard = self.state.lock().ok()?;
        if guard.matches.is_empty() {
            return None;
        }
        guard.current = match guard.current {
            0 => guard.matches.len() - 1,
            idx => idx - 1,
        };
        Some(guard.matches[guard.current].clone())
    }
}

impl Drop for FindJob {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.cancel.cancel();
        }
    }
}

/// First virtual page of each matching file.
pub fn pages_for_matches(layout: &BookLayout, matches: &[String]) -> Vec<(String, usize)> {
    matches
        .iter()
        .filter_map(|path| match layout.base_page_for_file(path) {
            Ok(page) => Some((path.clone(), page)),
            Err(err) => {
                warn!(path = %path, "Match has no page: {err}");
                None
            }
        })
        .collect()
}
