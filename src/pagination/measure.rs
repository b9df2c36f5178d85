//! Height measurement.
//!
//! The paginator never renders anything itself. It asks a `HeightMeasurer`
//! for the total content height of one file at a time. `TextFlowMeasurer` is
//! a renderer-free estimate: it wraps the file's text to the page column and
//! counts lines, which is deterministic and good enough for a CLI or tests.

use super::layout::resolve_path;
use anyhow::{Context, Result, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Average glyph advance as a fraction of the font size.
const GLYPH_WIDTH_EM: f64 = 0.5;
/// html2text refuses widths that are too narrow to lay anything out.
const MIN_COLUMNS: usize = 20;

static RE_IMAGE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(img|image|svg)\b").unwrap());

/// Reports the rendered content height of a file, in pixels.
pub trait HeightMeasurer {
    fn measure(&mut self, path: &str) -> Result<f64>;

    /// Tear down whatever scratch surface was used for measuring.
    fn release(&mut self) {}
}

impl<F> HeightMeasurer for F
where
    F: FnMut(&str) -> Result<f64>,
{
    fn measure(&mut self, path: &str) -> Result<f64> {
        self(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextFlowSettings {
    pub column_width_px: f64,
    pub font_size_px: f64,
    pub line_spacing: f64,
    pub image_block_height_px: f64,
}

impl TextFlowSettings {
    pub fn columns(&self) -> usize {
        let glyph = (self.font_size_px * GLYPH_WIDTH_EM).max(1.0);
        ((self.column_width_px / glyph).floor() as usize).max(MIN_COLUMNS)
    }

    pub fn line_height_px(&self) -> f64 {
        (self.font_size_px * self.line_spacing).max(1.0)
    }
}

/// Estimates heights from in-memory markup keyed by file path.
#[derive(Debug, Clone)]
pub struct TextFlowMeasurer {
    documents: HashMap<String, String>,
    settings: TextFlowSettings,
}

impl TextFlowMeasurer {
    pub fn new<I>(documents: I, settings: TextFlowSettings) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let documents = documents
            .into_iter()
            .map(|(path, markup)| (resolve_path(&path).to_string(), markup))
            .collect();
        TextFlowMeasurer {
            documents,
            settings,
        }
    }

    pub fn settings(&self) -> &TextFlowSettings {
        &self.settings
    }

    /// Height of a single document's content once flowed into the column.
    pub fn estimate(&self, markup: &str) -> Result<f64> {
        if markup.trim().is_empty() {
            return Ok(0.0);
        }
        let columns = self.settings.columns();
        let text = html2text::from_read(markup.as_bytes(), columns)
            .map_err(|err| anyhow!("html2text failed: {err}"))?;
        let lines = if text.trim().is_empty() {
            0
        } else {
            text.trim_end().lines().count()
        };
        let images = RE_IMAGE_TAG.find_iter(markup).count();
        let height = lines as f64 * self.settings.line_height_px()
            + images as f64 * self.settings.image_block_height_px;
        trace!(columns, lines, images, height, "Estimated text flow");
        Ok(height)
    }
}

impl HeightMeasurer for TextFlowMeasurer {
    fn measure(&mut self, path: &str) -> Result<f64> {
        let resolved = resolve_path(path);
        let markup = self
            .documents
            .get(resolved)
            .with_context(|| format!("No content loaded for {resolved}"))?;
        self.estimate(markup)
            .with_context(|| format!("Failed to measure {resolved}"))
    }

    fn release(&mut self) {
        debug!(documents = self.documents.len(), "Releasing measuring surface");
        self.documents.clear();
        self.documents.shrink_to_fit();
    }
}
