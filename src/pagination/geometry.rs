//! Physical page geometry.
//!
//! Virtual pages are defined by a fixed physical page size in millimeters,
//! converted to pixels once at the configured screen resolution.

use super::error::PaginationError;
use serde::{Deserialize, Serialize};

/// Conversion factor used throughout the reader (1 mm ≈ 0.03937 in).
pub const INCHES_PER_MM: f64 = 0.03937;
/// Default page height (millimeters).
pub const DEFAULT_PAGE_HEIGHT_MM: f64 = 216.0;
/// Default page width (millimeters). Only the measurer uses it.
pub const DEFAULT_PAGE_WIDTH_MM: f64 = 135.0;
/// Default screen resolution.
pub const DEFAULT_DPI: f64 = 96.0;

/// Convert a length in millimeters into whole pixels at `dpi`.
pub fn mm_to_pixels(mm: f64, dpi: f64) -> f64 {
    (mm * INCHES_PER_MM * dpi).round()
}

/// Convert a pixel length back into whole millimeters at `dpi`.
pub fn pixels_to_mm(pixels: f64, dpi: f64) -> f64 {
    let inches = pixels / dpi;
    (inches / INCHES_PER_MM).trunc()
}

/// Page size and resolution the layout is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub page_height_mm: f64,
    pub page_width_mm: f64,
    pub dpi: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        PageGeometry {
            page_height_mm: DEFAULT_PAGE_HEIGHT_MM,
            page_width_mm: DEFAULT_PAGE_WIDTH_MM,
            dpi: DEFAULT_DPI,
        }
    }
}

impl PageGeometry {
    pub fn new(page_height_mm: f64, page_width_mm: f64, dpi: f64) -> Self {
        PageGeometry {
            page_height_mm,
            page_width_mm,
            dpi,
        }
    }

    /// Height of one virtual page in pixels.
    ///
    /// Fails when the height or resolution is not a positive finite number, or
    /// when the page is too small to cover a single pixel.
    pub fn single_page_height_px(&self) -> Result<f64, PaginationError> {
        if !is_positive(self.page_height_mm) {
            return Err(PaginationError::InvalidConfiguration(format!(
                "page height must be positive, got {} mm",
                self.page_height_mm
            )));
        }
        if !is_positive(self.dpi) {
            return Err(PaginationError::InvalidConfiguration(format!(
                "dpi must be positive, got {}",
                self.dpi
            )));
        }
        let height = mm_to_pixels(self.page_height_mm, self.dpi);
        if height < 1.0 {
            return Err(PaginationError::InvalidConfiguration(format!(
                "page height of {} mm at {} dpi is less than one pixel",
                self.page_height_mm, self.dpi
            )));
        }
        Ok(height)
    }

    /// Width of the measuring column in pixels.
    pub fn page_width_px(&self) -> Result<f64, PaginationError> {
        if !is_positive(self.page_width_mm) || !is_positive(self.dpi) {
            return Err(PaginationError::InvalidConfiguration(format!(
                "page width must be positive, got {} mm at {} dpi",
                self.page_width_mm, self.dpi
            )));
        }
        Ok(mm_to_pixels(self.page_width_mm, self.dpi))
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
