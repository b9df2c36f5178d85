use crate::pagination::geometry::{DEFAULT_DPI, DEFAULT_PAGE_HEIGHT_MM, DEFAULT_PAGE_WIDTH_MM};

pub(crate) fn default_page_height_mm() -> f64 {
    DEFAULT_PAGE_HEIGHT_MM
}

pub(crate) fn default_page_width_mm() -> f64 {
    DEFAULT_PAGE_WIDTH_MM
}

pub(crate) fn default_dpi() -> f64 {
    DEFAULT_DPI
}

pub(crate) fn default_font_size_px() -> f64 {
    12.0
}

pub(crate) fn default_line_spacing() -> f64 {
    1.2
}

pub(crate) fn default_image_block_height_px() -> f64 {
    300.0
}

pub(crate) fn default_measure_threads() -> usize {
    1
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Debug
}
