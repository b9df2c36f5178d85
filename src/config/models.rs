use crate::pagination::{PageGeometry, TextFlowSettings};
use serde::Deserialize;

/// Pagination settings; deserializable from TOML.
#[derive(Debug, Clone, PartialEq, Deserialize, serde::Serialize)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_page_height_mm")]
    pub page_height_mm: f64,
    #[serde(default = "crate::config::defaults::default_page_width_mm")]
    pub page_width_mm: f64,
    #[serde(default = "crate::config::defaults::default_dpi")]
    pub dpi: f64,
    #[serde(default = "crate::config::defaults::default_font_size_px")]
    pub font_size_px: f64,
    #[serde(default = "crate::config::defaults::default_line_spacing")]
    pub line_spacing: f64,
    #[serde(default = "crate::config::defaults::default_image_block_height_px")]
    pub image_block_height_px: f64,
    #[serde(default = "crate::config::defaults::default_measure_threads")]
    pub measure_threads: usize,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            page_height_mm: crate::config::defaults::default_page_height_mm(),
            page_width_mm: crate::config::defaults::default_page_width_mm(),
            dpi: crate::config::defaults::default_dpi(),
            font_size_px: crate::config::defaults::default_font_size_px(),
            line_spacing: crate::config::defaults::default_line_spacing(),
            image_block_height_px: crate::config::defaults::default_image_block_height_px(),
            measure_threads: crate::config::defaults::default_measure_threads(),
            log_level: crate::config::defaults::default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn page_geometry(&self) -> PageGeometry {
        PageGeometry::new(self.page_height_mm, self.page_width_mm, self.dpi)
    }

    /// Text-flow measuring column for the configured page width.
    pub fn text_flow_settings(&self) -> anyhow::Result<TextFlowSettings> {
        Ok(TextFlowSettings {
            column_width_px: self.page_geometry().page_width_px()?,
            font_size_px: self.font_size_px,
            line_spacing: self.line_spacing,
            image_block_height_px: self.image_block_height_px.max(0.0),
        })
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Debug
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
