use super::defaults;
use super::models::{AppConfig, LogLevel};
use serde::Deserialize;

/// On-disk layout of `config.toml`, grouped by concern.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    page: PageConfig,
    #[serde(default)]
    measure: MeasureConfig,
    #[serde(default)]
    pagination: PaginationConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            page_height_mm: tables.page.height_mm,
            page_width_mm: tables.page.width_mm,
            dpi: tables.page.dpi,
            font_size_px: tables.measure.font_size_px,
            line_spacing: tables.measure.line_spacing,
            image_block_height_px: tables.measure.image_block_height_px,
            measure_threads: tables.pagination.measure_threads,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            page: PageConfig {
                height_mm: config.page_height_mm,
                width_mm: config.page_width_mm,
                dpi: config.dpi,
            },
            measure: MeasureConfig {
                font_size_px: config.font_size_px,
                line_spacing: config.line_spacing,
                image_block_height_px: config.image_block_height_px,
            },
            pagination: PaginationConfig {
                measure_threads: config.measure_threads,
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PageConfig {
    #[serde(default = "defaults::default_page_height_mm")]
    height_mm: f64,
    #[serde(default = "defaults::default_page_width_mm")]
    width_mm: f64,
    #[serde(default = "defaults::default_dpi")]
    dpi: f64,
}

impl Default for PageConfig {
    fn default() -> Self {
        PageConfig {
            height_mm: defaults::default_page_height_mm(),
            width_mm: defaults::default_page_width_mm(),
            dpi: defaults::default_dpi(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct MeasureConfig {
    #[serde(default = "defaults::default_font_size_px")]
    font_size_px: f64,
    #[serde(default = "defaults::default_line_spacing")]
    line_spacing: f64,
    #[serde(default = "defaults::default_image_block_height_px")]
    image_block_height_px: f64,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        MeasureConfig {
            font_size_px: defaults::default_font_size_px(),
            line_spacing: defaults::default_line_spacing(),
            image_block_height_px: defaults::default_image_block_height_px(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PaginationConfig {
    #[serde(default = "defaults::default_measure_threads")]
    measure_threads: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        PaginationConfig {
            measure_threads: defaults::default_measure_threads(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
