use super::models::AppConfig;
use super::tables::ConfigTables;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load configuration from the given path, falling back to defaults on error.
pub fn load_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return AppConfig::default();
        }
    };

    match parse_config(&contents) {
        Ok(cfg) => {
            debug!("Parsed configuration from disk");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err:#}");
            AppConfig::default()
        }
    }
}

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let tables: ConfigTables = toml::from_str(contents).context("Failed to parse config TOML")?;
    Ok(tables.into())
}

pub fn serialize_config(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(&ConfigTables::from(config)).context("Failed to serialize config")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use std::io::Write;

    #[test]
    fn missing_sections_use_defaults() {
        let config = parse_config("[page]\ndpi = 120.0\n").unwrap();
        assert_eq!(config.dpi, 120.0);
        assert_eq!(config.page_height_mm, 216.0);
        assert_eq!(config.page_width_mm, 135.0);
        assert_eq!(config.measure_threads, 1);
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn serialized_config_parses_back() {
        let mut config = AppConfig::default();
        config.page_height_mm = 180.0;
        config.measure_threads = 4;
        config.log_level = LogLevel::Warn;
        let text = serialize_config(&config).unwrap();
        assert!(text.contains("[page]"));
        assert_eq!(parse_config(&text).unwrap(), config);
    }

    #[test]
    fn unreadable_or_invalid_files_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_config(&dir.path().join("absent.toml")), AppConfig::default());

        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[page]\nheight_mm = \"tall\"").unwrap();
        assert_eq!(load_config(&path), AppConfig::default());
    }

    #[test]
    fn geometry_comes_from_page_table() {
        let config = parse_config("[page]\nheight_mm = 264.6\n").unwrap();
        assert_eq!(config.page_geometry().single_page_height_px().unwrap(), 1000.0);
        assert_eq!(config.text_flow_settings().unwrap().column_width_px, 510.0);
    }
}
