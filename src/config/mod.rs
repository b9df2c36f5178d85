//! Configuration loading for the paginator.
//!
//! Page size, resolution and measuring settings are loaded from
//! `conf/config.toml` if present. Any missing or invalid entries fall back to
//! the reader's defaults (a 135 × 216 mm page at 96 dpi).

mod defaults;
mod io;
mod models;
mod tables;

pub use io::{load_config, parse_config, serialize_config};
pub use models::{AppConfig, LogLevel};
