//! PWS History Core Library
//!
//! Shared utilities for the history server:
//! - Configuration loading (XDG-compliant)
//! - File system utilities

mod config;
pub mod fs;

pub use config::{find_config_file, load_config, ConfigSource};
pub use fs::{ensure_parent_dir, path_exists};

/// Application name used for XDG paths
pub const APP_NAME: &str = "pws-history";

/// Default server port
pub const DEFAULT_PORT: u16 = 3000;

/// Default weather.com API host
pub const DEFAULT_WU_BASE_URL: &str = "https://api.weather.com";
