use clap::Parser;
use fern::{
    colors::{Color, ColoredLevelConfig},
    Dispatch,
};
use log::{Level, LevelFilter};
use pws_history_core::{
    find_config_file, load_config, ConfigSource, DEFAULT_PORT, DEFAULT_WU_BASE_URL,
};
use std::env;
use time::{format_description::well_known::Iso8601, OffsetDateTime};

use crate::WuConfig;

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "PWS History - Weather Underground station history ingester and local weather API"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $PWS_HISTORY_CONFIG, ./pws-history.toml,
    /// $XDG_CONFIG_HOME/pws-history/pws-history.toml, /etc/pws-history/pws-history.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "PWS_HISTORY_LEVEL")]
    pub level: Option<String>,

    /// Host to listen on (use 0.0.0.0 for all interfaces)
    #[arg(short, long, env = "PWS_HISTORY_HOST")]
    #[serde(alias = "host")]
    pub domain: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PWS_HISTORY_PORT")]
    pub port: Option<String>,

    /// SQLite database file, created if missing
    #[arg(short = 'b', long, env = "PWS_HISTORY_DB")]
    pub db_path: Option<String>,

    /// Directory with the static UI, index.html is the entry page
    #[arg(short, long, env = "PWS_HISTORY_UI_DIR")]
    pub ui_dir: Option<String>,

    /// weather.com API key used for PWS history requests
    #[arg(short = 'k', long, env = "WU_API_KEY", hide_env_values = true)]
    pub wu_api_key: Option<String>,

    /// Base URL of the weather.com API
    #[arg(long, env = "PWS_HISTORY_WU_BASE_URL")]
    pub wu_base_url: Option<String>,

    /// Max days of a range fetched at the same time (unbounded when unset)
    #[arg(short, long, env = "PWS_HISTORY_MAX_CONCURRENT_DAYS")]
    pub max_concurrent_days: Option<usize>,
}

impl Cli {
    /// Get the effective configuration value with defaults
    pub fn host(&self) -> String {
        self.domain
            .clone()
            .unwrap_or_else(|| "127.0.0.1".to_string())
    }

    pub fn port(&self) -> String {
        self.port
            .clone()
            .unwrap_or_else(|| DEFAULT_PORT.to_string())
    }

    pub fn db_path(&self) -> String {
        self.db_path
            .clone()
            .unwrap_or_else(|| "./data.db".to_string())
    }

    pub fn static_dir(&self) -> String {
        self.ui_dir
            .clone()
            .unwrap_or_else(|| "./public".to_string())
    }

    pub fn wu_config(&self) -> WuConfig {
        WuConfig {
            base_url: self
                .wu_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_WU_BASE_URL.to_string()),
            api_key: self.wu_api_key.clone().filter(|key| !key.is_empty()),
        }
    }

    /// Later values win field by field.
    pub fn merge(self, file_config: Cli) -> Cli {
        Cli {
            config: self.config,
            level: self.level.or(file_config.level),
            domain: self.domain.or(file_config.domain),
            port: self.port.or(file_config.port),
            db_path: self.db_path.or(file_config.db_path),
            ui_dir: self.ui_dir.or(file_config.ui_dir),
            wu_api_key: self.wu_api_key.or(file_config.wu_api_key),
            wu_base_url: self.wu_base_url.or(file_config.wu_base_url),
            max_concurrent_days: self.max_concurrent_days.or(file_config.max_concurrent_days),
        }
    }
}

/// Messages raised while reading config, logged once the logger is running.
pub type ConfigNotes = Vec<(Level, String)>;

/// Load configuration from CLI args, `.env`, config file, and environment
pub fn get_config_info() -> (Cli, ConfigNotes) {
    // a missing .env is fine, the variables may come from the real environment
    let _ = dotenv::dotenv();
    let cli_args = Cli::parse();

    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("PWS_HISTORY_CONFIG", "pws-history.toml")
    };

    let (file_config, notes) = read_file_config(&source);

    // CLI args override file config (env vars are handled by clap)
    (cli_args.merge(file_config), notes)
}

/// An unreadable or malformed file falls back to defaults with a warning.
fn read_file_config(source: &ConfigSource) -> (Cli, ConfigNotes) {
    let mut notes = ConfigNotes::new();
    if source.path().is_some() {
        notes.push((Level::Info, format!("Loading config from: {}", source)));
    }

    let file_config = match load_config(source) {
        Ok(config) => config,
        Err(e) => {
            notes.push((
                Level::Warn,
                format!("ignoring config file {}: {:#}", source, e),
            ));
            Cli::default()
        }
    };
    (file_config, notes)
}

pub fn get_log_level(cli: &Cli) -> LevelFilter {
    let level_str = cli
        .level
        .clone()
        .or_else(|| env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    match level_str.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

pub fn setup_logger() -> Dispatch {
    let colors = ColoredLevelConfig::new()
        .trace(Color::White)
        .debug(Color::Cyan)
        .info(Color::Blue)
        .warn(Color::Yellow)
        .error(Color::Magenta);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}: {}",
                OffsetDateTime::now_utc()
                    .format(&Iso8601::DEFAULT)
                    .unwrap_or_default(),
                colors.color(record.level()),
                record.target(),
                message
            ));
        })
        .chain(std::io::stdout())
}
