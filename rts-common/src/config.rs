//! Configuration loading and resolution
//!
//! Resolution priority for every setting:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error: the service logs a warning and
//! starts on defaults. A config file that exists but does not parse is.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::source::{SheetSource, Source, DEFAULT_EXPORT_BASE_URL};
use crate::time::secs_to_duration;
use crate::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "RTS_CONFIG";

const APP_DIR: &str = "rts-board";
const CONFIG_FILE: &str = "config.toml";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default)]
    pub sheet: SheetConfig,

    #[serde(default)]
    pub refresh: RefreshConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Published spreadsheet location
#[derive(Debug, Clone, Deserialize)]
pub struct SheetConfig {
    #[serde(default)]
    pub sheet_id: Option<String>,

    #[serde(default = "default_tab_name")]
    pub tab_name: String,

    #[serde(default = "default_export_base_url")]
    pub export_base_url: String,
}

/// Refresh cadence and fetch limits
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between automatic refreshes
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Seconds before a sheet fetch is abandoned
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

/// Local file source; takes precedence over the sheet when set
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_port() -> u16 {
    5730
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_tab_name() -> String {
    "Sheet1".to_string()
}

fn default_export_base_url() -> String {
    DEFAULT_EXPORT_BASE_URL.to_string()
}

fn default_interval_secs() -> u64 {
    300
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            sheet: SheetConfig::default(),
            refresh: RefreshConfig::default(),
            source: SourceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            sheet_id: None,
            tab_name: default_tab_name(),
            export_base_url: default_export_base_url(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Values supplied on the command line or through the environment
///
/// `None` leaves the TOML/default value in place.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub sheet_id: Option<String>,
    pub tab_name: Option<String>,
    pub source_file: Option<PathBuf>,
    pub interval_secs: Option<u64>,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// Parse a config file; unreadable or malformed files are errors
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load from the resolved config path, falling back to defaults when no
    /// file exists
    pub fn load_or_default(cli_path: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_path) {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                info!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Layer command-line/environment values over the file values
    pub fn apply_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(addr) = overrides.bind_address {
            self.bind_address = addr;
        }
        if let Some(id) = overrides.sheet_id {
            self.sheet.sheet_id = Some(id);
        }
        if let Some(tab) = overrides.tab_name {
            self.sheet.tab_name = tab;
        }
        if let Some(file) = overrides.source_file {
            self.source.file = Some(file);
        }
        if let Some(secs) = overrides.interval_secs {
            self.refresh.interval_secs = secs;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        self
    }

    /// The source mounted at startup and re-read by the timer
    ///
    /// A configured file wins over the sheet.
    pub fn resolve_source(&self) -> Result<Source> {
        if let Some(file) = &self.source.file {
            return Ok(Source::File(file.clone()));
        }

        match self.sheet.sheet_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(Source::Sheet(
                SheetSource::new(id, self.sheet.tab_name.clone())
                    .with_base_url(self.sheet.export_base_url.clone()),
            )),
            _ => Err(Error::Config(
                "no sheet id or source file configured (set sheet.sheet_id or source.file)"
                    .to_string(),
            )),
        }
    }

    pub fn refresh_period(&self) -> Duration {
        secs_to_duration(self.refresh.interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        secs_to_duration(self.refresh.fetch_timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Config file path resolution:
/// 1. Command-line argument
/// 2. `RTS_CONFIG` environment variable
/// 3. Platform config directory (`~/.config/rts-board/config.toml` on Linux)
/// 4. `/etc/rts-board/config.toml` (Linux only)
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILE);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}
