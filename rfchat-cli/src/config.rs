//! Session configuration: settings.toml merged with environment overrides
//! and CLI flags. Precedence: CLI > environment > file > defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::{Cli, LogLevel};

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 8001;
const DEFAULT_TIME_DELAY_SECS: f64 = 2.0;
const DEFAULT_LOG_FILE: &str = "rfchat.log";

/// Raw settings file shape. All keys optional; kebab-case on disk.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct Settings {
    callsign: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    time_delay: Option<f64>,
    log_file: Option<PathBuf>,
    log_level: Option<String>,
    /// Callsign -> color name, handed through to the renderer untouched.
    #[serde(default)]
    colors: HashMap<String, String>,
}

/// Fully merged session configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub callsign: String,
    pub host: String,
    pub port: u16,
    pub time_delay: Duration,
    pub log_file: PathBuf,
    pub log_level: LogLevel,
    pub colors: HashMap<String, String>,
    pub verbose: u8,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("settings file {0} does not exist")]
    SettingsFileMissing(PathBuf),
    #[error("settings file {path} is not valid TOML: {source}")]
    SettingsFileInvalid {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("time-delay must be a non-negative number of seconds, got {0}")]
    BadTimeDelay(f64),
    #[error("unknown log level '{0}'")]
    BadLogLevel(String),
    #[error("you must provide a callsign (flag -c or settings file)")]
    CallsignMissing,
}

/// Default settings path: `$XDG_CONFIG_HOME/rfchat/settings.toml`, falling
/// back to `~/.config`.
pub fn default_settings_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("rfchat").join("settings.toml"))
}

/// Load and merge configuration. A user-supplied settings path that does not
/// exist is an error; a missing default path is not.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    let settings = match &cli.settings_file {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::SettingsFileMissing(path.clone()));
            }
            read_settings(path)?
        }
        None => match default_settings_path() {
            Some(path) if path.exists() => read_settings(&path)?,
            _ => Settings::default(),
        },
    };
    merge(cli, settings)
}

fn read_settings(path: &Path) -> Result<Settings, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::SettingsFileInvalid {
        path: path.to_path_buf(),
        source,
    })
}

fn merge(cli: &Cli, settings: Settings) -> Result<Config, ConfigError> {
    let callsign = cli
        .callsign
        .clone()
        .or(settings.callsign)
        .ok_or(ConfigError::CallsignMissing)?;

    let host = cli
        .host
        .clone()
        .or_else(|| std::env::var("RFCHAT_HOST").ok())
        .or(settings.host)
        .unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = cli
        .port
        .or_else(|| {
            std::env::var("RFCHAT_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
        })
        .or(settings.port)
        .unwrap_or(DEFAULT_PORT);

    let delay_secs = cli
        .time_delay
        .or(settings.time_delay)
        .unwrap_or(DEFAULT_TIME_DELAY_SECS);
    if !delay_secs.is_finite() || delay_secs < 0.0 {
        return Err(ConfigError::BadTimeDelay(delay_secs));
    }

    let log_level = match (&cli.log_level, &settings.log_level) {
        (Some(level), _) => *level,
        (None, Some(raw)) => raw
            .parse()
            .map_err(|_| ConfigError::BadLogLevel(raw.clone()))?,
        (None, None) => LogLevel::default(),
    };

    Ok(Config {
        callsign,
        host,
        port,
        time_delay: Duration::from_secs_f64(delay_secs),
        log_file: cli
            .log_file
            .clone()
            .or(settings.log_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        log_level,
        colors: settings.colors,
        verbose: cli.verbose,
    })
}
