//! Command-line flags. Everything here is optional; the settings file and
//! built-in defaults fill the gaps (see the config module for precedence).

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use tracing::level_filters::LevelFilter;

#[derive(Debug, Parser, Default)]
#[command(
    name = "rfchat",
    about = "Chat client for AX.25 packet radio networks (KISS TNC)",
    version
)]
pub struct Cli {
    /// Your callsign (required here or in the settings file).
    #[arg(short, long)]
    pub callsign: Option<String>,

    /// KISS TNC host.
    #[arg(short = 'k', long)]
    pub host: Option<String>,

    /// Port on the KISS TNC host.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Minimum delay between transmissions, in seconds.
    #[arg(short, long)]
    pub time_delay: Option<f64>,

    /// Settings file (default: $XDG_CONFIG_HOME/rfchat/settings.toml).
    #[arg(short, long)]
    pub settings_file: Option<PathBuf>,

    /// Log file to append to.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log level for file output.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Raise the log level one step per use.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// One step more verbose per `-v`, saturating at trace.
    pub fn raise(self, steps: u8) -> LogLevel {
        let mut level = self;
        for _ in 0..steps {
            level = match level {
                LogLevel::Error => LogLevel::Warn,
                LogLevel::Warn => LogLevel::Info,
                LogLevel::Info => LogLevel::Debug,
                LogLevel::Debug | LogLevel::Trace => LogLevel::Trace,
            };
        }
        level
    }

    pub fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <LogLevel as ValueEnum>::from_str(s, true)
    }
}
