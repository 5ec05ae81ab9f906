//! `log` backend writing text or JSON lines to stderr and/or a log file.
//!
//! Console and file output carry independent levels. Stdout is never used:
//! it carries the report location and the optional console summary.

use anyhow::{Context, Result};
use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `YYYY-MM-DD HH:MM:SS [LEVEL] message`
    Text,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("text") {
            Ok(LogFormat::Text)
        } else if s.eq_ignore_ascii_case("json") {
            Ok(LogFormat::Json)
        } else {
            Err(format!("Invalid log format: {}. Valid options: text, json", s))
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    Console,
    File(PathBuf),
    Both(PathBuf),
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub console_level: LevelFilter,
    /// Level for the log file; ignored for `LogDestination::Console`
    pub file_level: Option<LevelFilter>,
    pub format: LogFormat,
    pub destination: LogDestination,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_level: LevelFilter::Info,
            file_level: None,
            format: LogFormat::Text,
            destination: LogDestination::Console,
        }
    }
}

impl LogConfig {
    /// Most verbose level any destination accepts
    pub fn max_level(&self) -> LevelFilter {
        self.file_level.map_or(self.console_level, |file_level| file_level.max(self.console_level))
    }
}

/// One JSON log line
#[derive(Debug, Serialize)]
struct JsonLine<'a> {
    timestamp: String,
    level: &'a str,
    message: String,
    /// Emitting module, at debug and trace level only
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<&'a str>,
}

struct LogFile {
    level: LevelFilter,
    handle: Mutex<File>,
}

pub struct StatsLogger {
    format: LogFormat,
    console: Option<LevelFilter>,
    file: Option<LogFile>,
}

impl StatsLogger {
    /// Create a logger, opening (appending to) the log file if one is configured
    pub fn new(config: LogConfig) -> Result<Self> {
        let (console, file_path) = match config.destination {
            LogDestination::Console => (Some(config.console_level), None),
            LogDestination::File(path) => (None, Some(path)),
            LogDestination::Both(path) => (Some(config.console_level), Some(path)),
        };

        let file = match file_path {
            Some(path) => {
                let handle = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .with_context(|| format!("Failed to open log file: {}", path.display()))?;
                Some(LogFile {
                    level: config.file_level.unwrap_or(config.console_level),
                    handle: Mutex::new(handle),
                })
            }
            None => None,
        };

        Ok(Self {
            format: config.format,
            console,
            file,
        })
    }

    fn timestamp() -> String {
        Local::now().format(TIMESTAMP_FORMAT).to_string()
    }

    fn to_console(&self, level: Level) -> bool {
        self.console.map_or(false, |max| level <= max)
    }

    fn to_file(&self, level: Level) -> bool {
        self.file.as_ref().map_or(false, |file| level <= file.level)
    }

    fn render(&self, level: Level, target: &str, message: String) -> String {
        let level_name = level.as_str();
        match self.format {
            LogFormat::Text => format!("{} [{}] {}", Self::timestamp(), level_name, message),
            LogFormat::Json => {
                let line = JsonLine {
                    timestamp: Self::timestamp(),
                    level: level_name,
                    target: (level >= Level::Debug).then_some(target),
                    message,
                };
                serde_json::to_string(&line).unwrap_or_else(|e| format!("{{\"level\":\"ERROR\",\"message\":\"unserializable log line: {}\"}}", e))
            }
        }
    }
}

impl Log for StatsLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.to_console(metadata.level()) || self.to_file(metadata.level())
    }

    fn log(&self, record: &Record) {
        let level = record.level();
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = self.render(level, record.target(), record.args().to_string());

        if self.to_console(level) {
            let _ = writeln!(io::stderr().lock(), "{}", line);
        }

        if let Some(file) = self.file.as_ref().filter(|file| level <= file.level) {
            if let Err(e) = writeln!(file.handle.lock(), "{}", line) {
                let _ = writeln!(io::stderr(), "Log file write failed ({}): {}", e, line);
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
        if let Some(file) = &self.file {
            let _ = file.handle.lock().flush();
        }
    }
}

/// Install the global logger
pub fn init_logger(config: LogConfig) -> Result<()> {
    let max_level = config.max_level();
    let logger = StatsLogger::new(config)?;

    log::set_boxed_logger(Box::new(logger)).context("Failed to set global logger")?;
    log::set_max_level(max_level);
    Ok(())
}

/// Parse a level name (`error` .. `trace`, or `off`), case-insensitively
pub fn parse_log_level(level: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(level.trim()).map_err(|_| {
        anyhow::anyhow!("Invalid log level: {}. Valid levels: error, warn, info, debug, trace, off", level)
    })
}
