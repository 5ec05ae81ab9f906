//! Application initialization and configuration

use anyhow::{anyhow, bail, Result};
use log::{debug, LevelFilter};
use std::str::FromStr;
use crate::{cli, config, logging};

pub fn load_configuration(args: &cli::Args) -> Result<config::ConfigManager> {
    let mut manager = if let Some(config_file) = &args.config_file {
        debug!("Loading configuration from explicit file: {}", config_file.display());
        config::ConfigManager::load_from_file(config_file.clone())?
    } else {
        config::ConfigManager::load()?
    };

    if let Some(section_name) = &args.config_name {
        manager.select_section(section_name.clone());
    }

    Ok(manager)
}

/// Resolve logging settings; command line flags take precedence over the configuration file
pub fn configure_logging(args: &cli::Args, config: &config::ConfigManager) -> Result<logging::LogConfig> {
    let flags = &args.logging;

    let console_level = match flags.console_level() {
        Some(level) => level,
        None => config.get_log_level("base", "console-level").unwrap_or_else(|e| {
            debug!("Ignoring console-level from config: {:#}", e);
            None
        })
        .unwrap_or(LevelFilter::Info),
    };

    let format = match flags.log_format.as_deref().or_else(|| config.get_value("base", "log-format").map(String::as_str)) {
        Some(name) => logging::LogFormat::from_str(name).map_err(|e| anyhow!(e))?,
        None => logging::LogFormat::Text,
    };

    let file_level = match flags.log_file_level.as_deref() {
        Some(level) => Some(logging::parse_log_level(level)?),
        None => config.get_log_level("base", "file-log-level").unwrap_or_else(|e| {
            debug!("Ignoring file-log-level from config: {:#}", e);
            None
        }),
    };

    let file_only = flags.log_file_only
        || config.get_bool("base", "log-file-only").unwrap_or_else(|e| {
            debug!("Ignoring log-file-only from config: {:#}", e);
            None
        })
        .unwrap_or(false);

    let destination = match flags.log_file.clone().or_else(|| config.get_path("base", "log-file")) {
        Some(path) if file_only => logging::LogDestination::File(path),
        Some(path) => logging::LogDestination::Both(path),
        None if file_level.is_some() => bail!("A file log level is configured without a log file"),
        None if file_only => bail!("log-file-only is set without a log file"),
        None => logging::LogDestination::Console,
    };

    Ok(logging::LogConfig {
        console_level,
        // The file follows the console unless it has its own level
        file_level: match destination {
            logging::LogDestination::Console => None,
            _ => Some(file_level.unwrap_or(console_level)),
        },
        format,
        destination,
    })
}
