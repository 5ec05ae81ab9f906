//! TOML configuration with section overlays.
//!
//! Settings are stored flattened as `section -> key -> value` strings.
//! Lookups try the section chosen with `--config-name` first, then the
//! requested section, then `base`; keys outside any table land in `base`.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use log::{debug, info};
use toml::Value;

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "CONCAT_STATS_CONFIG";

/// Section holding top-level keys and shared defaults
pub const BASE_SECTION: &str = "base";

/// Configuration storage - section_name -> key -> value
pub type Configuration = BTreeMap<String, BTreeMap<String, String>>;

/// Report settings resolved from the `[report]` section
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportConfig {
    /// Heading and page title of the generated report
    pub title: Option<String>,
    /// Print the console summary table after the report is written
    pub summary: bool,
}

#[derive(Debug, Default)]
pub struct ConfigManager {
    sections: Configuration,
    source: Option<PathBuf>,
    overlay: Option<String>,
}

impl ConfigManager {
    pub fn from_config(sections: Configuration) -> Self {
        Self {
            sections,
            ..Self::default()
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content).context("Failed to parse TOML content")?;

        let mut sections = Configuration::new();
        flatten_into(&mut sections, None, &table);
        debug!("Parsed configuration: {:?}", sections);

        Ok(Self::from_config(sections))
    }

    /// Load the first configuration file found on the discovery path, or defaults
    pub fn load() -> Result<Self> {
        match candidate_paths().into_iter().find(|path| path.is_file()) {
            Some(path) => Self::load_from_file(path),
            None => {
                info!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from_file(path: PathBuf) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut manager = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!("Loaded configuration from: {}", path.display());
        manager.source = Some(path);
        Ok(manager)
    }

    /// File the configuration was loaded from, if any
    pub fn config_file_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Prefer values from `section` over every other section (`--config-name`)
    pub fn select_section(&mut self, section: String) {
        debug!("Selecting configuration section: {}", section);
        self.overlay = Some(section);
    }

    pub fn get_value(&self, section: &str, key: &str) -> Option<&String> {
        self.overlay
            .as_deref()
            .into_iter()
            .chain([section, BASE_SECTION])
            .find_map(|name| self.sections.get(name)?.get(key))
    }

    /// Convert a value with `parse`, naming the offending key on failure
    fn get_parsed<T>(&self, section: &str, key: &str, parse: impl FnOnce(&str) -> Result<T>) -> Result<Option<T>> {
        self.get_value(section, key)
            .map(|value| parse(value).with_context(|| format!("Invalid value for {}.{}: {}", section, key, value)))
            .transpose()
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>> {
        self.get_parsed(section, key, |value| Ok(value.to_ascii_lowercase().parse::<bool>()?))
    }

    pub fn get_log_level(&self, section: &str, key: &str) -> Result<Option<log::LevelFilter>> {
        self.get_parsed(section, key, crate::logging::parse_log_level)
    }

    pub fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.get_value(section, key).map(PathBuf::from)
    }

    /// Settings of the `[report]` section
    pub fn get_report_config(&self) -> Result<ReportConfig> {
        let title = self
            .get_value("report", "title")
            .map(|title| title.trim())
            .filter(|title| !title.is_empty())
            .map(str::to_string);

        let summary = self
            .get_bool("report", "summary")
            .context("Invalid report configuration")?
            .unwrap_or(false);

        Ok(ReportConfig { title, summary })
    }
}

/// Configuration file locations, most specific first
fn candidate_paths() -> Vec<PathBuf> {
    let explicit = env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
    let user_config = dirs::config_dir().map(|dir| dir.join("concat-stats").join("config.toml"));
    let home_file = dirs::home_dir().map(|dir| dir.join(".concat-stats.toml"));

    let paths: Vec<PathBuf> = [explicit, user_config, home_file, Some(PathBuf::from(".concat-stats.toml"))]
        .into_iter()
        .flatten()
        .collect();

    debug!("Config discovery paths: {:?}", paths);
    paths
}

/// Flatten nested tables into dotted section names (`[ci.report]` -> `ci.report`)
fn flatten_into(sections: &mut Configuration, prefix: Option<&str>, table: &toml::Table) {
    for (key, value) in table {
        match value {
            Value::Table(child) => {
                let name = match prefix {
                    Some(prefix) => format!("{}.{}", prefix, key),
                    None => key.clone(),
                };
                flatten_into(sections, Some(&name), child);
            }
            scalar => {
                sections
                    .entry(prefix.unwrap_or(BASE_SECTION).to_string())
                    .or_default()
                    .insert(key.clone(), value_to_string(scalar));
            }
        }
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
