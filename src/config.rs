// src/config.rs
// =============================================================================
// The settings file read once at startup.
//
// Default location is ./pagecrawl-config.toml:
//
//   [log]
//   path = "."
//   name = "pagecrawl"
//
//   [network]
//   from = ""
//
// Any missing key falls back to the value above. If the file doesn't exist
// at all we write the defaults out so there is something to edit next time.
// =============================================================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "pagecrawl-config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log: LogSettings,
    pub network: NetworkSettings,
}

/// Where the run's log file goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Directory the log file is created in
    pub path: PathBuf,
    /// File name prefix; the start time is appended
    pub name: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            path: PathBuf::from("."),
            name: "pagecrawl".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Contact address sent as the From header, may be empty
    pub from: String,
}

impl Settings {
    /// Loads settings from `path`, creating the file with defaults if it is
    /// missing. A file that exists but can't be read or parsed is an error.
    pub fn load(path: &Path) -> Result<Settings> {
        if !path.exists() {
            let settings = Settings::default();
            // Logging isn't up yet, so stderr it is
            if let Err(e) = settings.save(path) {
                eprintln!(
                    "Warning: could not write default settings to {}: {:#}",
                    path.display(),
                    e
                );
            }
            return Ok(settings);
        }

        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;

        toml::from_str(&text)
            .with_context(|| format!("failed to parse settings file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self).context("failed to encode settings")?;
        fs::write(path, text)
            .with_context(|| format!("failed to write settings file {}", path.display()))
    }
}
