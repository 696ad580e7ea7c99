use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable that points at a config file, overriding [`DEFAULT_CONFIG_FILE`].
pub const CONFIG_ENV_VAR: &str = "TEXTREE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "textree.toml";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Number of lines printed when previewing a file.
    pub preview_lines: usize,
    pub show_line_numbers: bool,
    pub show_stats: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preview_lines: 20,
            show_line_numbers: true,
            show_stats: true,
        }
    }
}

pub fn parse(config_string: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(config_string)
}

/// Path of the config file: `$TEXTREE_CONFIG` if set, `./textree.toml` otherwise.
pub fn path() -> PathBuf {
    std::env::var_os(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Reads the config at `path`. A missing or unreadable file, or one that fails to parse, yields
/// the default config.
pub fn load(path: &Path) -> Config {
    std::fs::read_to_string(path)
        .map_err(|err| log::debug!("no config read from {}: {err}", path.display()))
        .ok()
        .and_then(|config_string| match parse(&config_string) {
            Ok(config) => Some(config),
            Err(err) => {
                log::warn!("config parsing failed: {err}");
                None
            }
        })
        .unwrap_or_default()
}

pub fn to_string(config: &Config) -> Option<String> {
    match toml::to_string(config) {
        Ok(config_string) => Some(config_string),
        Err(err) => {
            log::warn!("config serialization failed: {err}");
            None
        }
    }
}
