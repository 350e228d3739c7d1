use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use wbkeys_core::CryptoConfig;

use crate::errors::CliError;

/// Contents of `config.toml`. Every section is optional.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WbkeysConfig {
    #[serde(default)]
    pub crypto: CryptoConfig,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Filter directive used when `WBKEYS_LOG` is not set
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

/// Load the config from `explicit` or the default location.
///
/// A missing default file yields the defaults; a missing explicit file is an error.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<WbkeysConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::not_found(
                    format!("No config found at {}", path.display()),
                    "Check --config or WBKEYS_CONFIG",
                )
                .into());
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Ok(path) if path.exists() => path,
            _ => return Ok(WbkeysConfig::default()),
        },
    };

    let config = read_config(&path)?;
    config
        .crypto
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))?;
    Ok(config)
}

pub fn read_config(path: &Path) -> anyhow::Result<WbkeysConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("wbkeys"));
        }
    }
    Ok(home_dir()?.join(".config").join("wbkeys"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
