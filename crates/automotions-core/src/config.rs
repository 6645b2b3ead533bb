use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::TournamentFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomotionsConfig {
    /// Statistics layout to assume instead of inferring it from the page.
    pub format: Option<TournamentFormat>,
    /// Base directory for relative ledger paths (e.g. a motions repository checkout).
    pub ledger_dir: Option<String>,
}

impl AutomotionsConfig {
    /// Fields set in `self` win over `fallback`.
    pub fn or(self, fallback: AutomotionsConfig) -> AutomotionsConfig {
        AutomotionsConfig {
            format: self.format.or(fallback.format),
            ledger_dir: self.ledger_dir.or(fallback.ledger_dir),
        }
    }

    pub fn resolve_ledger_path(&self, root: &Path, ledger: &Path) -> PathBuf {
        if ledger.is_absolute() {
            return ledger.to_path_buf();
        }
        match self.ledger_dir.as_deref().map(str::trim) {
            Some(dir) if !dir.is_empty() => root.join(dir).join(ledger),
            _ => root.join(ledger),
        }
    }
}

pub fn config_filename_candidates() -> [&'static str; 2] {
    [".automotions.toml", ".automotionsrc"]
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(".automotions.toml")
}

fn non_empty_env(name: &str) -> Option<PathBuf> {
    let value = std::env::var(name).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

pub fn resolve_automotions_home_dir() -> Option<PathBuf> {
    non_empty_env("AUTOMOTIONS_HOME").or_else(|| {
        non_empty_env("HOME")
            .or_else(|| non_empty_env("USERPROFILE"))
            .map(|home| home.join(".automotions"))
    })
}

pub fn global_config_path() -> Option<PathBuf> {
    resolve_automotions_home_dir().map(|home| home.join("config.toml"))
}

pub fn load_config(root: &Path) -> Option<AutomotionsConfig> {
    for name in config_filename_candidates() {
        let path = root.join(name);
        if path.is_file() {
            if let Ok(text) = fs::read_to_string(&path) {
                if let Ok(config) = toml::from_str::<AutomotionsConfig>(&text) {
                    return Some(config);
                }
            }
        }
    }
    None
}

pub fn load_global_config() -> Option<AutomotionsConfig> {
    let path = global_config_path()?;
    if !path.is_file() {
        return None;
    }
    let text = fs::read_to_string(path).ok()?;
    toml::from_str::<AutomotionsConfig>(&text).ok()
}

/// Project config layered over the global config.
pub fn resolve_config(root: &Path) -> AutomotionsConfig {
    load_config(root)
        .unwrap_or_default()
        .or(load_global_config().unwrap_or_default())
}

pub fn write_config(root: &Path, config: &AutomotionsConfig) -> Result<PathBuf, ConfigError> {
    let path = config_path(root);
    let body = toml::to_string_pretty(config)?;
    fs::write(&path, body)?;
    Ok(path)
}
