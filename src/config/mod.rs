mod schema;
pub mod validation;
pub mod wizard;

pub use schema::Settings;
pub use validation::validate_settings;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::battle::RoundCatalogue;

/// Get the config directory path (~/.config/battle-judge/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("battle-judge"))
}

/// Get the default settings file path (~/.config/battle-judge/config.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Load settings from a YAML file.
///
/// An explicit `path` must exist. Without one, the default path is used and a
/// missing file simply means default settings.
pub fn load_settings(path: Option<PathBuf>) -> Result<Settings> {
    let (settings_path, explicit) = match path {
        Some(p) => (p, true),
        None => (get_config_path()?, false),
    };

    if !settings_path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", settings_path.display());
        }
        tracing::debug!(path = %settings_path.display(), "no settings file, using defaults");
        return Ok(Settings::default());
    }

    parse_settings_file(&settings_path)
}

fn parse_settings_file(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let settings: Settings = serde_saphyr::from_str(&content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", path.display()))?;

    Ok(settings)
}

impl Settings {
    /// Round catalogue with any configured presets applied.
    pub fn catalogue(&self) -> RoundCatalogue {
        match &self.presets {
            Some(presets) => RoundCatalogue::with_presets(presets),
            None => RoundCatalogue::builtin(),
        }
    }

    /// Directory for battle reports, with a leading `~` expanded.
    pub fn reports_dir(&self) -> PathBuf {
        match &self.reports_dir {
            Some(dir) => expand_home(dir),
            None => PathBuf::from("."),
        }
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
