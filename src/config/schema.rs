use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::battle::RoundPreset;

/// Application settings, read from `~/.config/battle-judge/config.yaml`.
///
/// Example YAML:
/// ```yaml
/// reports_dir: "~/battles"
/// colors: false
/// presets:
///   - { name: "4x4", turns_per_mc: 2, patterns_per_turn: 2 }
///   - { name: "Deluxe", turns_per_mc: 2, patterns_per_turn: 4 }
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Extra or overriding round formats on top of the builtin catalogue
    #[serde(default)]
    pub presets: Option<Vec<RoundPreset>>,

    /// Where `judge` writes finished battle reports (default: current directory)
    #[serde(default)]
    pub reports_dir: Option<PathBuf>,

    /// Force coloured output on or off (default: auto-detect TTY)
    #[serde(default)]
    pub colors: Option<bool>,
}
