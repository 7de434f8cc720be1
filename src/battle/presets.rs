use serde::{Deserialize, Serialize};

/// A named round format with its default structure.
///
/// Example YAML (in `~/.config/battle-judge/config.yaml`):
/// ```yaml
/// presets:
///   - { name: "Deluxe", turns_per_mc: 2, patterns_per_turn: 4 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RoundPreset {
    pub name: String,
    pub turns_per_mc: u32,
    pub patterns_per_turn: u32,
}

impl RoundPreset {
    pub fn new(name: &str, turns_per_mc: u32, patterns_per_turn: u32) -> Self {
        Self {
            name: name.to_string(),
            turns_per_mc,
            patterns_per_turn,
        }
    }
}

/// Ordered list of round formats a battle can be assembled from.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundCatalogue {
    presets: Vec<RoundPreset>,
}

impl Default for RoundCatalogue {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RoundCatalogue {
    /// The standard formats of the Spanish-language freestyle circuit.
    pub fn builtin() -> Self {
        Self {
            presets: vec![
                RoundPreset::new("4x4", 4, 1),
                RoundPreset::new("8x8", 3, 2),
                RoundPreset::new("12x12", 2, 3),
                RoundPreset::new("Easy Mode", 1, 6),
                RoundPreset::new("Hard Mode", 1, 6),
                RoundPreset::new("Random Mode", 4, 2),
                RoundPreset::new("Beat Mode", 1, 4),
                RoundPreset::new("Minuto Libre", 1, 8),
                RoundPreset::new("Temática", 1, 4),
                RoundPreset::new("Acapella", 3, 3),
                RoundPreset::new("Objetos", 1, 4),
                RoundPreset::new("KickBack", 6, 1),
            ],
        }
    }

    /// Builtin formats with `extra` applied on top.
    /// A preset whose name matches a builtin replaces it in place; new names are appended.
    pub fn with_presets(extra: &[RoundPreset]) -> Self {
        let mut catalogue = Self::builtin();
        for preset in extra {
            catalogue.upsert(preset.clone());
        }
        catalogue
    }

    pub fn upsert(&mut self, preset: RoundPreset) {
        match self.presets.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
    }

    pub fn get(&self, name: &str) -> Option<&RoundPreset> {
        self.presets.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.iter().map(|p| p.name.as_str())
    }

    pub fn presets(&self) -> &[RoundPreset] {
        &self.presets
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}
