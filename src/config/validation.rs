use std::collections::HashSet;

use super::schema::Settings;

/// Validate settings at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_settings(settings: &Settings) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(ref presets) = settings.presets {
        let mut names = HashSet::new();
        for (i, preset) in presets.iter().enumerate() {
            if preset.name.trim().is_empty() {
                errors.push(format!("presets[{}].name: must not be empty", i));
            } else if !names.insert(preset.name.as_str()) {
                errors.push(format!("presets[{}].name: duplicate preset '{}'", i, preset.name));
            }
            if preset.turns_per_mc < 1 {
                errors.push(format!("presets[{}].turns_per_mc: must be at least 1", i));
            }
            if preset.patterns_per_turn < 1 {
                errors.push(format!("presets[{}].patterns_per_turn: must be at least 1", i));
            }
        }
    }

    if let Some(ref dir) = settings.reports_dir {
        if dir.as_os_str().is_empty() {
            errors.push("reports_dir: must not be empty".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::RoundPreset;
    use std::path::PathBuf;

    #[test]
    fn test_default_settings_valid() {
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn test_valid_presets() {
        let settings = Settings {
            presets: Some(vec![RoundPreset::new("Deluxe", 2, 4)]),
            ..Settings::default()
        };
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_zero_structure_rejected() {
        let settings = Settings {
            presets: Some(vec![RoundPreset::new("Broken", 0, 4)]),
            ..Settings::default()
        };
        let errors = validate_settings(&settings).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("presets[0].turns_per_mc"));
    }

    #[test]
    fn test_empty_reports_dir_rejected() {
        let settings = Settings {
            reports_dir: Some(PathBuf::new()),
            ..Settings::default()
        };
        let errors = validate_settings(&settings).unwrap_err();
        assert!(errors[0].starts_with("reports_dir"));
    }

    #[test]
    fn test_collects_all_errors() {
        let settings = Settings {
            presets: Some(vec![
                RoundPreset::new("Deluxe", 2, 4),
                RoundPreset::new("Deluxe", 0, 0), // Errors 1, 2, 3
                RoundPreset::new(" ", 1, 1),      // Error 4
            ]),
            ..Settings::default()
        };
        let errors = validate_settings(&settings).unwrap_err();
        assert_eq!(errors.len(), 4);
    }
}
