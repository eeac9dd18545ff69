//! Optional JSON overrides for `VegetationSettings` and the forest layout.
//!
//! `ARBORIST_SETTINGS` may point at a file such as
//!
//! ```json
//! { "winter_dead_model": true, "aging_step": 16 }
//! ```
//!
//! Missing keys keep their defaults. A missing or malformed file is logged
//! and ignored.

use std::path::Path;

use bevy::prelude::*;

use simulation::config::VegetationSettings;

pub const SETTINGS_ENV: &str = "ARBORIST_SETTINGS";

pub fn parse_settings(json: &str) -> Result<VegetationSettings, serde_json::Error> {
    serde_json::from_str(json)
}

pub fn load_settings(path: &Path) -> Option<VegetationSettings> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("Settings: cannot read {}: {}", path.display(), e);
            return None;
        }
    };
    match parse_settings(&text) {
        Ok(settings) => {
            info!("Settings: loaded {} ({:?})", path.display(), settings);
            Some(settings)
        }
        Err(e) => {
            warn!("Settings: {} is not valid JSON settings: {}", path.display(), e);
            None
        }
    }
}

/// Settings from `ARBORIST_SETTINGS`, or the defaults.
pub fn settings_from_env() -> VegetationSettings {
    std::env::var(SETTINGS_ENV)
        .ok()
        .and_then(|path| load_settings(Path::new(&path)))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = parse_settings(r#"{ "disable_all_growth": true }"#).expect("valid json");
        assert!(settings.disable_all_growth);
        assert_eq!(
            settings.aging_step,
            VegetationSettings::default().aging_step
        );
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(parse_settings("{ winter_dead_model: yes }").is_err());
    }
}
