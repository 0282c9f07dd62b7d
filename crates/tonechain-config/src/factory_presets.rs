//! Factory presets bundled with the library.
//!
//! Embedded as TOML so they exercise the same parsing path as user files.

use crate::Preset;

/// Names of the bundled presets, in catalogue order.
pub static FACTORY_PRESET_NAMES: &[&str] = &["clean_boost", "crunch", "ambient_lead", "slapback"];

static FACTORY_PRESETS_TOML: &[(&str, &str)] = &[
    ("clean_boost", CLEAN_BOOST_PRESET),
    ("crunch", CRUNCH_PRESET),
    ("ambient_lead", AMBIENT_LEAD_PRESET),
    ("slapback", SLAPBACK_PRESET),
];

const CLEAN_BOOST_PRESET: &str = r#"
name = "Clean Boost"
description = "Transparent lift with a touch of room"
author = "tonechain"
tags = ["clean", "boost"]
created_at = "2026-01-01T00:00:00Z"
modified_at = "2026-01-01T00:00:00Z"

[[effects]]
type = "boost"
[effects.params]
gain_db = "6dB"
tone = "0.6"

[[effects]]
type = "reverb"
[effects.params]
room_size = "0.3"
wet_level = "15%"
dry_level = "90%"
"#;

const CRUNCH_PRESET: &str = r#"
name = "Crunch"
description = "Edge-of-breakup rhythm tone"
author = "tonechain"
tags = ["rhythm", "drive"]
created_at = "2026-01-01T00:00:00Z"
modified_at = "2026-01-01T00:00:00Z"

[[effects]]
type = "boost"
[effects.params]
gain_db = "4dB"

[[effects]]
type = "distortion"
[effects.params]
drive_db = "14dB"
tone = "0.55"
level = "0.6"

[[effects]]
type = "!reverb"
[effects.params]
wet_level = "20%"
"#;

const AMBIENT_LEAD_PRESET: &str = r#"
name = "Ambient Lead"
description = "Singing lead with long echoes and a big room"
author = "tonechain"
tags = ["lead", "ambient"]
created_at = "2026-01-01T00:00:00Z"
modified_at = "2026-01-01T00:00:00Z"

[[effects]]
type = "distortion"
[effects.params]
drive_db = "8dB"
tone = "0.45"
level = "0.6"

[[effects]]
type = "delay"
[effects.params]
delay_seconds = "450ms"
feedback = "45%"
mix = "35%"

[[effects]]
type = "reverb"
[effects.params]
room_size = "0.85"
damping = "0.4"
wet_level = "45%"
dry_level = "60%"
"#;

const SLAPBACK_PRESET: &str = r#"
name = "Slapback"
description = "Short single repeat for rockabilly and country"
author = "tonechain"
tags = ["delay", "vintage"]
created_at = "2026-01-01T00:00:00Z"
modified_at = "2026-01-01T00:00:00Z"

[[effects]]
type = "boost"
[effects.params]
gain_db = "2dB"
tone = "0.55"

[[effects]]
type = "delay"
[effects.params]
delay_seconds = "110ms"
feedback = "10%"
mix = "35%"
"#;

/// Look a factory preset up by name.
pub fn get_factory_preset(name: &str) -> Option<Preset> {
    FACTORY_PRESETS_TOML
        .iter()
        .find(|(preset_name, _)| *preset_name == name)
        .and_then(|(_, toml)| Preset::from_toml(toml).ok())
}

/// All factory presets, in catalogue order.
pub fn factory_presets() -> Vec<Preset> {
    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(_, toml)| Preset::from_toml(toml).ok())
        .collect()
}

/// Whether `name` is a factory preset.
pub fn is_factory_preset(name: &str) -> bool {
    FACTORY_PRESET_NAMES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_factory_preset_parses_and_validates() {
        let presets = factory_presets();
        assert_eq!(presets.len(), FACTORY_PRESET_NAMES.len());
        for preset in &presets {
            preset
                .validate()
                .unwrap_or_else(|e| panic!("{} invalid: {e}", preset.name));
            preset.to_chain().unwrap();
        }
    }

    #[test]
    fn names_table_matches_embedded_presets() {
        for name in FACTORY_PRESET_NAMES {
            assert!(get_factory_preset(name).is_some(), "{name} missing");
            assert!(is_factory_preset(name));
        }
        assert!(get_factory_preset("fuzz_wall").is_none());
        assert!(!is_factory_preset("fuzz_wall"));
    }

    #[test]
    fn crunch_contents() {
        let preset = get_factory_preset("crunch").unwrap();
        assert_eq!(preset.effect_types(), ["boost", "distortion", "!reverb"]);
        let chain = preset.to_chain().unwrap();
        assert_eq!(chain.nodes[1].param("drive_db"), Some(14.0));
        assert_eq!(chain.nodes[2].param("wet_level"), Some(0.2));
    }

    #[test]
    fn timestamps_are_fixed() {
        let a = get_factory_preset("slapback").unwrap();
        let b = get_factory_preset("slapback").unwrap();
        assert_eq!(a, b);
    }
}
