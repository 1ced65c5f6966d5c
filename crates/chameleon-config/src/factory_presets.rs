//! Factory presets bundled with chameleon.
//!
//! Embedded as TOML so they go through the same parser and validation as
//! user files.

use crate::Preset;

/// Factory preset identifiers, in listing order.
pub static FACTORY_PRESET_NAMES: &[&str] =
    &["voice", "clean", "chipmunk", "deep", "cave", "stadium", "radio"];

static FACTORY_PRESETS_TOML: &[(&str, &str)] = &[
    ("voice", VOICE_PRESET),
    ("clean", CLEAN_PRESET),
    ("chipmunk", CHIPMUNK_PRESET),
    ("deep", DEEP_PRESET),
    ("cave", CAVE_PRESET),
    ("stadium", STADIUM_PRESET),
    ("radio", RADIO_PRESET),
];

/// The default chain: gate, both cuts, no shift.
const VOICE_PRESET: &str = r#"
name = "Voice"
description = "Default voice cleanup: gate, 300 Hz low cut, 3 kHz high cut"
"#;

const CLEAN_PRESET: &str = r#"
name = "Clean"
description = "Volume and peak clamp only"

[settings]
gate_threshold = 0.0
low_cut_enabled = false
high_cut_enabled = false
"#;

const CHIPMUNK_PRESET: &str = r#"
name = "Chipmunk"
description = "Seven semitones up"

[settings]
pitch_semitones = 7.0
volume = 0.8
"#;

const DEEP_PRESET: &str = r#"
name = "Deep"
description = "Five semitones down with a little room"

[settings]
pitch_semitones = -5.0
volume = 0.9
reverb_amount = 0.2
"#;

const CAVE_PRESET: &str = r#"
name = "Cave"
description = "Heavy reverb, slight downward shift"

[settings]
pitch_semitones = -2.0
reverb_amount = 0.8
gate_threshold = 0.1
"#;

const STADIUM_PRESET: &str = r#"
name = "Stadium"
description = "Long echo over reverb"

[settings]
echo_amount = 0.6
reverb_amount = 0.4
"#;

const RADIO_PRESET: &str = r#"
name = "Radio"
description = "Narrow band, hard gate"

[settings]
gate_threshold = 0.35
volume = 1.0
"#;

/// Every factory preset, in listing order.
pub fn factory_presets() -> Vec<Preset> {
    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(_, toml)| Preset::from_toml(toml).ok())
        .collect()
}

/// Get a factory preset by identifier or display name, case-insensitively.
///
/// ```rust
/// use chameleon_config::get_factory_preset;
///
/// let preset = get_factory_preset("Chipmunk").unwrap();
/// assert_eq!(preset.settings.pitch_semitones, 7.0);
/// ```
pub fn get_factory_preset(name: &str) -> Option<Preset> {
    let name_lower = name.to_lowercase();
    if let Some((_, toml)) = FACTORY_PRESETS_TOML
        .iter()
        .find(|(id, _)| id.to_lowercase() == name_lower)
    {
        return Preset::from_toml(toml).ok();
    }
    factory_presets()
        .into_iter()
        .find(|preset| preset.name.to_lowercase() == name_lower)
}

/// Get the identifiers of all factory presets.
pub fn factory_preset_names() -> Vec<&'static str> {
    FACTORY_PRESET_NAMES.to_vec()
}

/// Check if a name matches a factory preset (case-insensitive).
///
/// ```rust
/// use chameleon_config::is_factory_preset;
///
/// assert!(is_factory_preset("cave"));
/// assert!(is_factory_preset("CAVE"));
/// assert!(!is_factory_preset("my_custom_preset"));
/// ```
pub fn is_factory_preset(name: &str) -> bool {
    get_factory_preset(name).is_some()
}
