//! Parameter model and configuration file for the cathode CRT simulator.
//!
//! [`CrtSettings`] is the immutable knob bundle fed to the CRT shader;
//! [`CathodeConfig`] is the optional `cathode.toml` that layers overrides,
//! named presets, and typewriter timing on top of the defaults.

mod settings;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

pub use settings::{
    CrtSettings, PanelSection, SettingField, SettingsOverride, UnknownField, FIELD_COUNT,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("preset '{0}' not found")]
    UnknownPreset(String),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CathodeConfig {
    pub version: u32,
    #[serde(default, skip_serializing_if = "SettingsOverride::is_empty")]
    pub settings: SettingsOverride,
    #[serde(default)]
    pub reveal: RevealConfig,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub presets: BTreeMap<String, SettingsOverride>,
}

impl Default for CathodeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            settings: SettingsOverride::default(),
            reveal: RevealConfig::default(),
            presets: BTreeMap::new(),
        }
    }
}

/// Timing for the character-by-character text reveal.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct RevealConfig {
    #[serde(
        default = "default_char_delay",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub char_delay: Duration,
    #[serde(
        default = "default_settle",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub settle: Duration,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            char_delay: default_char_delay(),
            settle: default_settle(),
        }
    }
}

fn default_char_delay() -> Duration {
    Duration::from_millis(40)
}

fn default_settle() -> Duration {
    Duration::from_millis(150)
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

/// Parses a `humantime` duration as accepted by `--char-delay`.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    humantime::parse_duration(raw.trim()).map_err(|err| format!("invalid duration '{raw}': {err}"))
}

impl CathodeConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: CathodeConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Defaults with the `[settings]` table applied.
    pub fn base_settings(&self) -> CrtSettings {
        CrtSettings::default().with_overrides(&self.settings)
    }

    /// Base settings with the named preset layered on top.
    pub fn preset(&self, name: &str) -> Result<CrtSettings, ConfigError> {
        let overrides = self
            .presets
            .get(name)
            .ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))?;
        Ok(self.base_settings().with_overrides(overrides))
    }

    /// Every preset resolved against the base settings, in name order.
    pub fn resolved_presets(&self) -> Vec<(String, CrtSettings)> {
        let base = self.base_settings();
        self.presets
            .iter()
            .map(|(name, overrides)| (name.clone(), base.with_overrides(overrides)))
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        validate_overrides("settings", &self.settings)?;

        for (name, overrides) in &self.presets {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid("preset names may not be empty".into()));
            }
            validate_overrides(&format!("presets.{name}"), overrides)?;
        }

        if self.reveal.char_delay.is_zero() {
            return Err(ConfigError::Invalid(
                "reveal.char_delay must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

fn validate_overrides(table: &str, overrides: &SettingsOverride) -> Result<(), ConfigError> {
    for (field, value) in overrides.iter() {
        if !value.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "{table}.{} must be a finite number",
                field.key()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1

[settings]
screen_zoom = 1.2
grid_opacity = 0.3

[reveal]
char_delay = "20ms"

[presets.warm]
vignette_intensity = 1.4

[presets.broken]
jitter_chance = 0.8
global_jitter_strength = 150
"#;

    #[test]
    fn parses_sample_config() {
        let config = CathodeConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.version, 1);
        assert_eq!(config.reveal.char_delay, Duration::from_millis(20));
        assert_eq!(config.reveal.settle, Duration::from_millis(150));
        assert_eq!(config.presets.len(), 2);

        let base = config.base_settings();
        assert_eq!(base.screen_zoom, 1.2);
        assert_eq!(base.grid_opacity, 0.3);
        assert_eq!(base.vignette_intensity, 0.90);
    }

    #[test]
    fn presets_layer_over_settings_table() {
        let config = CathodeConfig::from_toml_str(SAMPLE).unwrap();
        let warm = config.preset("warm").unwrap();
        assert_eq!(warm.vignette_intensity, 1.4);
        assert_eq!(warm.screen_zoom, 1.2);

        let names: Vec<_> = config
            .resolved_presets()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["broken".to_string(), "warm".to_string()]);
        assert!(matches!(
            config.preset("missing"),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = CathodeConfig::from_toml_str("version = 1").unwrap();
        assert_eq!(config.base_settings(), CrtSettings::default());
        assert_eq!(config.reveal, RevealConfig::default());
    }

    #[test]
    fn rejects_unknown_version() {
        let err = CathodeConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_non_finite_values() {
        let err = CathodeConfig::from_toml_str(
            r#"
version = 1

[settings]
signal_shift = nan
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_char_delay() {
        let err = CathodeConfig::from_toml_str(
            r#"
version = 1

[reveal]
char_delay = 0
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_field_names() {
        let err = CathodeConfig::from_toml_str(
            r#"
version = 1

[settings]
brightness = 1.0
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn out_of_range_values_are_accepted() {
        let config = CathodeConfig::from_toml_str(
            r#"
version = 1

[settings]
screen_zoom = 12.0
"#,
        )
        .unwrap();
        assert_eq!(config.base_settings().screen_zoom, 12.0);
    }

    #[test]
    fn serialized_config_parses_back() {
        let config = CathodeConfig::from_toml_str(SAMPLE).unwrap();
        let text = config.to_toml_string().unwrap();
        let reparsed = CathodeConfig::from_toml_str(&text).unwrap();
        assert_eq!(reparsed.base_settings(), config.base_settings());
        assert_eq!(reparsed.reveal, config.reveal);
    }
}
