use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of scalar knobs carried by [`CrtSettings`].
pub const FIELD_COUNT: usize = 14;

/// Groups used to lay out the control panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelSection {
    Optics,
    Phosphor,
    Signal,
    Temporal,
}

impl PanelSection {
    pub fn title(self) -> &'static str {
        match self {
            PanelSection::Optics => "OPTICS & GEOMETRY",
            PanelSection::Phosphor => "PHOSPHOR & GRID",
            PanelSection::Signal => "SIGNAL GLITCH",
            PanelSection::Temporal => "TEMPORAL INSTABILITY",
        }
    }
}

/// One knob of the CRT simulation.
///
/// Variants are declared in panel order; `SettingField::ALL` preserves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingField {
    FishEyeStrength,
    ScreenZoom,
    VignetteIntensity,
    GridOpacity,
    GridSpacing,
    ScanlineDensity,
    ScanlineOpacity,
    TextAnaglyph,
    GridAnaglyph,
    SignalShift,
    JitterChance,
    JitterIntensity,
    GlobalJitterChance,
    GlobalJitterStrength,
}

struct FieldSpec {
    uniform: &'static str,
    key: &'static str,
    label: &'static str,
    section: PanelSection,
    default: f32,
    min: f32,
    max: f32,
}

const SPECS: [FieldSpec; FIELD_COUNT] = [
    FieldSpec {
        uniform: "fishEyeStrength",
        key: "fish_eye_strength",
        label: "Fish Eye",
        section: PanelSection::Optics,
        default: 0.90,
        min: -2.0,
        max: 2.0,
    },
    FieldSpec {
        uniform: "screenZoom",
        key: "screen_zoom",
        label: "Zoom",
        section: PanelSection::Optics,
        default: 1.40,
        min: 0.0,
        max: 2.5,
    },
    FieldSpec {
        uniform: "vignetteIntensity",
        key: "vignette_intensity",
        label: "Vignette",
        section: PanelSection::Optics,
        default: 0.90,
        min: 0.0,
        max: 2.0,
    },
    FieldSpec {
        uniform: "gridOpacity",
        key: "grid_opacity",
        label: "Grid Opacity",
        section: PanelSection::Phosphor,
        default: 0.05,
        min: 0.0,
        max: 1.0,
    },
    FieldSpec {
        uniform: "gridSpacing",
        key: "grid_spacing",
        label: "Grid Spacing",
        section: PanelSection::Phosphor,
        default: 80.0,
        min: 10.0,
        max: 400.0,
    },
    FieldSpec {
        uniform: "scanlineDensity",
        key: "scanline_density",
        label: "Scanline Density",
        section: PanelSection::Phosphor,
        default: 0.50,
        min: 0.0,
        max: 50.0,
    },
    FieldSpec {
        uniform: "scanlineOpacity",
        key: "scanline_opacity",
        label: "Scanline Opacity",
        section: PanelSection::Phosphor,
        default: 0.05,
        min: 0.0,
        max: 0.5,
    },
    FieldSpec {
        uniform: "textAnaglyph",
        key: "text_anaglyph",
        label: "Text Anaglyph",
        section: PanelSection::Signal,
        default: 4.0,
        min: 0.0,
        max: 50.0,
    },
    FieldSpec {
        uniform: "gridAnaglyph",
        key: "grid_anaglyph",
        label: "Grid Anaglyph",
        section: PanelSection::Signal,
        default: 6.0,
        min: 0.0,
        max: 50.0,
    },
    FieldSpec {
        uniform: "signalShift",
        key: "signal_shift",
        label: "Signal Shift",
        section: PanelSection::Signal,
        default: 15.0,
        min: -100.0,
        max: 100.0,
    },
    FieldSpec {
        uniform: "jitterChance",
        key: "jitter_chance",
        label: "Jitter Chance",
        section: PanelSection::Temporal,
        default: 0.01,
        min: 0.0,
        max: 0.9,
    },
    FieldSpec {
        uniform: "jitterIntensity",
        key: "jitter_intensity",
        label: "Jitter Intensity",
        section: PanelSection::Temporal,
        default: 45.0,
        min: 0.0,
        max: 200.0,
    },
    FieldSpec {
        uniform: "globalJitterChance",
        key: "global_jitter_chance",
        label: "Global Jitter Chance",
        section: PanelSection::Temporal,
        default: 0.005,
        min: 0.0,
        max: 0.9,
    },
    FieldSpec {
        uniform: "globalJitterStrength",
        key: "global_jitter_strength",
        label: "Global Jitter Power",
        section: PanelSection::Temporal,
        default: 25.0,
        min: 0.0,
        max: 150.0,
    },
];

impl SettingField {
    pub const ALL: [SettingField; FIELD_COUNT] = [
        SettingField::FishEyeStrength,
        SettingField::ScreenZoom,
        SettingField::VignetteIntensity,
        SettingField::GridOpacity,
        SettingField::GridSpacing,
        SettingField::ScanlineDensity,
        SettingField::ScanlineOpacity,
        SettingField::TextAnaglyph,
        SettingField::GridAnaglyph,
        SettingField::SignalShift,
        SettingField::JitterChance,
        SettingField::JitterIntensity,
        SettingField::GlobalJitterChance,
        SettingField::GlobalJitterStrength,
    ];

    fn spec(self) -> &'static FieldSpec {
        &SPECS[self as usize]
    }

    /// Identifier of the matching `float` uniform in the CRT shader.
    pub fn uniform_name(self) -> &'static str {
        self.spec().uniform
    }

    /// Snake-case key used in configuration files.
    pub fn key(self) -> &'static str {
        self.spec().key
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn section(self) -> PanelSection {
        self.spec().section
    }

    pub fn default_value(self) -> f32 {
        self.spec().default
    }

    /// Slider range exposed by the control panel.
    pub fn range(self) -> RangeInclusive<f32> {
        let spec = self.spec();
        spec.min..=spec.max
    }

    pub fn clamp(self, value: f32) -> f32 {
        let spec = self.spec();
        value.clamp(spec.min, spec.max)
    }
}

impl fmt::Display for SettingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uniform_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown CRT setting '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for SettingField {
    type Err = UnknownField;

    /// Accepts the uniform name (`screenZoom`), the config key (`screen_zoom`)
    /// or a kebab-case spelling (`screen-zoom`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let snake = trimmed.replace('-', "_");
        SettingField::ALL
            .into_iter()
            .find(|field| field.uniform_name() == trimmed || field.key() == snake)
            .ok_or_else(|| UnknownField(trimmed.to_string()))
    }
}

/// Immutable bundle of every CRT knob.
///
/// Every change produces a new value; nothing here validates ranges, so
/// programmatic callers may push values outside the slider bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrtSettings {
    pub fish_eye_strength: f32,
    pub screen_zoom: f32,
    pub vignette_intensity: f32,
    pub grid_opacity: f32,
    pub grid_spacing: f32,
    pub scanline_density: f32,
    pub scanline_opacity: f32,
    pub text_anaglyph: f32,
    pub grid_anaglyph: f32,
    pub signal_shift: f32,
    pub jitter_chance: f32,
    pub jitter_intensity: f32,
    pub global_jitter_chance: f32,
    pub global_jitter_strength: f32,
}

impl Default for CrtSettings {
    fn default() -> Self {
        Self {
            fish_eye_strength: 0.90,
            screen_zoom: 1.40,
            vignette_intensity: 0.90,
            grid_opacity: 0.05,
            grid_spacing: 80.0,
            scanline_density: 0.50,
            scanline_opacity: 0.05,
            text_anaglyph: 4.0,
            grid_anaglyph: 6.0,
            signal_shift: 15.0,
            jitter_chance: 0.01,
            jitter_intensity: 45.0,
            global_jitter_chance: 0.005,
            global_jitter_strength: 25.0,
        }
    }
}

impl CrtSettings {
    pub fn get(&self, field: SettingField) -> f32 {
        match field {
            SettingField::FishEyeStrength => self.fish_eye_strength,
            SettingField::ScreenZoom => self.screen_zoom,
            SettingField::VignetteIntensity => self.vignette_intensity,
            SettingField::GridOpacity => self.grid_opacity,
            SettingField::GridSpacing => self.grid_spacing,
            SettingField::ScanlineDensity => self.scanline_density,
            SettingField::ScanlineOpacity => self.scanline_opacity,
            SettingField::TextAnaglyph => self.text_anaglyph,
            SettingField::GridAnaglyph => self.grid_anaglyph,
            SettingField::SignalShift => self.signal_shift,
            SettingField::JitterChance => self.jitter_chance,
            SettingField::JitterIntensity => self.jitter_intensity,
            SettingField::GlobalJitterChance => self.global_jitter_chance,
            SettingField::GlobalJitterStrength => self.global_jitter_strength,
        }
    }

    fn slot_mut(&mut self, field: SettingField) -> &mut f32 {
        match field {
            SettingField::FishEyeStrength => &mut self.fish_eye_strength,
            SettingField::ScreenZoom => &mut self.screen_zoom,
            SettingField::VignetteIntensity => &mut self.vignette_intensity,
            SettingField::GridOpacity => &mut self.grid_opacity,
            SettingField::GridSpacing => &mut self.grid_spacing,
            SettingField::ScanlineDensity => &mut self.scanline_density,
            SettingField::ScanlineOpacity => &mut self.scanline_opacity,
            SettingField::TextAnaglyph => &mut self.text_anaglyph,
            SettingField::GridAnaglyph => &mut self.grid_anaglyph,
            SettingField::SignalShift => &mut self.signal_shift,
            SettingField::JitterChance => &mut self.jitter_chance,
            SettingField::JitterIntensity => &mut self.jitter_intensity,
            SettingField::GlobalJitterChance => &mut self.global_jitter_chance,
            SettingField::GlobalJitterStrength => &mut self.global_jitter_strength,
        }
    }

    /// Returns a copy with `field` replaced by `value`.
    #[must_use]
    pub fn with(mut self, field: SettingField, value: f32) -> Self {
        *self.slot_mut(field) = value;
        self
    }

    /// Returns a copy with every field listed in `overrides` replaced.
    #[must_use]
    pub fn with_overrides(self, overrides: &SettingsOverride) -> Self {
        overrides
            .iter()
            .fold(self, |settings, (field, value)| settings.with(field, value))
    }

    /// All fields paired with their current value, in panel order.
    pub fn values(&self) -> impl Iterator<Item = (SettingField, f32)> + '_ {
        SettingField::ALL
            .into_iter()
            .map(move |field| (field, self.get(field)))
    }

    /// Linear blend towards `other`; `t` is clamped to `0..=1`.
    #[must_use]
    pub fn lerp(&self, other: &CrtSettings, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        SettingField::ALL.into_iter().fold(*self, |settings, field| {
            let value = self.get(field) * (1.0 - t) + other.get(field) * t;
            settings.with(field, value)
        })
    }

    /// Copy with every field pulled into its slider range.
    #[must_use]
    pub fn clamped(&self) -> Self {
        self.values()
            .fold(*self, |settings, (field, value)| settings.with(field, field.clamp(value)))
    }
}

/// Partial set of field assignments, applied with [`CrtSettings::with_overrides`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsOverride(BTreeMap<SettingField, f32>);

impl SettingsOverride {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, field: SettingField, value: f32) -> Self {
        self.0.insert(field, value);
        self
    }

    pub fn get(&self, field: SettingField) -> Option<f32> {
        self.0.get(&field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SettingField, f32)> + '_ {
        self.0.iter().map(|(field, value)| (*field, *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses a `field=value` assignment as accepted on the command line.
    pub fn parse_assignment(raw: &str) -> Result<(SettingField, f32), String> {
        let (name, value) = raw
            .split_once('=')
            .ok_or_else(|| format!("expected FIELD=VALUE, got '{raw}'"))?;
        let field: SettingField = name.parse().map_err(|err: UnknownField| err.to_string())?;
        let value: f32 = value
            .trim()
            .parse()
            .map_err(|_| format!("invalid value '{}' for {field}", value.trim()))?;
        if !value.is_finite() {
            return Err(format!("{field} must be a finite number, got {value}"));
        }
        Ok((field, value))
    }
}

impl FromIterator<(SettingField, f32)> for SettingsOverride {
    fn from_iter<I: IntoIterator<Item = (SettingField, f32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
