use std::fmt::Write as _;

use anyhow::{Context, Result};
use crtconfig::{CrtSettings, FIELD_COUNT};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::cli::DumpFormat;

/// Field table grouped by panel section. Values that differ from the
/// built-in default are marked with `*`.
pub fn render_list(settings: &CrtSettings) -> String {
    let mut output = String::new();
    let mut section = None;
    for (field, value) in settings.values() {
        if section != Some(field.section()) {
            section = Some(field.section());
            let _ = writeln!(output, "{}:", field.section().title());
        }
        let range = field.range();
        let marker = if value == field.default_value() { "" } else { " *" };
        let _ = writeln!(
            output,
            "  {:<24} {:<22} {:>9.3}  [{:.2} .. {:.2}]  {}{marker}",
            field.key(),
            field.uniform_name(),
            value,
            range.start(),
            range.end(),
            field.label(),
        );
    }
    output
}

/// Resolved bundle as JSON, or as a `cathode.toml` document with a
/// `[settings]` table.
pub fn render_dump(settings: &CrtSettings, format: DumpFormat) -> Result<String> {
    let table = SettingsTable(*settings);
    match format {
        DumpFormat::Json => {
            serde_json::to_string_pretty(&table).context("failed to serialize settings to JSON")
        }
        DumpFormat::Toml => toml::to_string_pretty(&SettingsDocument {
            version: 1,
            settings: table,
        })
        .context("failed to serialize settings to TOML"),
    }
}

#[derive(Serialize)]
struct SettingsDocument {
    version: u32,
    settings: SettingsTable,
}

/// Serialises in panel order with config-file keys.
struct SettingsTable(CrtSettings);

impl Serialize for SettingsTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FIELD_COUNT))?;
        for (field, value) in self.0.values() {
            map.serialize_entry(field.key(), &decimal(value))?;
        }
        map.end()
    }
}

/// Widens to `f64` through the shortest decimal form so `0.9_f32` prints as
/// `0.9` rather than `0.8999999761581421`.
fn decimal(value: f32) -> f64 {
    value.to_string().parse().unwrap_or(f64::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crtconfig::SettingField;

    #[test]
    fn list_groups_fields_and_marks_changes() {
        let settings = CrtSettings::default().with(SettingField::GridSpacing, 12.0);
        let output = render_list(&settings);
        assert!(output.starts_with("OPTICS & GEOMETRY:\n"));
        assert!(output.contains("PHOSPHOR & GRID:"));
        assert!(output.contains("TEMPORAL INSTABILITY:"));
        assert_eq!(output.lines().count(), FIELD_COUNT + 4);
        let spacing = output
            .lines()
            .find(|line| line.contains("gridSpacing"))
            .unwrap();
        assert!(spacing.contains("12.000"));
        assert!(spacing.ends_with(" *"));
        let zoom = output
            .lines()
            .find(|line| line.contains("screenZoom"))
            .unwrap();
        assert!(zoom.contains("1.400"));
        assert!(!zoom.ends_with('*'));
    }

    #[test]
    fn toml_dump_round_trips_through_config() {
        let settings = CrtSettings::default().with(SettingField::SignalShift, 2.5);
        let dumped = render_dump(&settings, DumpFormat::Toml).unwrap();
        assert!(dumped.contains("fish_eye_strength = 0.9\n"));
        let config = crtconfig::CathodeConfig::from_toml_str(&dumped).unwrap();
        assert_eq!(config.base_settings(), settings);
    }

    #[test]
    fn json_dump_uses_panel_order() {
        let dumped = render_dump(&CrtSettings::default(), DumpFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&dumped).unwrap();
        assert_eq!(value["screen_zoom"], serde_json::json!(1.4));
        let fish = dumped.find("fish_eye_strength").unwrap();
        let jitter = dumped.find("global_jitter_strength").unwrap();
        assert!(fish < jitter);
    }
}
