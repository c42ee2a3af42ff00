//! Keyboard control panel for the preview window.
//!
//! The panel owns the bundle being edited and hands back a whole new
//! [`CrtSettings`] for every change; the window pushes it to the GPU.

use crtconfig::{CrtSettings, SettingField};

/// Fraction of a field's range moved by one nudge.
const FINE_STEP: f32 = 0.01;
const COARSE_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKey {
    Up,
    Down,
    Left,
    Right,
    Reset,
    NextPreset,
    ToggleReadout,
}

/// Outcome of a key press.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelUpdate {
    /// Nothing to push to the shader.
    Unchanged,
    /// Bind immediately.
    Immediate(CrtSettings),
    /// Blend towards a preset.
    Preset { name: String, settings: CrtSettings },
}

#[derive(Debug, Clone)]
pub struct ControlPanel {
    base: CrtSettings,
    settings: CrtSettings,
    presets: Vec<(String, CrtSettings)>,
    preset_index: Option<usize>,
    selected: usize,
    readout_visible: bool,
}

impl ControlPanel {
    pub fn new(base: CrtSettings, presets: Vec<(String, CrtSettings)>) -> Self {
        Self {
            base,
            settings: base,
            presets,
            preset_index: None,
            selected: 0,
            readout_visible: true,
        }
    }

    pub fn settings(&self) -> CrtSettings {
        self.settings
    }

    pub fn selected(&self) -> SettingField {
        SettingField::ALL[self.selected]
    }

    pub fn readout_visible(&self) -> bool {
        self.readout_visible
    }

    pub fn active_preset(&self) -> Option<&str> {
        self.preset_index
            .and_then(|index| self.presets.get(index))
            .map(|(name, _)| name.as_str())
    }

    pub fn handle(&mut self, key: PanelKey, coarse: bool) -> PanelUpdate {
        match key {
            PanelKey::Up => {
                self.selected = (self.selected + SettingField::ALL.len() - 1) % SettingField::ALL.len();
                PanelUpdate::Unchanged
            }
            PanelKey::Down => {
                self.selected = (self.selected + 1) % SettingField::ALL.len();
                PanelUpdate::Unchanged
            }
            PanelKey::Left => PanelUpdate::Immediate(self.nudge(-1.0, coarse)),
            PanelKey::Right => PanelUpdate::Immediate(self.nudge(1.0, coarse)),
            PanelKey::Reset => {
                self.preset_index = None;
                self.settings = self.base;
                PanelUpdate::Immediate(self.settings)
            }
            PanelKey::NextPreset => match self.next_preset() {
                Some((name, settings)) => PanelUpdate::Preset { name, settings },
                None => PanelUpdate::Unchanged,
            },
            PanelKey::ToggleReadout => {
                self.readout_visible = !self.readout_visible;
                PanelUpdate::Unchanged
            }
        }
    }

    /// Moves the selected field one step in `direction`, clamped to its range.
    pub fn nudge(&mut self, direction: f32, coarse: bool) -> CrtSettings {
        let field = self.selected();
        let range = field.range();
        let fraction = if coarse { COARSE_STEP } else { FINE_STEP };
        let step = (range.end() - range.start()) * fraction;
        let value = field.clamp(self.settings.get(field) + direction.signum() * step);
        self.settings = self.settings.with(field, value);
        self.settings
    }

    fn next_preset(&mut self) -> Option<(String, CrtSettings)> {
        if self.presets.is_empty() {
            return None;
        }
        let index = self
            .preset_index
            .map_or(0, |current| (current + 1) % self.presets.len());
        self.preset_index = Some(index);
        let (name, settings) = self.presets[index].clone();
        self.settings = settings;
        Some((name, settings))
    }

    /// Single-line description of the selected field, e.g.
    /// `OPTICS & GEOMETRY > Zoom 1.40 [0.00 .. 2.50]`.
    pub fn readout(&self) -> String {
        let field = self.selected();
        let range = field.range();
        format!(
            "{} > {} {:.2} [{:.2} .. {:.2}]",
            field.section().title(),
            field.label(),
            self.settings.get(field),
            range.start(),
            range.end()
        )
    }

    pub fn window_title(&self) -> String {
        let mut title = String::from("cathode");
        if let Some(preset) = self.active_preset() {
            title.push_str(&format!(" ({preset})"));
        }
        if self.readout_visible {
            title.push_str(" | ");
            title.push_str(&self.readout());
        }
        title
    }
}
