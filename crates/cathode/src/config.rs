use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use crtconfig::{CathodeConfig, CrtSettings, SettingsOverride};

use crate::paths::AppPaths;

/// Configuration as loaded for this run, with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: PathBuf,
    /// False when the default location had no file and built-in defaults apply.
    pub from_file: bool,
    pub config: CathodeConfig,
}

impl LoadedConfig {
    /// Loads `explicit` when given (it must exist), otherwise `cathode.toml`
    /// from the config directory if present.
    pub fn load(paths: &AppPaths, explicit: Option<&Path>) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| paths.config_file());

        if !path.exists() {
            if explicit.is_some() {
                bail!("config file {} does not exist", path.display());
            }
            tracing::debug!(path = %path.display(), "no config file; using built-in defaults");
            return Ok(Self {
                path,
                from_file: false,
                config: CathodeConfig::default(),
            });
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file at {}", path.display()))?;
        let config = CathodeConfig::from_toml_str(&contents)
            .with_context(|| format!("failed to parse config file at {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            overrides = config.settings.len(),
            presets = config.presets.len(),
            "loaded config file"
        );
        Ok(Self {
            path,
            from_file: true,
            config,
        })
    }

    /// Layers defaults, the `[settings]` table, an optional preset, and the
    /// command-line overrides, in that order. Values are not clamped.
    pub fn resolve_settings(
        &self,
        preset: Option<&str>,
        overrides: &SettingsOverride,
    ) -> Result<CrtSettings> {
        let base = match preset {
            Some(name) => self.config.preset(name)?,
            None => self.config.base_settings(),
        };
        Ok(base.with_overrides(overrides))
    }
}
