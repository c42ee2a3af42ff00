use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use crtconfig::{SettingField, SettingsOverride};
use renderer::{Antialiasing, ColorSpaceMode, CrossfadeCurve};

#[derive(Parser, Debug)]
#[command(
    name = "cathode",
    author,
    version,
    about = "CRT display simulator",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Image shown through the CRT; a generated test pattern is used when omitted.
    #[arg(long, value_name = "PATH")]
    pub image: Option<PathBuf>,

    /// GLSL fragment shader implementing `vec4 crtMain(vec2 fragCoord)`.
    #[arg(long, value_name = "PATH")]
    pub shader: Option<PathBuf>,

    /// Configuration file; defaults to `cathode.toml` in the config directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Start from the named preset of the configuration file.
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Override a single setting (e.g. `fish_eye_strength=1.2`). Repeatable.
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_setting)]
    pub set: Vec<(SettingField, f32)>,

    /// Preview window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<(u32, u32)>,

    /// Optional FPS cap for the preview (0=uncapped).
    #[arg(long, value_name = "FPS", value_parser = parse_fps)]
    pub fps: Option<f32>,

    /// Freeze the clock at this many seconds and only redraw on changes.
    #[arg(long, value_name = "SECONDS")]
    pub still: Option<f32>,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(
        long,
        value_name = "MODE",
        value_parser = parse_antialias,
        default_value = "auto"
    )]
    pub antialias: Antialiasing,

    /// Output color space handling: `auto`, `gamma`, or `linear`.
    #[arg(
        long,
        value_name = "MODE",
        value_parser = parse_color_space,
        default_value = "auto"
    )]
    pub color_space: ColorSpaceMode,

    /// Blend duration (ms) when cycling presets with Tab.
    #[arg(long, value_name = "MILLISECONDS", default_value_t = 600)]
    pub crossfade_ms: u64,

    /// Easing for preset blends: `linear`, `smoothstep`, or `ease-in-out`.
    #[arg(
        long,
        value_name = "CURVE",
        value_parser = parse_crossfade_curve,
        default_value_t = CrossfadeCurve::default()
    )]
    pub crossfade_curve: CrossfadeCurve,
}

impl RunArgs {
    pub fn overrides(&self) -> SettingsOverride {
        self.set.iter().copied().collect()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reveal text in the terminal one character at a time.
    Type(TypeArgs),
    /// Inspect the CRT settings bundle.
    Settings(SettingsCommand),
    /// Print resolved configuration paths.
    Where,
}

#[derive(Parser, Debug)]
pub struct TypeArgs {
    /// Text file to reveal; reads stdin when omitted.
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Delay between characters (e.g. `40ms`); defaults to the config file value.
    #[arg(long, value_name = "DURATION", value_parser = crtconfig::parse_duration)]
    pub char_delay: Option<Duration>,

    /// Disable highlight colours and the cursor.
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Parser, Debug)]
pub struct SettingsCommand {
    #[command(subcommand)]
    pub action: SettingsAction,
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Print every field with its uniform name, range, and resolved value.
    List,
    /// Print the resolved bundle.
    Dump {
        #[arg(long, value_enum, default_value_t = DumpFormat::Toml)]
        format: DumpFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DumpFormat {
    Toml,
    Json,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_setting(value: &str) -> Result<(SettingField, f32), String> {
    SettingsOverride::parse_assignment(value)
}

const MIN_FPS_CAP: f32 = 0.01;
const MAX_FPS_CAP: f32 = 1000.0;

pub fn parse_fps(value: &str) -> Result<f32, String> {
    let fps: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid frame rate '{}'", value.trim()))?;
    if fps == 0.0 || (MIN_FPS_CAP..=MAX_FPS_CAP).contains(&fps) {
        Ok(fps)
    } else {
        Err(format!(
            "frame rate must be 0 (uncapped) or between {MIN_FPS_CAP} and {MAX_FPS_CAP}"
        ))
    }
}

pub fn parse_surface_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WxH format, e.g. 1920x1080".to_string())?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| "invalid width in size specification".to_string())?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| "invalid height in size specification".to_string())?;
    if width == 0 || height == 0 {
        return Err("surface dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

pub fn parse_antialias(value: &str) -> Result<Antialiasing, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("anti-alias mode must not be empty".to_string());
    }

    match trimmed.parse::<Antialiasing>()? {
        Antialiasing::Samples(samples) if !matches!(samples, 2 | 4 | 8 | 16) => Err(format!(
            "unsupported sample count {samples}; supported values are 2, 4, 8, or 16"
        )),
        mode => Ok(mode),
    }
}

pub fn parse_color_space(value: &str) -> Result<ColorSpaceMode, String> {
    if value.trim().is_empty() {
        return Err("color space must not be empty".to_string());
    }
    value.parse()
}

pub fn parse_crossfade_curve(value: &str) -> Result<CrossfadeCurve, String> {
    if value.trim().is_empty() {
        return Err("crossfade curve must not be empty".to_string());
    }
    value.parse()
}
