use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crtconfig::CrtSettings;

use crate::runtime::RenderPolicy;

/// What the CRT shader samples through `sampleContent`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContentSource {
    /// Generated colour bars with a grid, used when no image is given.
    #[default]
    TestPattern,
    /// Raster image loaded once at start-up.
    Image(PathBuf),
}

/// Output color handling for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpaceMode {
    /// Gamma-encoded swapchain, matching how the CRT shader was tuned.
    #[default]
    Auto,
    /// Treat shader outputs/textures as gamma-encoded; use non-sRGB surfaces.
    Gamma,
    /// Treat shader outputs as linear and use sRGB swapchains/textures for conversion.
    Linear,
}

impl FromStr for ColorSpaceMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "gamma" => Ok(Self::Gamma),
            "linear" => Ok(Self::Linear),
            other => Err(format!(
                "unknown color space '{other}'; expected auto, gamma or linear"
            )),
        }
    }
}

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    #[default]
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

impl FromStr for Antialiasing {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "auto" => Ok(Self::Auto),
            "off" | "none" | "0" | "1" => Ok(Self::Off),
            other => other
                .parse::<u32>()
                .map(Self::Samples)
                .map_err(|_| format!("invalid antialiasing '{value}'; expected auto, off or N")),
        }
    }
}

/// Easing applied when blending between two settings bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossfadeCurve {
    Linear,
    #[default]
    Smoothstep,
    EaseInOut,
}

impl FromStr for CrossfadeCurve {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "smoothstep" | "smooth" => Ok(Self::Smoothstep),
            "ease-in-out" | "ease_in_out" | "easeinout" => Ok(Self::EaseInOut),
            other => Err(format!(
                "unknown crossfade curve '{other}'; expected linear, smoothstep or ease-in-out"
            )),
        }
    }
}

impl fmt::Display for CrossfadeCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CrossfadeCurve::Linear => "linear",
            CrossfadeCurve::Smoothstep => "smoothstep",
            CrossfadeCurve::EaseInOut => "ease-in-out",
        })
    }
}

/// Summary of the adapter picked by wgpu, kept for logging and FPS capping.
#[derive(Debug, Clone)]
pub struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
    pub max_texture_dimension: u32,
}

impl AdapterProfile {
    pub(crate) fn from_wgpu(info: &wgpu::AdapterInfo, limits: &wgpu::Limits) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
            max_texture_dimension: limits.max_texture_dimension_2d,
        }
    }

    /// llvmpipe, SwiftShader and friends.
    pub fn is_software(&self) -> bool {
        matches!(self.device_type, wgpu::DeviceType::Cpu)
            || self.name.to_ascii_lowercase().contains("llvmpipe")
    }
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Texture exposed to the shader through `sampleContent`.
    pub content: ContentSource,
    /// Replacement for the bundled `crt_lens.frag`.
    pub shader_source: Option<PathBuf>,
    /// Bundle in effect when the window opens; `R` returns to it.
    pub settings: CrtSettings,
    /// Named bundles cycled with `Tab`, in order.
    pub presets: Vec<(String, CrtSettings)>,
    /// Anti-aliasing mode requested by the caller.
    pub antialiasing: Antialiasing,
    /// Desired color handling for swapchain/textures.
    pub color_space: ColorSpaceMode,
    /// High-level render behaviour requested by the caller.
    pub policy: RenderPolicy,
    /// Blend duration when switching presets; zero switches immediately.
    pub crossfade: Duration,
    pub crossfade_curve: CrossfadeCurve,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            content: ContentSource::default(),
            shader_source: None,
            settings: CrtSettings::default(),
            presets: Vec::new(),
            antialiasing: Antialiasing::default(),
            color_space: ColorSpaceMode::default(),
            policy: RenderPolicy::default(),
            crossfade: Duration::from_millis(600),
            crossfade_curve: CrossfadeCurve::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_antialiasing_flags() {
        assert_eq!("auto".parse::<Antialiasing>().unwrap(), Antialiasing::Auto);
        assert_eq!("off".parse::<Antialiasing>().unwrap(), Antialiasing::Off);
        assert_eq!(
            "4".parse::<Antialiasing>().unwrap(),
            Antialiasing::Samples(4)
        );
        assert!("many".parse::<Antialiasing>().is_err());
    }

    #[test]
    fn parses_curves_and_color_spaces() {
        assert_eq!(
            "ease-in-out".parse::<CrossfadeCurve>().unwrap(),
            CrossfadeCurve::EaseInOut
        );
        assert_eq!(
            "Linear".parse::<ColorSpaceMode>().unwrap(),
            ColorSpaceMode::Linear
        );
        assert!("cubic".parse::<CrossfadeCurve>().is_err());
    }
}
