use bytemuck::{Pod, Zeroable};
use crtconfig::CrtSettings;
use winit::dpi::PhysicalSize;

use crate::binding::{update_crt_uniforms, UniformSink};
use crate::runtime::TimeSample;

/// CPU mirror of the `CrtParams` std140 block declared by the shader header.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct CrtUniforms {
    pub size: [f32; 2],
    pub time: f32,
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
    _padding: [f32; 3],
}

impl CrtUniforms {
    pub fn new(size: PhysicalSize<u32>, settings: &CrtSettings) -> Self {
        let mut uniforms = Self::zeroed();
        uniforms.set_size(size);
        update_crt_uniforms(&mut uniforms, settings);
        uniforms
    }

    pub fn set_size(&mut self, size: PhysicalSize<u32>) {
        self.size = [size.width.max(1) as f32, size.height.max(1) as f32];
    }

    pub fn set_time(&mut self, sample: TimeSample) {
        self.time = sample.value;
    }
}

impl UniformSink for CrtUniforms {
    /// Panics on a name the uniform block does not declare.
    fn set_float_uniform(&mut self, name: &str, value: f32) {
        let slot = match name {
            "time" => &mut self.time,
            "fishEyeStrength" => &mut self.fish_eye_strength,
            "screenZoom" => &mut self.screen_zoom,
            "vignetteIntensity" => &mut self.vignette_intensity,
            "gridOpacity" => &mut self.grid_opacity,
            "gridSpacing" => &mut self.grid_spacing,
            "scanlineDensity" => &mut self.scanline_density,
            "scanlineOpacity" => &mut self.scanline_opacity,
            "textAnaglyph" => &mut self.text_anaglyph,
            "gridAnaglyph" => &mut self.grid_anaglyph,
            "signalShift" => &mut self.signal_shift,
            "jitterChance" => &mut self.jitter_chance,
            "jitterIntensity" => &mut self.jitter_intensity,
            "globalJitterChance" => &mut self.global_jitter_chance,
            "globalJitterStrength" => &mut self.global_jitter_strength,
            other => panic!("CRT uniform block has no float named '{other}'"),
        };
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crtconfig::SettingField;

    #[test]
    fn matches_std140_block_size() {
        // vec2 + float + 14 floats, rounded up to a 16 byte multiple.
        assert_eq!(std::mem::size_of::<CrtUniforms>(), 80);
        assert_eq!(std::mem::size_of::<CrtUniforms>() % 16, 0);
    }

    #[test]
    fn fields_follow_header_order() {
        let uniforms = CrtUniforms::new(PhysicalSize::new(640, 480), &CrtSettings::default());
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&uniforms));
        assert_eq!(&floats[..2], &[640.0, 480.0]);
        for (index, field) in SettingField::ALL.into_iter().enumerate() {
            assert_eq!(floats[3 + index], field.default_value(), "{field}");
        }
    }

    #[test]
    fn accepts_every_setting_name() {
        let mut uniforms = CrtUniforms::zeroed();
        let settings = CrtSettings::default().with(SettingField::JitterIntensity, 199.0);
        update_crt_uniforms(&mut uniforms, &settings);
        assert_eq!(uniforms.jitter_intensity, 199.0);
        assert_eq!(uniforms.global_jitter_strength, 25.0);
    }

    #[test]
    #[should_panic(expected = "no float named 'brightness'")]
    fn unknown_name_is_fatal() {
        let mut uniforms = CrtUniforms::zeroed();
        uniforms.set_float_uniform("brightness", 1.0);
    }
}
