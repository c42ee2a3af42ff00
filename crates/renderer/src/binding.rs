//! Pushes a [`CrtSettings`] bundle into a shader program by uniform name.

use crtconfig::CrtSettings;

/// Anything that accepts named scalar uniforms.
///
/// Implementations must recognise every [`crtconfig::SettingField`] uniform
/// name; an unknown name is a programming error, not a runtime condition.
pub trait UniformSink {
    fn set_float_uniform(&mut self, name: &str, value: f32);
}

/// Writes all fourteen CRT knobs, one call per field in panel order.
pub fn update_crt_uniforms<S>(sink: &mut S, settings: &CrtSettings)
where
    S: UniformSink + ?Sized,
{
    for (field, value) in settings.values() {
        sink.set_float_uniform(field.uniform_name(), value);
    }
}
