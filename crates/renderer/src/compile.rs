use std::borrow::Cow;
use std::fmt::Write as _;

use crtconfig::SettingField;
use wgpu::naga::ShaderStage;

/// Default CRT effect compiled when no `--shader` override is given.
pub const BUNDLED_CRT_SHADER: &str = include_str!("../shaders/crt_lens.frag");

/// Compiles the static full-screen triangle vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fullscreen triangle vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Wraps a CRT fragment shader with the uniform prelude and compiles it as GLSL.
pub(crate) fn compile_fragment_shader(device: &wgpu::Device, source: &str) -> wgpu::ShaderModule {
    let wrapped = wrap_crt_fragment(source);
    tracing::trace!(bytes = wrapped.len(), "compiling wrapped CRT shader");

    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("crt fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(wrapped),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

/// Names the renderer binds itself; user declarations of these are dropped.
fn is_injected_uniform(name: &str) -> bool {
    matches!(name, "size" | "time")
        || SettingField::ALL
            .iter()
            .any(|field| field.uniform_name() == name)
}

/// Returns the declared identifier of a plain `uniform <type> <name>;` line.
fn plain_uniform_name(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("uniform ")?;
    let declaration = rest.trim_end().strip_suffix(';')?;
    let mut parts = declaration.split_whitespace();
    let _ty = parts.next()?;
    let name = parts.next()?;
    parts.next().is_none().then_some(name)
}

/// Produces a self-contained GLSL fragment shader from a `crtMain` body.
///
/// `#version` directives and plain declarations of injected uniforms are
/// stripped, then the source is sandwiched between the generated header and
/// [`FOOTER`].
pub(crate) fn wrap_crt_fragment(source: &str) -> String {
    let mut sanitized = String::with_capacity(source.len());
    let mut skipped_version = false;
    for line in source.lines() {
        if !skipped_version && line.trim_start().starts_with("#version") {
            skipped_version = true;
            continue;
        }
        if plain_uniform_name(line).is_some_and(is_injected_uniform) {
            continue;
        }
        sanitized.push_str(line);
        sanitized.push('\n');
    }

    format!("{header}\n#line 1\n{sanitized}{FOOTER}", header = shader_header())
}

/// GLSL prologue declaring the uniform block and content sampler.
///
/// Member order must match `CrtUniforms` in `gpu/uniforms.rs`: `size`, `time`,
/// then every field in panel order, padded to a 16-byte multiple.
pub(crate) fn shader_header() -> String {
    let mut header = String::from(
        "#version 450\n\
         layout(location = 0) in vec2 v_uv;\n\
         layout(location = 0) out vec4 outColor;\n\n\
         layout(std140, set = 0, binding = 0) uniform CrtParams {\n    \
         vec2 _size;\n    \
         float _time;\n",
    );
    for field in SettingField::ALL {
        let _ = writeln!(header, "    float _{};", field.uniform_name());
    }
    header.push_str("    float _padding0;\n    float _padding1;\n    float _padding2;\n} ubo;\n\n");

    header.push_str("#define size ubo._size\n#define time ubo._time\n");
    for field in SettingField::ALL {
        let name = field.uniform_name();
        let _ = writeln!(header, "#define {name} ubo._{name}");
    }

    header.push_str(CONTENT_PRELUDE);
    header
}

const CONTENT_PRELUDE: &str = r"
layout(set = 1, binding = 0) uniform texture2D cathode_content_texture;
layout(set = 1, binding = 1) uniform sampler cathode_content_sampler;

vec4 sampleContent(vec2 uv) {
    return texture(sampler2D(cathode_content_texture, cathode_content_sampler), uv);
}
";

/// GLSL epilogue that flips to a bottom-left origin and delegates to `crtMain`.
const FOOTER: &str = r"
void main() {
    vec2 fragCoord = vec2(gl_FragCoord.x, size.y - gl_FragCoord.y);
    outColor = crtMain(fragCoord);
}
";

/// Minimal full-screen triangle vertex shader.
const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_strips_injected_uniform_declarations() {
        let source = r#"
            #version 300 es
            uniform float time;
            uniform vec2 size;
            uniform float screenZoom;
            uniform float myCustomKnob;
            vec4 crtMain(vec2 fragCoord) {
                return vec4(fragCoord / size, screenZoom, 1.0);
            }
        "#;

        let wrapped = wrap_crt_fragment(source);
        assert!(!wrapped.contains("uniform float time;"));
        assert!(!wrapped.contains("uniform vec2 size;"));
        assert!(!wrapped.contains("uniform float screenZoom;"));
        assert!(!wrapped.contains("#version 300 es"));
        assert!(wrapped.contains("uniform float myCustomKnob;"));
        assert!(wrapped.contains("crtMain(fragCoord)"));
    }

    #[test]
    fn header_declares_every_uniform() {
        let header = shader_header();
        for field in SettingField::ALL {
            let name = field.uniform_name();
            assert!(header.contains(&format!("float _{name};")), "{name}");
            assert!(header.contains(&format!("#define {name} ubo._{name}")), "{name}");
        }
        assert!(header.contains("#define size ubo._size"));
        assert!(header.contains("#define time ubo._time"));
        assert!(header.contains("vec4 sampleContent(vec2 uv)"));
    }

    #[test]
    fn parses_plain_uniform_lines_only() {
        assert_eq!(plain_uniform_name("uniform float gridOpacity;"), Some("gridOpacity"));
        assert_eq!(plain_uniform_name("  uniform vec2 size ;"), Some("size"));
        assert_eq!(plain_uniform_name("uniform shader composable;"), Some("composable"));
        assert_eq!(plain_uniform_name("uniform float a, b;"), None);
        assert_eq!(plain_uniform_name("float gridOpacity;"), None);
    }

    #[test]
    fn bundled_shader_uses_every_setting() {
        for field in SettingField::ALL {
            assert!(
                BUNDLED_CRT_SHADER.contains(field.uniform_name()),
                "bundled shader never reads {field}"
            );
        }
        assert!(BUNDLED_CRT_SHADER.contains("vec4 crtMain(vec2 fragCoord)"));
    }

    #[test]
    fn bundled_shader_parses_with_naga() {
        let wrapped = wrap_crt_fragment(BUNDLED_CRT_SHADER);
        let mut frontend = wgpu::naga::front::glsl::Frontend::default();
        let options = wgpu::naga::front::glsl::Options::from(ShaderStage::Fragment);
        frontend
            .parse(&options, &wrapped)
            .expect("bundled CRT shader should parse");
    }
}
