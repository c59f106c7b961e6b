//! WGSL sources for the render pipelines.
//!
//! All three shaders share the [`GpuUniforms`] block at group 0, binding 0.
//! Sprites are instanced quads sized in physical pixels; lines are a plain
//! line list; the overlay is a single full-screen triangle tinted by
//! `uniforms.overlay`.

use crate::uniforms::GpuUniforms;

const SPRITE_BODY: &str = r#"
@group(0) @binding(0) var<uniform> uniforms: Uniforms;

struct SpriteIn {
    @location(0) position: vec3<f32>,
    @location(1) size: f32,
    @location(2) color: vec4<f32>,
};

struct SpriteOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, sprite: SpriteIn) -> SpriteOut {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, 0.5),
    );
    let corner = corners[vertex_index];

    var out: SpriteOut;
    let clip = uniforms.view_proj * vec4<f32>(sprite.position, 1.0);
    // Pixel size to clip space, scaled by w so it survives the perspective divide.
    let offset = corner * sprite.size * 2.0 / max(uniforms.viewport, vec2<f32>(1.0, 1.0));
    out.clip = clip + vec4<f32>(offset * clip.w, 0.0, 0.0);
    out.uv = corner;
    out.color = sprite.color;
    return out;
}

@fragment
fn fs_main(in: SpriteOut) -> @location(0) vec4<f32> {
    let r = length(in.uv);
    if r > 0.5 {
        discard;
    }
    let glow = pow(1.0 - 2.0 * r, 1.5);
    return vec4<f32>(in.color.rgb, in.color.a * glow);
}
"#;

const LINE_BODY: &str = r#"
@group(0) @binding(0) var<uniform> uniforms: Uniforms;

struct LineIn {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct LineOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(line: LineIn) -> LineOut {
    var out: LineOut;
    out.clip = uniforms.view_proj * vec4<f32>(line.position, 1.0);
    out.color = line.color;
    return out;
}

@fragment
fn fs_main(in: LineOut) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

const OVERLAY_BODY: &str = r#"
@group(0) @binding(0) var<uniform> uniforms: Uniforms;

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> @builtin(position) vec4<f32> {
    let x = f32((vertex_index << 1u) & 2u);
    let y = f32(vertex_index & 2u);
    return vec4<f32>(x * 2.0 - 1.0, y * 2.0 - 1.0, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return uniforms.overlay;
}
"#;

/// Instanced sprite shader (6 vertices per instance).
pub fn sprite_shader() -> String {
    format!("{}{}", GpuUniforms::WGSL, SPRITE_BODY)
}

/// Line-list shader for wireframes.
pub fn line_shader() -> String {
    format!("{}{}", GpuUniforms::WGSL, LINE_BODY)
}

/// Full-screen overlay (3 vertices, no buffers).
pub fn overlay_shader() -> String {
    format!("{}{}", GpuUniforms::WGSL, OVERLAY_BODY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use naga::front::wgsl;
    use naga::valid::{Capabilities, ValidationFlags, Validator};

    fn validate(source: &str) {
        let module = match wgsl::parse_str(source) {
            Ok(m) => m,
            Err(e) => panic!("parse error:\n{}", e.emit_to_string(source)),
        };
        let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
        if let Err(e) = validator.validate(&module) {
            panic!("validation error: {e:?}");
        }
    }

    #[test]
    fn test_sprite_shader_validates() {
        validate(&sprite_shader());
    }

    #[test]
    fn test_line_shader_validates() {
        validate(&line_shader());
    }

    #[test]
    fn test_overlay_shader_validates() {
        validate(&overlay_shader());
    }

    #[test]
    fn test_uniform_block_size_matches() {
        let module = wgsl::parse_str(&line_shader()).unwrap();
        let (_, ty) = module
            .types
            .iter()
            .find(|(_, ty)| ty.name.as_deref() == Some("Uniforms"))
            .unwrap();
        let size = ty.inner.size(module.to_ctx());
        assert_eq!(size as usize, std::mem::size_of::<GpuUniforms>());
    }
}
