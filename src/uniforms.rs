//! Per-frame shader uniforms.
//!
//! [`ShaderUniformSet`] is the small set of values every effect's shading
//! reads: clock time, smoothed progress, base colour and pixel density. It is
//! rebuilt from scratch each frame. [`GpuUniforms`] is the same data plus
//! the camera and overlay, laid out for a WGSL uniform buffer.
//!
//! ```ignore
//! let set = ShaderUniformSet::new(state.time, state.progress.value(), config.color, viewport.pixel_density);
//! let gpu = set.to_gpu(view_proj, renderer.size(), overlay);
//! queue.write_buffer(&uniform_buffer, 0, bytemuck::bytes_of(&gpu));
//! ```

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};

/// Supported uniform value types.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    F32(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
}

impl UniformValue {
    /// WGSL type name for this value.
    pub fn wgsl_type(&self) -> &'static str {
        match self {
            UniformValue::F32(_) => "f32",
            UniformValue::Vec2(_) => "vec2<f32>",
            UniformValue::Vec3(_) => "vec3<f32>",
            UniformValue::Vec4(_) => "vec4<f32>",
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::F32(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

/// Values shared by every effect's shading for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShaderUniformSet {
    /// Clock time in seconds.
    pub time: f32,
    /// Progress in `[0, 1]`.
    pub progress: f32,
    /// Base effect colour.
    pub color: Vec3,
    /// Device pixel ratio, already capped.
    pub pixel_density: f32,
}

impl ShaderUniformSet {
    pub fn new(time: f32, progress: f32, color: Vec3, pixel_density: f32) -> Self {
        Self {
            time,
            progress,
            color,
            pixel_density,
        }
    }

    /// Named values in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, UniformValue)> {
        [
            ("time", self.time.into()),
            ("progress", self.progress.into()),
            ("color", self.color.into()),
            ("pixel_density", self.pixel_density.into()),
        ]
        .into_iter()
    }

    /// Pack for upload together with the camera, the surface size in
    /// physical pixels and the overlay tint.
    pub fn to_gpu(&self, view_proj: Mat4, surface: (u32, u32), overlay: Vec4) -> GpuUniforms {
        let (width, height) = surface;
        GpuUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            color: self.color.to_array(),
            time: self.time,
            viewport: [width as f32, height as f32],
            progress: self.progress,
            pixel_density: self.pixel_density,
            overlay: overlay.to_array(),
        }
    }
}

/// Uniform buffer contents, matching `Uniforms` in the WGSL sources.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GpuUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub color: [f32; 3],
    pub time: f32,
    /// Surface size in physical pixels.
    pub viewport: [f32; 2],
    pub progress: f32,
    pub pixel_density: f32,
    /// Full-screen tint (rgb, alpha) for flashes and the whiteout.
    pub overlay: [f32; 4],
}

impl GpuUniforms {
    /// WGSL declaration of the same layout.
    pub const WGSL: &'static str = r#"struct Uniforms {
    view_proj: mat4x4<f32>,
    color: vec3<f32>,
    time: f32,
    viewport: vec2<f32>,
    progress: f32,
    pixel_density: f32,
    overlay: vec4<f32>,
};
"#;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_uniforms_size() {
        assert_eq!(std::mem::size_of::<GpuUniforms>(), 112);
        assert_eq!(std::mem::size_of::<GpuUniforms>() % 16, 0);
    }

    #[test]
    fn test_uniform_order_and_types() {
        let set = ShaderUniformSet::new(1.0, 0.5, Vec3::ONE, 2.0);
        let names: Vec<_> = set.iter().map(|(n, v)| (n, v.wgsl_type())).collect();
        assert_eq!(
            names,
            vec![
                ("time", "f32"),
                ("progress", "f32"),
                ("color", "vec3<f32>"),
                ("pixel_density", "f32"),
            ]
        );
    }

    #[test]
    fn test_to_gpu_packs_fields() {
        let set = ShaderUniformSet::new(3.0, 0.25, Vec3::new(0.0, 1.0, 1.0), 1.5);
        let gpu = set.to_gpu(Mat4::IDENTITY, (1200, 900), Vec4::new(1.0, 1.0, 1.0, 0.3));
        assert_eq!(gpu.time, 3.0);
        assert_eq!(gpu.progress, 0.25);
        assert_eq!(gpu.viewport, [1200.0, 900.0]);
        assert_eq!(gpu.color, [0.0, 1.0, 1.0]);
        assert_eq!(gpu.overlay[3], 0.3);
        assert_eq!(gpu.view_proj, Mat4::IDENTITY.to_cols_array_2d());
    }
}
