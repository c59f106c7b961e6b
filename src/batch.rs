//! Draw-list assembly.
//!
//! Flattens a [`RenderState`] into two vertex streams the renderer uploads
//! as-is: one [`SpriteInstance`] per visible point (particles, tunnel,
//! vortex, drift, dissolve points, label markers) and two [`LineVertex`]es per
//! wireframe segment. Both are additive, so draw order inside a stream does
//! not matter.

use crate::config::PortalConfig;
use crate::constellation::{CoreStyle, INNER_SHELL_SCALE};
use crate::portal::RenderState;
use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

/// Label marker diameter in logical pixels.
pub const LABEL_MARKER_SIZE: f32 = 6.0;

/// Opacity of the inner constellation shell.
const INNER_SHELL_OPACITY: f32 = 0.05;

/// One billboarded point.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SpriteInstance {
    pub position: [f32; 3],
    /// Diameter in physical pixels.
    pub size: f32,
    /// Linear RGB plus alpha.
    pub color: [f32; 4],
}

impl SpriteInstance {
    pub fn new(position: Vec3, size: f32, color: Vec3, alpha: f32) -> Self {
        Self {
            position: position.to_array(),
            size,
            color: color.extend(alpha).to_array(),
        }
    }
}

/// One end of a line segment.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub _pad: f32,
    pub color: [f32; 4],
}

impl LineVertex {
    pub fn new(position: Vec3, color: Vec4) -> Self {
        Self {
            position: position.to_array(),
            _pad: 0.0,
            color: color.to_array(),
        }
    }
}

/// Reusable sprite and line lists for one frame.
#[derive(Debug, Clone, Default)]
pub struct DrawBatch {
    pub sprites: Vec<SpriteInstance>,
    pub lines: Vec<LineVertex>,
}

impl DrawBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild both lists from a frame, reusing their allocations.
    pub fn fill(&mut self, state: &RenderState, config: &PortalConfig) {
        self.sprites.clear();
        self.lines.clear();
        let color = config.color;

        for population in [&state.particles, &state.tunnel, &state.vortex] {
            self.sprites
                .extend(population.iter().map(|s| SpriteInstance::new(s.position, s.size, color, s.alpha)));
        }
        self.sprites.extend(
            state
                .drift
                .iter()
                .zip(&state.drift_colors)
                .map(|(s, &c)| SpriteInstance::new(s.position, s.size, c, s.alpha)),
        );

        if let Some(frame) = &state.dissolve {
            let camera = &config.camera;
            let density = state.viewport.pixel_density;
            // Points are splatted at roughly the mesh's edge spacing.
            let world_size = config.dissolve.radius * 0.08 / (config.dissolve.detail.max(1) as f32);
            for point in state.dissolve_points.iter().filter(|p| p.visible) {
                let depth = camera.view_depth(point.position);
                let size = world_size * frame.scale * camera.pixels_per_unit(depth, &state.viewport) * density;
                self.sprites
                    .push(SpriteInstance::new(point.position, size.max(1.0), point.color, point.alpha));
            }
        }

        let marker = LABEL_MARKER_SIZE * state.viewport.pixel_density;
        self.sprites
            .extend(state.labels.iter().map(|l| SpriteInstance::new(l.position, marker, color, 0.9)));

        if let Some(core) = &state.core {
            let tint = (config.core_color * core.intensity).extend(core.opacity);
            self.push_segments(state.core_lines.iter().copied(), tint);
            if config.core_style == CoreStyle::Constellation {
                let inner = color.extend(INNER_SHELL_OPACITY);
                self.push_segments(
                    state
                        .core_lines
                        .iter()
                        .map(|&(a, b)| (a * INNER_SHELL_SCALE, b * INNER_SHELL_SCALE)),
                    inner,
                );
            }
        }
    }

    fn push_segments(&mut self, segments: impl Iterator<Item = (Vec3, Vec3)>, color: Vec4) {
        for (a, b) in segments {
            self.lines.push(LineVertex::new(a, color));
            self.lines.push(LineVertex::new(b, color));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty() && self.lines.is_empty()
    }
}
