//! Materialization of a solid mesh behind a moving horizontal threshold.
//!
//! Every surface point is classified by its height relative to a threshold
//! plane that sweeps upward with progress:
//!
//! ```text
//!   y ▲   Ghost          d ≥ edge width   faint dither / grid, or discarded
//!     │ ─ ─ Edge ─ ─ ─   0 ≤ d < edge     flashing neon seam
//!     │   Materialized   d < 0            dark metal + fresnel rim
//!     └────────────────▶
//! ```
//!
//! where `d = y - limit` and `limit = lerp(-1.5, 1.5, smoothed progress)`.
//!
//! The raw progress is not used directly: a critically damped
//! [`ProgressSmoother`] chases it so the seam glides instead of jumping.

use crate::camera::Camera;
use crate::mesh::SurfaceMesh;
use crate::progress::{lerp, ProgressSignal};
use crate::random::{fold_seed, frame_seed, hash3, keyed, rand};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Salt separating the dither draw from other keyed attributes of a point.
const DITHER_SALT: u32 = 0xD17E;

/// Height of the threshold plane at progress 0.
pub const LOW_BOUND: f32 = -1.5;

/// Height of the threshold plane at progress 1.
pub const HIGH_BOUND: f32 = 1.5;

/// Thickness of the edge band.
pub const EDGE_WIDTH: f32 = 0.1;

/// Threshold height for a normalized progress value, with the default bounds.
#[inline]
pub fn dissolve_limit(progress: f32) -> f32 {
    lerp(LOW_BOUND, HIGH_BOUND, sanitize_unit(progress))
}

/// Zone of a point at signed distance `distance` above the threshold, with
/// the default edge width.
#[inline]
pub fn classify(distance: f32) -> Zone {
    Zone::classify(distance, EDGE_WIDTH)
}

fn sanitize_unit(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Material state of a surface point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// Below the threshold; fully built.
    Materialized,
    /// Within the edge band just above the threshold.
    Edge,
    /// Above the band; not yet built.
    Ghost,
}

impl Zone {
    /// Classify a signed distance to the threshold.
    ///
    /// The three ranges are disjoint and cover every f32, NaN included
    /// (NaN lands in [`Zone::Ghost`]).
    #[inline]
    pub fn classify(distance: f32, edge_width: f32) -> Zone {
        if distance < 0.0 {
            Zone::Materialized
        } else if distance < edge_width {
            Zone::Edge
        } else {
            Zone::Ghost
        }
    }
}

/// Tuning for the dissolve effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DissolveParams {
    /// Threshold height at progress 0.
    pub low_bound: f32,
    /// Threshold height at progress 1.
    pub high_bound: f32,
    /// Thickness of the edge band.
    pub edge_width: f32,
    /// Approximate time for the smoothed progress to reach a new target.
    pub smooth_time: f32,
    /// Sphere radius.
    pub radius: f32,
    /// Sphere subdivision level.
    pub detail: u32,
    /// Spin about Y (rad/s).
    pub spin: f32,
    /// Fraction of points glitched per frame.
    pub glitch_chance: f32,
    /// Horizontal reach of a vertex glitch.
    pub glitch_amplitude: f32,
    /// Dither draws above this keep a ghost point visible.
    pub ghost_dither: f32,
    /// Grid lines per world unit on the ghost.
    pub grid_density: f32,
    /// Ghost opacity.
    pub ghost_alpha: f32,
    /// Edge band brightness multiplier.
    pub edge_gain: f32,
    /// Fresnel rim brightness multiplier.
    pub fresnel_gain: f32,
    /// Dark metal base of the materialized zone.
    pub base_color: Vec3,
    /// Smoothed progress above which the mesh pulses.
    pub pulse_threshold: f32,
}

impl Default for DissolveParams {
    fn default() -> Self {
        Self {
            low_bound: LOW_BOUND,
            high_bound: HIGH_BOUND,
            edge_width: EDGE_WIDTH,
            smooth_time: 0.25,
            radius: 1.5,
            detail: 4,
            spin: 0.2,
            glitch_chance: 0.05,
            glitch_amplitude: 0.01,
            ghost_dither: 0.8,
            grid_density: 5.0,
            ghost_alpha: 0.3,
            edge_gain: 5.0,
            fresnel_gain: 2.0,
            base_color: Vec3::new(0.1, 0.1, 0.2),
            pulse_threshold: 0.95,
        }
    }
}

impl DissolveParams {
    /// Threshold height for a normalized progress value.
    #[inline]
    pub fn limit(&self, progress: f32) -> f32 {
        lerp(self.low_bound, self.high_bound, sanitize_unit(progress))
    }
}

// =========================================================================
// SMOOTHING
// =========================================================================

/// Critically damped follower for the progress value.
///
/// Time steps are derived from the clock values passed to
/// [`ProgressSmoother::update`], so calling it twice with the same time
/// returns the same value. The output never overshoots the target and stays
/// in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSmoother {
    smooth_time: f32,
    value: f32,
    velocity: f32,
    last_time: Option<f32>,
}

impl ProgressSmoother {
    /// Smallest accepted smoothing time.
    pub const MIN_SMOOTH_TIME: f32 = 1.0e-4;

    pub fn new(smooth_time: f32) -> Self {
        Self {
            smooth_time: if smooth_time.is_finite() {
                smooth_time.max(Self::MIN_SMOOTH_TIME)
            } else {
                Self::MIN_SMOOTH_TIME
            },
            value: 0.0,
            velocity: 0.0,
            last_time: None,
        }
    }

    /// Current smoothed value.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Current rate of change (units/s).
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Jump straight to a value, dropping any motion.
    pub fn snap(&mut self, value: f32) {
        self.value = sanitize_unit(value);
        self.velocity = 0.0;
    }

    /// Back to zero with a fresh clock.
    pub fn reset(&mut self) {
        *self = Self::new(self.smooth_time);
    }

    /// Chase `target` up to `time` and return the smoothed value.
    pub fn update(&mut self, time: f32, target: f32) -> f32 {
        let target = sanitize_unit(target);
        if !time.is_finite() {
            return self.value;
        }
        let dt = match self.last_time {
            Some(last) if time > last => time - last,
            _ => 0.0,
        };
        self.last_time = Some(self.last_time.map_or(time, |last| last.max(time)));
        if dt <= 0.0 {
            return self.value;
        }

        // Closed-form critically damped step with a cubic approximation of exp
        let omega = 2.0 / self.smooth_time;
        let x = omega * dt;
        let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);
        let change = self.value - target;
        let temp = (self.velocity + omega * change) * dt;
        let mut velocity = (self.velocity - omega * temp) * decay;
        let mut output = target + (change + temp) * decay;

        if (target > self.value) == (output > target) {
            output = target;
            velocity = 0.0;
        }

        self.value = output.clamp(0.0, 1.0);
        self.velocity = velocity;
        self.value
    }
}

// =========================================================================
// ENGINE
// =========================================================================

/// One shaded surface point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadedPoint {
    /// World position after spin, pulse and glitch.
    pub position: Vec3,
    /// Zone the point fell into.
    pub zone: Zone,
    /// Output colour (HDR; edge band exceeds 1).
    pub color: Vec3,
    /// Output opacity.
    pub alpha: f32,
    /// False when the ghost dither discarded the point.
    pub visible: bool,
}

/// Points per zone in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZoneCounts {
    pub materialized: usize,
    pub edge: usize,
    pub ghost: usize,
    /// Ghost points that were discarded rather than drawn.
    pub discarded: usize,
}

impl ZoneCounts {
    /// Total points classified.
    pub fn total(&self) -> usize {
        self.materialized + self.edge + self.ghost
    }

    fn record(&mut self, zone: Zone, visible: bool) {
        match zone {
            Zone::Materialized => self.materialized += 1,
            Zone::Edge => self.edge += 1,
            Zone::Ghost => {
                self.ghost += 1;
                if !visible {
                    self.discarded += 1;
                }
            }
        }
    }
}

/// Per-frame summary of the dissolve.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DissolveFrame {
    /// Progress after smoothing.
    pub smoothed_progress: f32,
    /// Threshold height in use.
    pub limit: f32,
    /// Edge band thickness in use.
    pub edge_width: f32,
    /// Mesh spin.
    pub rotation: Quat,
    /// Uniform mesh scale.
    pub scale: f32,
    /// Edge flash level in `[0, 1]`.
    pub flash: f32,
    /// Zone tallies.
    pub counts: ZoneCounts,
}

/// Classifies and shades every vertex of an icosphere each frame.
#[derive(Debug, Clone)]
pub struct DissolveTransitionEngine {
    mesh: SurfaceMesh,
    params: DissolveParams,
    smoother: ProgressSmoother,
    color: Vec3,
    seed: u64,
    y_extent: (f32, f32),
}

impl DissolveTransitionEngine {
    /// Build the icosphere and a smoother at rest.
    pub fn new(params: DissolveParams, color: Vec3, seed: u64) -> Self {
        let mesh = SurfaceMesh::icosphere(params.radius, params.detail);
        let y_extent = mesh.y_extent();
        Self {
            mesh,
            params,
            smoother: ProgressSmoother::new(params.smooth_time),
            color,
            seed,
            y_extent,
        }
    }

    /// Underlying mesh in object space.
    pub fn mesh(&self) -> &SurfaceMesh {
        &self.mesh
    }

    pub fn params(&self) -> &DissolveParams {
        &self.params
    }

    /// Smoothed progress as of the last step.
    pub fn smoothed_progress(&self) -> f32 {
        self.smoother.value()
    }

    /// Rewind the smoother to zero.
    pub fn reset(&mut self) {
        self.smoother.reset();
    }

    /// Smooth the progress, then classify and shade every vertex into `out`.
    ///
    /// Once `terminal` is set the threshold drops below the mesh and the edge
    /// band stretches over its full height, so every point flashes as edge.
    pub fn step_into(
        &mut self,
        time: f32,
        progress: ProgressSignal,
        terminal: bool,
        camera: &Camera,
        out: &mut Vec<ShadedPoint>,
    ) -> DissolveFrame {
        let smoothed = self.smoother.update(time, progress.value());
        let params = &self.params;

        let (limit, edge_width) = if terminal {
            let (lo, hi) = self.y_extent;
            let margin = params.edge_width * 0.5;
            (lo - margin, (hi - lo) + params.edge_width)
        } else {
            (params.limit(smoothed), params.edge_width)
        };

        let rotation = Quat::from_rotation_y(time * params.spin);
        let scale = if smoothed > params.pulse_threshold {
            1.0 + (time * 10.0).sin() * 0.02
        } else {
            1.0
        };
        let flash = (time * 20.0).sin() * 0.5 + 0.5;
        let glitch = (time * 20.0).sin() * params.glitch_amplitude;
        let frame_key = frame_seed(time);
        let seed = fold_seed(self.seed);

        let mut counts = ZoneCounts::default();
        out.clear();
        out.reserve(self.mesh.positions.len());

        for (index, (&local, &normal)) in self.mesh.positions.iter().zip(&self.mesh.normals).enumerate() {
            let id = index as u32;
            let zone = Zone::classify(local.y - limit, edge_width);

            let mut displaced = local;
            if rand(hash3(seed, id, frame_key)) >= 1.0 - params.glitch_chance {
                displaced.x += glitch;
            }
            let position = rotation * (displaced * scale);

            let (color, alpha, visible) = match zone {
                Zone::Materialized => {
                    let view_dir = (camera.position - position).normalize_or_zero();
                    let facing = view_dir.dot(rotation * normal);
                    let fresnel = (1.0 - facing).clamp(0.0, 1.0).powi(3);
                    (params.base_color + self.color * fresnel * params.fresnel_gain, 1.0, true)
                }
                Zone::Edge => (self.color * params.edge_gain * flash, 1.0, true),
                Zone::Ghost => {
                    let dither = keyed(self.seed, id, DITHER_SALT);
                    let grid = grid_step(local.x * params.grid_density) + grid_step(local.z * params.grid_density);
                    let visible = dither > params.ghost_dither || grid > 0.5;
                    (self.color * 0.5, params.ghost_alpha, visible)
                }
            };

            counts.record(zone, visible);
            out.push(ShadedPoint {
                position,
                zone,
                color,
                alpha,
                visible,
            });
        }

        DissolveFrame {
            smoothed_progress: smoothed,
            limit,
            edge_width,
            rotation,
            scale,
            flash,
            counts,
        }
    }
}

/// 1 on the last tenth of each unit cell, else 0.
#[inline]
fn grid_step(coord: f32) -> f32 {
    if coord.rem_euclid(1.0) >= 0.9 {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_linear_endpoints() {
        assert_eq!(dissolve_limit(0.0), -1.5);
        assert_eq!(dissolve_limit(1.0), 1.5);
        assert!((dissolve_limit(0.5)).abs() < 1e-6);
        assert!((dissolve_limit(0.25) - -0.75).abs() < 1e-6);
        assert_eq!(dissolve_limit(-3.0), -1.5);
        assert_eq!(dissolve_limit(f32::NAN), -1.5);
    }

    #[test]
    fn test_classify_partitions() {
        let samples = [
            f32::NEG_INFINITY,
            -1.0,
            -1e-7,
            0.0,
            0.05,
            0.099_999,
            0.1,
            3.0,
            f32::INFINITY,
            f32::NAN,
        ];
        let zones: Vec<Zone> = samples.iter().map(|&d| classify(d)).collect();
        assert_eq!(
            zones,
            vec![
                Zone::Materialized,
                Zone::Materialized,
                Zone::Materialized,
                Zone::Edge,
                Zone::Edge,
                Zone::Edge,
                Zone::Ghost,
                Zone::Ghost,
                Zone::Ghost,
                Zone::Ghost,
            ]
        );
    }

    #[test]
    fn test_smoother_converges_without_overshoot() {
        let mut smoother = ProgressSmoother::new(0.25);
        smoother.update(0.0, 0.0);
        let mut last = 0.0;
        for i in 1..=180 {
            let v = smoother.update(i as f32 / 60.0, 0.8);
            assert!(v >= last - 1e-6, "regressed at frame {i}");
            assert!(v <= 0.8 + 1e-6, "overshoot at frame {i}");
            last = v;
        }
        assert!((last - 0.8).abs() < 1e-3);
    }

    #[test]
    fn test_smoother_does_not_jump() {
        let mut smoother = ProgressSmoother::new(0.25);
        smoother.update(0.0, 0.0);
        let first = smoother.update(1.0 / 60.0, 1.0);
        assert!(first < 0.1, "first step {first}");
    }

    #[test]
    fn test_smoother_idempotent_per_time() {
        let mut smoother = ProgressSmoother::new(0.25);
        smoother.update(0.0, 0.0);
        let a = smoother.update(0.5, 1.0);
        let b = smoother.update(0.5, 1.0);
        let c = smoother.update(0.2, 1.0);
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_engine_zones_follow_threshold() {
        let mut engine = DissolveTransitionEngine::new(DissolveParams::default(), Vec3::new(0.0, 1.0, 1.0), 1);
        let camera = Camera::new();
        let mut points = Vec::new();

        let frame = engine.step_into(0.0, ProgressSignal::ZERO, false, &camera, &mut points);
        assert_eq!(frame.counts.total(), engine.mesh().vertex_count());
        assert_eq!(points.len(), engine.mesh().vertex_count());
        assert_eq!(frame.limit, -1.5);
        // Nothing sits below the bottom pole
        assert_eq!(frame.counts.materialized, 0);
        assert!(frame.counts.ghost > frame.counts.edge);

        engine.smoother.snap(0.5);
        let frame = engine.step_into(0.0, ProgressSignal::from_percent(50.0), false, &camera, &mut points);
        assert!(frame.limit.abs() < 1e-6);
        assert!(frame.counts.materialized > 0 && frame.counts.ghost > 0);
        for (point, local) in points.iter().zip(&engine.mesh().positions) {
            assert_eq!(point.zone, classify(local.y - frame.limit));
        }
    }

    #[test]
    fn test_ghost_points_drawn_or_discarded() {
        let mut engine = DissolveTransitionEngine::new(DissolveParams::default(), Vec3::ONE, 5);
        let mut points = Vec::new();
        let frame = engine.step_into(0.0, ProgressSignal::ZERO, false, &Camera::new(), &mut points);
        assert!(frame.counts.discarded > 0);
        assert!(frame.counts.discarded < frame.counts.ghost);
        for p in points.iter().filter(|p| p.zone == Zone::Ghost && p.visible) {
            assert!((p.alpha - 0.3).abs() < 1e-6);
            assert_eq!(p.color, Vec3::splat(0.5));
        }
    }

    #[test]
    fn test_materialized_rim_brighter_than_base() {
        let mut engine = DissolveTransitionEngine::new(DissolveParams::default(), Vec3::new(0.0, 1.0, 1.0), 5);
        engine.smoother.snap(1.0);
        let mut points = Vec::new();
        engine.step_into(0.0, ProgressSignal::FULL, false, &Camera::new(), &mut points);
        for p in points.iter().filter(|p| p.zone == Zone::Materialized) {
            assert!(p.color.x >= 0.1 - 1e-6);
            assert!(p.color.z >= 0.2 - 1e-6);
            assert_eq!(p.alpha, 1.0);
        }
    }

    #[test]
    fn test_terminal_edge_dominates() {
        let mut engine = DissolveTransitionEngine::new(DissolveParams::default(), Vec3::ONE, 1);
        let mut points = Vec::new();
        let frame = engine.step_into(1.0, ProgressSignal::FULL, true, &Camera::new(), &mut points);
        assert_eq!(frame.counts.edge, engine.mesh().vertex_count());
        assert!(points.iter().all(|p| p.zone == Zone::Edge && p.visible));
    }

    #[test]
    fn test_glitch_touches_few_points() {
        let mut engine = DissolveTransitionEngine::new(DissolveParams::default(), Vec3::ONE, 3);
        let mut points = Vec::new();
        let t = 0.3;
        let frame = engine.step_into(t, ProgressSignal::ZERO, false, &Camera::new(), &mut points);
        let glitched = points
            .iter()
            .zip(&engine.mesh().positions)
            .filter(|(p, local)| (frame.rotation.inverse() * p.position - **local).length() > 1e-5)
            .count();
        assert!(glitched < points.len() / 5, "glitched {glitched}");
    }
}
