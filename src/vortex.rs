//! Background particle populations.
//!
//! | Population | Used by | Motion |
//! |------------|---------|--------|
//! | [`TunnelField`] | portal | one-axis conveyor toward the viewer, wraps at the near plane |
//! | [`SpiralVortex`] | HUD | spirals inward, respawns on the outer rim |
//! | [`DriftField`] | mascot | gentle bob, slow yaw; ignores progress |
//!
//! The tunnel and the vortex are the only stateful simulations in the crate.
//! Their accumulators advance by the clock delta between calls, derived from
//! the absolute time the host passes in: calling [`TunnelField::advance`]
//! twice with the same time moves nothing, so recomputing a frame can never
//! accumulate drift.

use crate::camera::{Camera, Viewport};
use crate::particles::ParticleSample;
use crate::progress::ProgressSignal;
use crate::random::keyed;
use crate::spawn::SpawnContext;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Largest clock step a stateful population integrates in one call.
///
/// A host that stops calling for a while (hidden tab) resumes smoothly
/// instead of teleporting every particle.
pub const MAX_STEP: f32 = 0.1;

/// Clock bookkeeping shared by the stateful populations.
#[derive(Debug, Clone, Copy, Default)]
struct StepClock {
    last: Option<f32>,
}

impl StepClock {
    /// Seconds to integrate for a call at `time`.
    fn delta(&mut self, time: f32) -> f32 {
        if !time.is_finite() {
            return 0.0;
        }
        let dt = match self.last {
            Some(last) if time > last => (time - last).min(MAX_STEP),
            _ => 0.0,
        };
        self.last = Some(time);
        dt
    }
}

// =========================================================================
// TUNNEL
// =========================================================================

/// Tuning for the tunnel conveyor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelParams {
    /// Travel speed along +Z with no progress (units/s).
    pub base_speed: f32,
    /// Extra travel speed at full progress (units/s).
    pub suction_speed: f32,
    /// Particles passing this Z wrap back to `far`.
    pub near: f32,
    /// Z a wrapped particle restarts from.
    pub far: f32,
    /// Roll of the whole tunnel about Z (rad/s).
    pub spin: f32,
    /// Inner ring radius.
    pub ring_min: f32,
    /// Outer ring radius.
    pub ring_max: f32,
    /// Spawn depth spread, centered on Z = 0.
    pub depth_spread: f32,
    /// Sprite diameter in world units.
    pub point_size: f32,
    /// Sprite opacity.
    pub opacity: f32,
}

impl Default for TunnelParams {
    fn default() -> Self {
        Self {
            base_speed: 15.0,
            suction_speed: 40.0,
            near: 20.0,
            far: -80.0,
            spin: 0.2,
            ring_min: 8.0,
            ring_max: 28.0,
            depth_spread: 100.0,
            point_size: 0.12,
            opacity: 0.6,
        }
    }
}

/// Particles flying down a cylinder toward the viewer.
#[derive(Debug, Clone)]
pub struct TunnelField {
    /// Ring coordinates (cos, sin) scaled by radius; fixed per particle.
    rings: Vec<(f32, f32)>,
    /// Z accumulator per particle, always within `[far, near]`.
    depths: Vec<f32>,
    /// Roll accumulator in `[0, 2π)`.
    roll: f32,
    clock: StepClock,
    params: TunnelParams,
}

impl TunnelField {
    /// Seed `count` tunnel particles.
    pub fn new(count: u32, seed: u64, params: TunnelParams) -> Self {
        let half = params.depth_spread * 0.5;
        let (lo, hi) = (params.far.min(params.near), params.near.max(params.far));
        let mut rings = Vec::with_capacity(count as usize);
        let mut depths = Vec::with_capacity(count as usize);
        for i in 0..count {
            let mut ctx = SpawnContext::new(i, count, seed);
            let angle = ctx.random_angle();
            let radius = ctx.random_range(params.ring_min, params.ring_max);
            rings.push((angle.cos() * radius, angle.sin() * radius));
            let depth = ctx.random_range(-half, half);
            depths.push(if lo <= hi { depth.clamp(lo, hi) } else { depth });
        }

        Self {
            rings,
            depths,
            roll: 0.0,
            clock: StepClock::default(),
            params,
        }
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.rings.len()
    }

    /// Whether the tunnel is empty.
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    /// Current Z of every particle.
    pub fn depths(&self) -> &[f32] {
        &self.depths
    }

    /// Current roll of the tunnel.
    pub fn roll(&self) -> f32 {
        self.roll
    }

    /// Conveyor speed at a given progress.
    #[inline]
    pub fn speed(&self, progress: ProgressSignal) -> f32 {
        self.params.base_speed + progress.value() * self.params.suction_speed
    }

    /// Move the conveyor to `time`.
    pub fn advance(&mut self, time: f32, progress: ProgressSignal) {
        let dt = self.clock.delta(time);
        if dt <= 0.0 {
            return;
        }
        let travel = self.speed(progress) * dt;
        let TunnelParams { near, far, .. } = self.params;
        for z in &mut self.depths {
            *z += travel;
            if *z > near {
                *z = far;
            }
        }
        self.roll = (self.roll + self.params.spin * dt).rem_euclid(TAU);
    }

    /// Write one sample per particle into `out`.
    pub fn step_into(&self, camera: &Camera, viewport: &Viewport, out: &mut Vec<ParticleSample>) {
        out.clear();
        let roll = Quat::from_rotation_z(self.roll);
        out.extend(self.rings.iter().zip(&self.depths).map(|(&(x, y), &z)| {
            let position = roll * Vec3::new(x, y, z);
            let depth = camera.view_depth(position);
            ParticleSample {
                position,
                size: self.params.point_size * camera.pixels_per_unit(depth, viewport) * viewport.pixel_density,
                alpha: self.params.opacity,
            }
        }));
    }

    /// Restart the clock, keeping particle positions.
    pub fn reset_clock(&mut self) {
        self.clock = StepClock::default();
    }
}

// =========================================================================
// SPIRAL VORTEX
// =========================================================================

/// Tuning for the HUD spiral vortex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VortexParams {
    /// Angular speed factor (rad/s per unit of particle speed).
    pub angular_rate: f32,
    /// Inward speed (units/s) at suction 1.
    pub inward_rate: f32,
    /// Extra suction multiplier at full progress.
    pub suction_gain: f32,
    /// Radius below which a particle respawns.
    pub min_radius: f32,
    /// Inner respawn radius.
    pub respawn_min: f32,
    /// Outer respawn radius; also the largest radius a particle can hold.
    pub respawn_max: f32,
}

impl Default for VortexParams {
    fn default() -> Self {
        Self {
            angular_rate: 6.0,
            inward_rate: 3.0,
            suction_gain: 2.0,
            min_radius: 0.5,
            respawn_min: 15.0,
            respawn_max: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct VortexParticle {
    angle: f32,
    radius: f32,
    speed: f32,
    height: f32,
    generation: u32,
}

/// Particles spiralling into the core, recycled at the rim.
#[derive(Debug, Clone)]
pub struct SpiralVortex {
    particles: Vec<VortexParticle>,
    clock: StepClock,
    params: VortexParams,
    seed: u64,
}

impl SpiralVortex {
    /// Seed `count` vortex particles.
    pub fn new(count: u32, seed: u64, params: VortexParams) -> Self {
        let min = if params.min_radius.is_finite() { params.min_radius.max(0.0) } else { 0.0 };
        let max = if params.respawn_max.is_finite() { params.respawn_max.max(min) } else { min.max(20.0) };
        let particles = (0..count)
            .map(|i| {
                let mut ctx = SpawnContext::new(i, count, seed);
                VortexParticle {
                    angle: ctx.random_angle(),
                    radius: ctx.random_range(10.0, 20.0).clamp(min, max),
                    speed: ctx.random_range(0.1, 0.3),
                    height: ctx.random_range(-5.0, 5.0),
                    generation: 0,
                }
            })
            .collect();

        Self {
            particles,
            clock: StepClock::default(),
            params,
            seed,
        }
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether the vortex is empty.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Current radius of every particle.
    pub fn radii(&self) -> impl Iterator<Item = f32> + '_ {
        self.particles.iter().map(|p| p.radius)
    }

    /// Suction multiplier at a given progress.
    #[inline]
    pub fn suction(&self, progress: ProgressSignal) -> f32 {
        1.0 + progress.value() * self.params.suction_gain
    }

    /// Spiral every particle forward to `time`.
    pub fn advance(&mut self, time: f32, progress: ProgressSignal) {
        let dt = self.clock.delta(time);
        if dt <= 0.0 {
            return;
        }
        let suction = self.suction(progress);
        let params = self.params;
        for (id, p) in self.particles.iter_mut().enumerate() {
            p.angle = (p.angle + p.speed * params.angular_rate * suction * dt).rem_euclid(TAU);
            p.radius -= params.inward_rate * suction * dt;
            if p.radius < params.min_radius {
                p.generation = p.generation.wrapping_add(1);
                let r = keyed(self.seed, id as u32, p.generation);
                p.radius = params.respawn_min + r * (params.respawn_max - params.respawn_min);
            }
        }
    }

    /// Write one sample per particle into `out`.
    ///
    /// Cubes flatten toward the disc as they approach the core and grow as
    /// they close in.
    pub fn step_into(&self, camera: &Camera, viewport: &Viewport, out: &mut Vec<ParticleSample>) {
        out.clear();
        out.extend(self.particles.iter().map(|p| {
            let position = Vec3::new(
                p.angle.cos() * p.radius,
                p.height * (p.radius / 10.0),
                p.angle.sin() * p.radius,
            );
            let world_size = (0.05 + (10.0 - p.radius) * 0.01).max(0.0);
            let depth = camera.view_depth(position);
            ParticleSample {
                position,
                size: world_size * camera.pixels_per_unit(depth, viewport) * viewport.pixel_density,
                alpha: 0.6,
            }
        }));
    }
}

// =========================================================================
// DRIFT
// =========================================================================

/// Ambient golden motes floating around the mascot.
#[derive(Debug, Clone)]
pub struct DriftField {
    positions: Vec<Vec3>,
    colors: Vec<Vec3>,
}

impl DriftField {
    /// Seed `count` motes in a 10-unit cube.
    pub fn new(count: u32, seed: u64) -> Self {
        let mut positions = Vec::with_capacity(count as usize);
        let mut colors = Vec::with_capacity(count as usize);
        for i in 0..count {
            let mut ctx = SpawnContext::new(i, count, seed);
            positions.push(ctx.random_in_cube(5.0));
            colors.push(ctx.random_hsl(0.15, 0.25, 1.0, 0.7));
        }
        Self { positions, colors }
    }

    /// Number of motes.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether there are no motes.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Per-mote color, parallel to the samples.
    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    /// Write one sample per mote into `out`.
    pub fn step_into(&self, time: f32, camera: &Camera, viewport: &Viewport, out: &mut Vec<ParticleSample>) {
        out.clear();
        let yaw = Quat::from_rotation_y(time * 0.05);
        out.extend(self.positions.iter().enumerate().map(|(i, &seed)| {
            let phase = i as f32;
            let bob = (phase.cos() - (time + phase).cos()) * 0.06;
            let position = yaw * (seed + Vec3::new(0.0, bob, 0.0));
            let depth = camera.view_depth(position);
            ParticleSample {
                position,
                size: 0.05 * camera.pixels_per_unit(depth, viewport) * viewport.pixel_density,
                alpha: 0.8,
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tunnel_stays_in_range() {
        let params = TunnelParams::default();
        let mut tunnel = TunnelField::new(500, 3, params);
        let mut time = 0.0;
        for step in 0..2000 {
            time += 1.0 / 60.0;
            tunnel.advance(time, ProgressSignal::from_percent((step % 100) as f32));
            for &z in tunnel.depths() {
                assert!(z >= params.far && z <= params.near, "z = {z}");
            }
        }
    }

    #[test]
    fn test_tunnel_same_time_does_not_drift() {
        let mut tunnel = TunnelField::new(50, 3, TunnelParams::default());
        tunnel.advance(1.0, ProgressSignal::ZERO);
        tunnel.advance(1.5, ProgressSignal::ZERO);
        let before = tunnel.depths().to_vec();
        tunnel.advance(1.5, ProgressSignal::ZERO);
        tunnel.advance(1.5, ProgressSignal::FULL);
        assert_eq!(before, tunnel.depths());
    }

    #[test]
    fn test_tunnel_speed_grows_with_progress() {
        let tunnel = TunnelField::new(1, 3, TunnelParams::default());
        assert_eq!(tunnel.speed(ProgressSignal::ZERO), 15.0);
        assert_eq!(tunnel.speed(ProgressSignal::FULL), 55.0);
    }

    #[test]
    fn test_tunnel_travel_and_wrap() {
        let params = TunnelParams::default();
        let mut tunnel = TunnelField::new(1, 3, params);
        tunnel.depths[0] = 19.0;
        tunnel.advance(0.0, ProgressSignal::ZERO);
        // 0.05 s at 15 u/s moves 0.75
        tunnel.advance(0.05, ProgressSignal::ZERO);
        assert!((tunnel.depths()[0] - 19.75).abs() < 1e-4);
        tunnel.advance(0.1, ProgressSignal::ZERO);
        assert_eq!(tunnel.depths()[0], params.far);
    }

    #[test]
    fn test_tunnel_clock_going_backwards_is_ignored() {
        let mut tunnel = TunnelField::new(10, 3, TunnelParams::default());
        tunnel.advance(5.0, ProgressSignal::ZERO);
        let before = tunnel.depths().to_vec();
        tunnel.advance(1.0, ProgressSignal::ZERO);
        tunnel.advance(f32::NAN, ProgressSignal::ZERO);
        assert_eq!(before, tunnel.depths());
    }

    #[test]
    fn test_vortex_radius_bounded() {
        let params = VortexParams::default();
        let mut vortex = SpiralVortex::new(200, 11, params);
        let mut time = 0.0;
        for _ in 0..3000 {
            time += 1.0 / 30.0;
            vortex.advance(time, ProgressSignal::FULL);
            for r in vortex.radii() {
                assert!(r >= params.min_radius && r <= params.respawn_max, "r = {r}");
            }
        }
    }

    #[test]
    fn test_non_finite_params_spawn_without_panic() {
        let vortex = SpiralVortex::new(
            8,
            1,
            VortexParams {
                min_radius: f32::NAN,
                respawn_max: f32::INFINITY,
                ..VortexParams::default()
            },
        );
        assert_eq!(vortex.radii().count(), 8);

        let tunnel = TunnelField::new(
            8,
            1,
            TunnelParams {
                near: f32::NAN,
                far: f32::NAN,
                ring_max: f32::INFINITY,
                ..TunnelParams::default()
            },
        );
        assert_eq!(tunnel.depths().len(), 8);
    }

    #[test]
    fn test_vortex_respawn_is_deterministic() {
        let mut a = SpiralVortex::new(20, 5, VortexParams::default());
        let mut b = SpiralVortex::new(20, 5, VortexParams::default());
        let mut time = 0.0;
        for _ in 0..600 {
            time += 1.0 / 60.0;
            a.advance(time, ProgressSignal::from_percent(70.0));
            b.advance(time, ProgressSignal::from_percent(70.0));
        }
        assert!(a.radii().eq(b.radii()));
    }

    #[test]
    fn test_vortex_sizes_never_negative() {
        let vortex = SpiralVortex::new(200, 1, VortexParams::default());
        let mut out = Vec::new();
        vortex.step_into(&Camera::new(), &Viewport::default(), &mut out);
        assert_eq!(out.len(), 200);
        assert!(out.iter().all(|s| s.size >= 0.0));
    }

    #[test]
    fn test_drift_starts_at_seed_and_bobs() {
        let drift = DriftField::new(10, 2);
        let camera = Camera::new();
        let viewport = Viewport::default();
        let mut at_zero = Vec::new();
        drift.step_into(0.0, &camera, &viewport, &mut at_zero);
        assert_eq!(at_zero[0].position, drift.positions[0]);

        let mut later = Vec::new();
        drift.step_into(1.0, &camera, &viewport, &mut later);
        assert_ne!(at_zero[3].position, later[3].position);
        assert_eq!(drift.colors().len(), 10);
    }
}
