//! The suction particle field.
//!
//! A fixed population of particles seeded on a spherical shell. Each frame
//! every particle is placed by a pure function of its seed attributes, the
//! clock and the progress signal:
//!
//! 1. **Suction** - the radius eases from the seed radius toward a small,
//!    slightly breathing target radius with `progress²`, so the pull visibly
//!    accelerates near completion.
//! 2. **Swirl** - the seed direction spins about Y at the particle's own speed,
//!    with an extra twist of `progress · 5` radians.
//! 3. **Instability** - a small multi-axis high-frequency jitter scaled by
//!    progress.
//!
//! Point sprites shrink with view depth and grow with device pixel density.
//! The field owns no per-frame state; [`ParticleField::step_into`] may be
//! called any number of times for the same `(time, progress)` with identical
//! results.

use crate::camera::Camera;
use crate::progress::{lerp, ProgressSignal};
use crate::spawn::SpawnContext;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Immutable per-particle seed attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Initial position on the spawn shell.
    pub seed_position: Vec3,
    /// Phase offset in `[0, 1)`.
    pub random_phase: f32,
    /// Angular speed multiplier in `[0.5, 1.5)`.
    pub random_speed: f32,
    /// Sprite size multiplier in `[0.5, 1.5)`.
    pub random_scale: f32,
}

impl Particle {
    /// Seed a particle on a shell of radius `[shell.min, shell.max)`.
    pub fn spawn(ctx: &mut SpawnContext, shell: &Shell) -> Self {
        Self {
            seed_position: ctx.random_on_shell(shell.min, shell.max),
            random_phase: ctx.random(),
            random_speed: ctx.random_range(0.5, 1.5),
            random_scale: ctx.random_range(0.5, 1.5),
        }
    }

    /// Distance from the focal point at zero progress.
    #[inline]
    pub fn initial_radius(&self) -> f32 {
        self.seed_position.length()
    }
}

/// Radii of the spawn shell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shell {
    /// Inner radius.
    pub min: f32,
    /// Outer radius.
    pub max: f32,
}

impl Default for Shell {
    fn default() -> Self {
        Self { min: 4.0, max: 10.0 }
    }
}

/// Tuning for the suction and swirl transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuctionParams {
    /// Radius every particle converges to at full progress.
    pub target_radius: f32,
    /// Amplitude of the breathing applied to the target radius.
    pub target_jitter: f32,
    /// Frequency (rad/s) of the target radius breathing.
    pub target_jitter_frequency: f32,
    /// Base angular speed factor (multiplied by each particle's speed).
    pub spin: f32,
    /// Extra twist in radians at full progress.
    pub swirl: f32,
    /// Amplitude of the high-frequency jitter at full progress.
    pub instability: f32,
    /// Sprite size contributed by the particle's scale attribute.
    pub point_size_scale: f32,
    /// Sprite size every particle has regardless of scale.
    pub point_size_base: f32,
}

impl Default for SuctionParams {
    fn default() -> Self {
        Self {
            target_radius: 1.2,
            target_jitter: 0.1,
            target_jitter_frequency: 2.0,
            spin: 0.5,
            swirl: 5.0,
            instability: 0.02,
            point_size_scale: 30.0,
            point_size_base: 10.0,
        }
    }
}

/// Per-frame output for one particle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParticleSample {
    /// World-space position.
    pub position: Vec3,
    /// Sprite diameter in pixels (0 when behind the camera).
    pub size: f32,
    /// Opacity in `[0, 1]`.
    pub alpha: f32,
}

/// Quadratic suction easing: `lerp(initial, target, progress²)`.
#[inline]
pub fn suction_radius(initial: f32, target: f32, progress: ProgressSignal) -> f32 {
    lerp(initial, target, progress.eased()).max(0.0)
}

/// A fixed-size population of suction particles.
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    params: SuctionParams,
    shell: Shell,
    seed: u64,
}

impl ParticleField {
    /// Seed `count` particles on `shell` from `seed`.
    pub fn new(count: u32, seed: u64, shell: Shell) -> Self {
        let shell = Shell {
            min: shell.min.max(0.0),
            max: shell.max.max(shell.min.max(0.0)),
        };
        let particles = (0..count)
            .map(|i| {
                let mut ctx = SpawnContext::new(i, count, seed);
                Particle::spawn(&mut ctx, &shell)
            })
            .collect();

        Self {
            particles,
            params: SuctionParams::default(),
            shell,
            seed,
        }
    }

    /// Replace the suction tuning.
    pub fn with_params(mut self, params: SuctionParams) -> Self {
        self.params = params;
        self
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether the field holds no particles.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Seed attributes of every particle.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Spawn shell radii.
    pub fn shell(&self) -> Shell {
        self.shell
    }

    /// Seed this field was built from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Suction tuning.
    pub fn params(&self) -> &SuctionParams {
        &self.params
    }

    /// Target radius for a particle at `time`, including the breathing jitter.
    #[inline]
    pub fn target_radius(&self, particle: &Particle, time: f32) -> f32 {
        let p = &self.params;
        p.target_radius
            + (time * p.target_jitter_frequency + particle.random_phase * 10.0).sin() * p.target_jitter
    }

    /// Current suction radius of a particle.
    #[inline]
    pub fn radius(&self, particle: &Particle, time: f32, progress: ProgressSignal) -> f32 {
        suction_radius(particle.initial_radius(), self.target_radius(particle, time), progress)
    }

    /// World position of a particle.
    pub fn position(&self, particle: &Particle, time: f32, progress: ProgressSignal) -> Vec3 {
        let p = &self.params;
        let pv = progress.value();

        let angle = time * particle.random_speed * p.spin
            + particle.random_phase * TAU
            + pv * p.swirl;

        let direction = particle.seed_position.normalize_or_zero();
        let swirled = Quat::from_rotation_y(-angle) * direction;
        let mut position = swirled * self.radius(particle, time, progress);

        // Nervous jitter that grows as the portal nears completion
        let jitter = Vec3::new(
            (time * 10.0 + particle.random_scale).sin(),
            (time * 15.0 + particle.random_speed).cos(),
            (time * 20.0 + particle.random_phase).sin(),
        );
        position += jitter * p.instability * pv;
        position
    }

    /// Sprite size in pixels for a particle at `position`.
    #[inline]
    pub fn point_size(&self, particle: &Particle, position: Vec3, camera: &Camera, pixel_density: f32) -> f32 {
        let depth = camera.view_depth(position);
        if depth <= camera.near {
            return 0.0;
        }
        let p = &self.params;
        (p.point_size_scale * particle.random_scale + p.point_size_base) * pixel_density / depth
    }

    /// Full per-particle sample.
    pub fn sample(
        &self,
        particle: &Particle,
        time: f32,
        progress: ProgressSignal,
        camera: &Camera,
        pixel_density: f32,
    ) -> ParticleSample {
        let position = self.position(particle, time, progress);
        ParticleSample {
            position,
            size: self.point_size(particle, position, camera, pixel_density),
            alpha: 0.5 + 0.5 * (time + particle.random_phase * 10.0).sin(),
        }
    }

    /// Write one sample per particle into `out`, reusing its allocation.
    pub fn step_into(
        &self,
        time: f32,
        progress: ProgressSignal,
        camera: &Camera,
        pixel_density: f32,
        out: &mut Vec<ParticleSample>,
    ) {
        out.clear();
        out.extend(
            self.particles
                .iter()
                .map(|particle| self.sample(particle, time, progress, camera, pixel_density)),
        );
    }
}
