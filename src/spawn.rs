//! Spawn context for seeding particle populations.
//!
//! Each particle gets its own RNG seeded from the population seed and its
//! index, so a population rebuilt with the same seed is bit-identical. That
//! is what lets an unmount/remount cycle restore the exact initial shell.

use crate::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Context handed to population builders with helpers for common spawn patterns.
///
/// ```ignore
/// let mut ctx = SpawnContext::new(7, 2000, 42);
/// let seed_position = ctx.random_on_shell(4.0, 10.0);
/// let phase = ctx.random();
/// ```
pub struct SpawnContext {
    /// Index of the particle being spawned (0 to count-1).
    pub index: u32,
    /// Total number of particles being spawned.
    pub count: u32,
    rng: SmallRng,
}

impl SpawnContext {
    /// Create a spawn context for one particle of a seeded population.
    pub fn new(index: u32, count: u32, seed: u64) -> Self {
        // Spread neighbouring indices across the seed space
        let mixed = seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        Self {
            index,
            count,
            rng: SmallRng::seed_from_u64(mixed),
        }
    }

    /// Normalized position through the spawn (0.0 to 1.0).
    #[inline]
    pub fn progress(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        self.index as f32 / self.count as f32
    }

    // ========== Random primitives ==========

    /// Random f32 in `[0, 1)`.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in `[min, max)`. Returns `min` for an empty range.
    ///
    /// Non-finite bounds collapse to whichever bound is finite (or zero).
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        match (min.is_finite(), max.is_finite()) {
            (true, true) if max > min => self.rng.gen_range(min..max),
            (true, _) => min,
            (false, true) => max,
            (false, false) => 0.0,
        }
    }

    /// Random angle in `[0, 2π)`.
    #[inline]
    pub fn random_angle(&mut self) -> f32 {
        self.rng.gen_range(0.0..TAU)
    }

    // ========== Position helpers ==========

    /// Uniformly distributed unit vector.
    pub fn random_direction(&mut self) -> Vec3 {
        let theta = self.random_angle();
        // acos(2u - 1) keeps the density uniform over the sphere
        let phi = (2.0 * self.random() - 1.0).clamp(-1.0, 1.0).acos();
        Vec3::new(
            phi.sin() * theta.cos(),
            phi.sin() * theta.sin(),
            phi.cos(),
        )
    }

    /// Random point on a spherical shell with radius in `[min_radius, max_radius)`.
    pub fn random_on_shell(&mut self, min_radius: f32, max_radius: f32) -> Vec3 {
        let r = self.random_range(min_radius, max_radius);
        self.random_direction() * r
    }

    /// Random point inside a cube of given half-size, centered at origin.
    pub fn random_in_cube(&mut self, half_size: f32) -> Vec3 {
        Vec3::new(
            self.random_range(-half_size, half_size),
            self.random_range(-half_size, half_size),
            self.random_range(-half_size, half_size),
        )
    }

    // ========== Color helpers ==========

    /// Random color from a hue band at fixed saturation and lightness.
    pub fn random_hsl(&mut self, hue_min: f32, hue_max: f32, saturation: f32, lightness: f32) -> Vec3 {
        let hue = self.random_range(hue_min, hue_max);
        hsl_to_rgb(hue, saturation, lightness)
    }
}

/// Convert HSL (all components 0-1) to RGB.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Vec3 {
    if s <= 0.0 {
        return Vec3::splat(l);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    Vec3::new(
        hue_channel(p, q, h + 1.0 / 3.0),
        hue_channel(p, q, h),
        hue_channel(p, q, h - 1.0 / 3.0),
    )
}

fn hue_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_context_progress() {
        let ctx = SpawnContext::new(50, 100, 1);
        assert!((ctx.progress() - 0.5).abs() < 0.001);
        assert_eq!(SpawnContext::new(0, 0, 1).progress(), 0.0);
    }

    #[test]
    fn test_random_on_shell_bounds() {
        let mut ctx = SpawnContext::new(0, 1, 9);
        for _ in 0..500 {
            let r = ctx.random_on_shell(4.0, 10.0).length();
            assert!(r >= 4.0 - 1e-3 && r <= 10.0 + 1e-3, "radius {r}");
        }
    }

    #[test]
    fn test_seeded_spawn_is_reproducible() {
        let mut a = SpawnContext::new(17, 100, 1234);
        let mut b = SpawnContext::new(17, 100, 1234);
        assert_eq!(a.random_on_shell(4.0, 10.0), b.random_on_shell(4.0, 10.0));
        assert_eq!(a.random(), b.random());

        let mut c = SpawnContext::new(18, 100, 1234);
        let mut d = SpawnContext::new(17, 100, 1234);
        assert_ne!(c.random(), d.random());
    }

    #[test]
    fn test_empty_range_returns_min() {
        let mut ctx = SpawnContext::new(0, 1, 0);
        assert_eq!(ctx.random_range(3.0, 3.0), 3.0);
        assert_eq!(ctx.random_range(5.0, 2.0), 5.0);
    }

    #[test]
    fn test_non_finite_range_does_not_panic() {
        let mut ctx = SpawnContext::new(0, 1, 0);
        assert_eq!(ctx.random_range(4.0, f32::INFINITY), 4.0);
        assert_eq!(ctx.random_range(f32::NAN, 2.0), 2.0);
        assert_eq!(ctx.random_range(f32::NEG_INFINITY, f32::NAN), 0.0);
        assert!(ctx.random_on_shell(4.0, f32::INFINITY).is_finite());
    }

    #[test]
    fn test_hsl_to_rgb() {
        let red = hsl_to_rgb(0.0, 1.0, 0.5);
        assert!((red.x - 1.0).abs() < 1e-4);
        assert!(red.y.abs() < 1e-4);
        assert!(red.z.abs() < 1e-4);

        let gray = hsl_to_rgb(0.3, 0.0, 0.4);
        assert_eq!(gray, Vec3::splat(0.4));
    }
}
