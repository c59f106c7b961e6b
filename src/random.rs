//! Seeded pseudo-random functions.
//!
//! Every "random" visual in the portal (glitch kicks, dither masks, respawn
//! radii) is a pure function of a seed, an object id and, where it must
//! change over time, a frame key. Recomputing a frame therefore yields the
//! exact same picture, which keeps the engine testable.
//!
//! The integer hash is the same avalanche mix the render shaders use, so CPU
//! and GPU agree when both sample it.

/// Frames per second used to quantize time into frame keys.
pub const FRAME_RATE: f32 = 60.0;

/// Hash a u32 to a pseudo-random u32.
#[inline]
pub fn hash(n: u32) -> u32 {
    let mut x = n;
    x ^= x >> 17;
    x = x.wrapping_mul(0xed5a_d4bb);
    x ^= x >> 11;
    x = x.wrapping_mul(0xac4c_1b51);
    x ^= x >> 15;
    x = x.wrapping_mul(0x3184_8bab);
    x ^= x >> 14;
    x
}

/// Hash two values.
#[inline]
pub fn hash2(a: u32, b: u32) -> u32 {
    hash(a.wrapping_add(hash(b)))
}

/// Hash three values.
#[inline]
pub fn hash3(a: u32, b: u32, c: u32) -> u32 {
    hash(a.wrapping_add(hash(b.wrapping_add(hash(c)))))
}

/// Random float in `[0, 1)` from a seed.
#[inline]
pub fn rand(seed: u32) -> f32 {
    // 24 high bits keep the result strictly below 1.0 in f32
    (hash(seed) >> 8) as f32 / (1u32 << 24) as f32
}

/// Random float in `[min, max)`.
#[inline]
pub fn rand_range(seed: u32, min: f32, max: f32) -> f32 {
    min + rand(seed) * (max - min)
}

/// Fold a 64-bit seed into 32 bits.
#[inline]
pub fn fold_seed(seed: u64) -> u32 {
    (seed as u32) ^ ((seed >> 32) as u32)
}

/// Deterministic float in `[0, 1)` keyed by seed, object id and a salt.
///
/// The salt distinguishes independent attributes of the same object
/// (e.g. radius X vs radius Z of one orbit).
#[inline]
pub fn keyed(seed: u64, id: u32, salt: u32) -> f32 {
    (hash3(fold_seed(seed), id, salt) >> 8) as f32 / (1u32 << 24) as f32
}

/// Quantize a clock value into a per-frame key.
///
/// All calls made with times inside the same 1/60 s slot share a key, so a
/// frame recomputed twice draws the same random numbers.
#[inline]
pub fn frame_seed(time: f32) -> u32 {
    if !time.is_finite() || time <= 0.0 {
        return 0;
    }
    (time * FRAME_RATE).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rand_unit_interval() {
        for seed in 0..10_000u32 {
            let r = rand(seed.wrapping_mul(7919));
            assert!((0.0..1.0).contains(&r));
        }
    }

    #[test]
    fn test_rand_range() {
        for seed in 0..1000 {
            let r = rand_range(seed, 0.5, 1.5);
            assert!((0.5..1.5).contains(&r));
        }
    }

    #[test]
    fn test_keyed_is_deterministic() {
        assert_eq!(keyed(42, 3, 1), keyed(42, 3, 1));
        assert_ne!(keyed(42, 3, 1), keyed(42, 3, 2));
        assert_ne!(keyed(42, 3, 1), keyed(43, 3, 1));
    }

    #[test]
    fn test_frame_seed_quantizes() {
        assert_eq!(frame_seed(1.0), frame_seed(1.0 + 0.001));
        assert_ne!(frame_seed(1.0), frame_seed(1.0 + 1.0 / 30.0));
        assert_eq!(frame_seed(f32::NAN), 0);
        assert_eq!(frame_seed(-3.0), 0);
    }

    #[test]
    fn test_hash_spreads() {
        // Neighbouring ids should not collapse to the same value
        let a = hash(1);
        let b = hash(2);
        assert_ne!(a, b);
        assert_ne!(hash2(1, 2), hash2(2, 1));
    }
}
