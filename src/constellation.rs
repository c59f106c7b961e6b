//! The focal object: a rotating wireframe with a billboard percent readout.
//!
//! Three styles share the same geometry and readout but animate it
//! differently:
//!
//! - [`CoreStyle::Constellation`]: slow tumble, tiny breathing pulse. Progress
//!   only changes the number.
//! - [`CoreStyle::Hud`]: the pulse quickens and deepens with progress and the
//!   wireframe brightens from 30% to full.
//! - [`CoreStyle::Charge`]: the core swells and glows harder as it charges,
//!   then collapses to a point once the terminal state latches.
//!
//! Every output is a pure function of `(seed, time, progress)`, including the
//! readout glitch, which draws from the frame key rather than an ambient RNG.

use crate::mesh::WireframeMesh;
use crate::progress::ProgressSignal;
use crate::random::{fold_seed, frame_seed, hash2, hash3, rand};
use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Radius of the constellation wireframe.
pub const CORE_RADIUS: f32 = 1.2;

/// Radius of the HUD and charge wireframes.
pub const HUD_CORE_RADIUS: f32 = 1.5;

/// Subdivision level of the core wireframe.
pub const CORE_DETAIL: u32 = 1;

/// Scale of the faint inner shell relative to the outer wireframe.
pub const INNER_SHELL_SCALE: f32 = 0.9;

/// Per-frame chance threshold above which the readout glitches.
const GLITCH_THRESHOLD: f32 = 0.98;

/// Horizontal reach of a readout glitch kick.
const GLITCH_AMPLITUDE: f32 = 0.05;

/// Collapse factor applied per 1/60 s once a charged core goes terminal.
const COLLAPSE_PER_FRAME: f32 = 0.8;

/// How the core reacts to time and progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreStyle {
    /// Slow tumble, fixed faint opacity.
    #[default]
    Constellation,
    /// Progress-driven pulse and brightness.
    Hud,
    /// Swells with progress, collapses at the end.
    Charge,
}

impl CoreStyle {
    /// Unscaled wireframe radius for this style.
    pub fn radius(self) -> f32 {
        match self {
            CoreStyle::Constellation => CORE_RADIUS,
            CoreStyle::Hud | CoreStyle::Charge => HUD_CORE_RADIUS,
        }
    }
}

/// Percent readout shown on the billboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Readout {
    percent: u8,
}

impl Readout {
    /// Readout for a progress value, rounded to the nearest percent.
    pub fn from_progress(progress: ProgressSignal) -> Self {
        Self {
            percent: progress.percent().round().clamp(0.0, 100.0) as u8,
        }
    }

    /// Whole percent shown.
    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Decimal digits, most significant first, without leading zeros.
    ///
    /// Drives a rolling counter where each digit column scrolls to its value.
    pub fn digits(&self) -> impl Iterator<Item = u8> {
        let p = self.percent;
        let all = [p / 100, (p / 10) % 10, p % 10];
        let skip = match p {
            100.. => 0,
            10..=99 => 1,
            _ => 2,
        };
        all.into_iter().skip(skip)
    }
}

impl fmt::Display for Readout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent)
    }
}

/// Everything needed to draw the core for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoreFrame {
    /// Wireframe orientation.
    pub rotation: Quat,
    /// Uniform wireframe scale.
    pub scale: f32,
    /// Wireframe opacity.
    pub opacity: f32,
    /// Brightness multiplier for the core colour.
    pub intensity: f32,
    /// Number on the billboard.
    pub readout: Readout,
    /// Billboard offset from the core centre.
    pub readout_offset: Vec3,
    /// Whether the readout took a glitch kick this frame.
    pub glitched: bool,
}

/// Rotating wireframe and readout at the centre of the scene.
#[derive(Debug, Clone)]
pub struct ConstellationCore {
    wireframe: WireframeMesh,
    style: CoreStyle,
    seed: u64,
}

impl ConstellationCore {
    /// Build the core geometry.
    pub fn new(style: CoreStyle, seed: u64) -> Self {
        Self {
            wireframe: WireframeMesh::icosahedron(style.radius(), CORE_DETAIL),
            style,
            seed,
        }
    }

    /// Animation style.
    pub fn style(&self) -> CoreStyle {
        self.style
    }

    /// Untransformed wireframe.
    pub fn wireframe(&self) -> &WireframeMesh {
        &self.wireframe
    }

    /// Compute this frame's transform and readout.
    ///
    /// `terminal_since` is the clock time the terminal state latched, if it has.
    pub fn step(&self, time: f32, progress: ProgressSignal, terminal_since: Option<f32>) -> CoreFrame {
        let p = progress.value();
        let (rotation, scale, opacity, intensity) = match self.style {
            CoreStyle::Constellation => (
                Quat::from_euler(EulerRot::XYZ, time * 0.1, time * 0.15, 0.0),
                1.0 + (time * 4.0).sin() * 0.02,
                0.15,
                1.0,
            ),
            CoreStyle::Hud => {
                let speed = 2.0 + p * 8.0;
                let amplitude = 0.05 + p * 0.1;
                (
                    Quat::from_euler(EulerRot::XYZ, time * 0.6, time * 1.2, 0.0),
                    1.0 + (time * speed).sin() * amplitude,
                    0.3 + p * 0.7,
                    1.0,
                )
            }
            CoreStyle::Charge => {
                let base = 1.0 + p * 0.2;
                let pulse = 1.0 + (time * (2.0 + p * 5.0)).sin() * 0.05;
                let collapse = match terminal_since {
                    Some(since) => collapse_factor(time - since),
                    None => 1.0,
                };
                (
                    Quat::from_euler(EulerRot::XYZ, time * 0.1, time * 0.15, 0.0),
                    base * pulse * collapse,
                    0.8,
                    1.0 + p * 4.0,
                )
            }
        };

        let (kick, glitched) = self.glitch_kick(time);
        CoreFrame {
            rotation,
            scale,
            opacity,
            intensity,
            readout: Readout::from_progress(progress),
            readout_offset: Vec3::new((time * 3.0).sin() * 0.01 + kick, (time * 2.5).cos() * 0.01, 0.0),
            glitched,
        }
    }

    /// Write the transformed wireframe segments for a frame.
    pub fn lines_into(&self, frame: &CoreFrame, out: &mut Vec<(Vec3, Vec3)>) {
        self.wireframe.transform_into(frame.rotation, frame.scale, out);
    }

    fn glitch_kick(&self, time: f32) -> (f32, bool) {
        let key = hash2(fold_seed(self.seed), frame_seed(time));
        if rand(key) <= GLITCH_THRESHOLD {
            return (0.0, false);
        }
        let r = rand(hash3(fold_seed(self.seed), frame_seed(time), 1));
        ((r - 0.5) * GLITCH_AMPLITUDE, true)
    }
}

/// Remaining scale of a charged core `elapsed` seconds after terminal entry.
fn collapse_factor(elapsed: f32) -> f32 {
    if !elapsed.is_finite() || elapsed <= 0.0 {
        return 1.0;
    }
    COLLAPSE_PER_FRAME.powf(elapsed * crate::random::FRAME_RATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readout_rounds() {
        assert_eq!(Readout::from_progress(ProgressSignal::from_percent(49.5)).to_string(), "50%");
        assert_eq!(Readout::from_progress(ProgressSignal::from_percent(0.4)).to_string(), "0%");
        assert_eq!(Readout::from_progress(ProgressSignal::from_percent(250.0)).to_string(), "100%");
    }

    #[test]
    fn test_readout_digits() {
        let digits = |p: f32| Readout::from_progress(ProgressSignal::from_percent(p)).digits().collect::<Vec<_>>();
        assert_eq!(digits(7.0), vec![7]);
        assert_eq!(digits(42.0), vec![4, 2]);
        assert_eq!(digits(100.0), vec![1, 0, 0]);
    }

    #[test]
    fn test_constellation_ignores_progress() {
        let core = ConstellationCore::new(CoreStyle::Constellation, 1);
        let a = core.step(3.0, ProgressSignal::ZERO, None);
        let b = core.step(3.0, ProgressSignal::FULL, None);
        assert_eq!(a.rotation, b.rotation);
        assert_eq!(a.scale, b.scale);
        assert_eq!(a.opacity, b.opacity);
        assert_ne!(a.readout, b.readout);
    }

    #[test]
    fn test_constellation_pulse_bounds() {
        let core = ConstellationCore::new(CoreStyle::Constellation, 1);
        for i in 0..600 {
            let frame = core.step(i as f32 / 60.0, ProgressSignal::ZERO, None);
            assert!(frame.scale >= 0.98 - 1e-6 && frame.scale <= 1.02 + 1e-6);
        }
    }

    #[test]
    fn test_hud_brightens_with_progress() {
        let core = ConstellationCore::new(CoreStyle::Hud, 1);
        assert!((core.step(1.0, ProgressSignal::ZERO, None).opacity - 0.3).abs() < 1e-6);
        assert!((core.step(1.0, ProgressSignal::FULL, None).opacity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_charge_collapses_after_terminal() {
        let core = ConstellationCore::new(CoreStyle::Charge, 1);
        let before = core.step(10.0, ProgressSignal::FULL, Some(10.0));
        let after = core.step(11.0, ProgressSignal::FULL, Some(10.0));
        assert!(after.scale < before.scale * 1e-3);
        assert!(after.scale >= 0.0);
        assert!((before.intensity - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_charge_pulse_scales_with_base() {
        let core = ConstellationCore::new(CoreStyle::Charge, 1);
        // sin peaks at t·7 = π/2 with full progress
        let t = std::f32::consts::FRAC_PI_2 / 7.0;
        let frame = core.step(t, ProgressSignal::FULL, None);
        assert!((frame.scale - 1.2 * 1.05).abs() < 1e-5, "scale = {}", frame.scale);

        let rest = core.step(0.0, ProgressSignal::FULL, None);
        assert!((rest.scale - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_radius_per_style() {
        let extent = |style: CoreStyle| {
            ConstellationCore::new(style, 1)
                .wireframe()
                .to_vertices()
                .into_iter()
                .map(|v| v.length())
                .fold(0.0f32, f32::max)
        };
        assert!((extent(CoreStyle::Constellation) - CORE_RADIUS).abs() < 1e-4);
        assert!((extent(CoreStyle::Hud) - HUD_CORE_RADIUS).abs() < 1e-4);
        assert!((extent(CoreStyle::Charge) - HUD_CORE_RADIUS).abs() < 1e-4);
    }

    #[test]
    fn test_glitch_deterministic_and_rare() {
        let core = ConstellationCore::new(CoreStyle::Constellation, 99);
        let mut glitches = 0;
        for i in 0..6000 {
            let t = i as f32 / 60.0;
            let a = core.step(t, ProgressSignal::ZERO, None);
            let b = core.step(t, ProgressSignal::ZERO, None);
            assert_eq!(a, b);
            if a.glitched {
                glitches += 1;
                assert!(a.readout_offset.x.abs() <= 0.01 + GLITCH_AMPLITUDE * 0.5 + 1e-6);
            }
        }
        // ~2% of 6000 frames
        assert!(glitches > 40 && glitches < 250, "glitches = {glitches}");
    }

    #[test]
    fn test_lines_into_reuses_buffer() {
        let core = ConstellationCore::new(CoreStyle::Constellation, 1);
        let frame = core.step(0.0, ProgressSignal::ZERO, None);
        let mut lines = Vec::new();
        core.lines_into(&frame, &mut lines);
        assert_eq!(lines.len(), 120);
        core.lines_into(&frame, &mut lines);
        assert_eq!(lines.len(), 120);
    }
}
