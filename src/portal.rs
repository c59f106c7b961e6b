//! The engine facade.
//!
//! A [`Portal`] owns every component built from a [`PortalConfig`] and turns
//! `(time, progress)` into a [`RenderState`] once per frame. It never owns a
//! timer and never advances progress on its own: the host calls
//! [`Portal::step`] from its frame callback with whatever progress it has.
//!
//! ```ignore
//! let mut portal = Portal::new(PortalConfig::portal().with_labels(["friend", "30歳"]))?;
//! portal.mount(Viewport::new(1280, 720, window.scale_factor() as f32));
//!
//! // every frame
//! if let Some(state) = portal.step(clock.tick(), request.percent()) {
//!     renderer.render(state, &portal.config());
//! }
//!
//! portal.unmount();
//! ```
//!
//! Mount and unmount are idempotent. Every effective mount rebuilds all
//! components from the config, so nothing leaks from one progress cycle into
//! the next.

use crate::camera::{sanitize_pixel_density, Viewport};
use crate::choreographer::{ChoreoEvent, ChoreoFrame, ProgressChoreographer, Status};
use crate::config::PortalConfig;
use crate::error::ConfigError;
use crate::constellation::{ConstellationCore, CoreFrame};
use crate::dissolve::{DissolveFrame, DissolveTransitionEngine, ShadedPoint};
use crate::lifecycle::{Lifecycle, Phase};
use crate::orbit::{LabelPlacement, OrbitLabelSystem};
use crate::particles::{ParticleField, ParticleSample};
use crate::progress::ProgressSignal;
use crate::uniforms::ShaderUniformSet;
use crate::vortex::{DriftField, SpiralVortex, TunnelField};
use glam::{Mat4, Vec3};

// Per-component seed salts so populations sharing a config seed differ.
const SALT_PARTICLES: u64 = 0x01;
const SALT_TUNNEL: u64 = 0x02;
const SALT_VORTEX: u64 = 0x03;
const SALT_DRIFT: u64 = 0x04;
const SALT_CORE: u64 = 0x05;
const SALT_LABELS: u64 = 0x06;
const SALT_DISSOLVE: u64 = 0x07;
const SALT_CHOREO: u64 = 0x08;

fn salted(seed: u64, salt: u64) -> u64 {
    seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Everything the host needs to draw one frame.
///
/// Buffers are owned by the portal and refilled in place each step.
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    /// Clock time of this frame.
    pub time: f32,
    /// Sanitized progress.
    pub progress: ProgressSignal,
    pub phase: Phase,
    pub viewport: Viewport,
    pub view_proj: Mat4,
    pub uniforms: Option<ShaderUniformSet>,

    /// Suction field samples.
    pub particles: Vec<ParticleSample>,
    /// Tunnel samples.
    pub tunnel: Vec<ParticleSample>,
    /// Spiral vortex samples.
    pub vortex: Vec<ParticleSample>,
    /// Drift samples.
    pub drift: Vec<ParticleSample>,
    /// Per-mote drift colours, parallel to `drift`.
    pub drift_colors: Vec<Vec3>,

    pub core: Option<CoreFrame>,
    /// Transformed core wireframe segments.
    pub core_lines: Vec<(Vec3, Vec3)>,

    /// Visible orbit labels (empty once terminal).
    pub labels: Vec<LabelPlacement>,
    /// Text per placement, parallel to `labels`.
    pub label_text: Vec<String>,

    pub dissolve: Option<DissolveFrame>,
    pub dissolve_points: Vec<ShadedPoint>,

    pub choreo: ChoreoFrame,
    /// Choreography events raised this frame.
    pub events: Vec<ChoreoEvent>,
    /// Headline as currently decoded.
    pub headline: String,
    /// Rolling log, oldest first.
    pub log: Vec<&'static str>,
}

impl RenderState {
    /// Total sprites across every population.
    pub fn sprite_count(&self) -> usize {
        self.particles.len()
            + self.tunnel.len()
            + self.vortex.len()
            + self.drift.len()
            + self.dissolve_points.iter().filter(|p| p.visible).count()
    }

    /// Whether a flash fired this frame.
    pub fn flashed(&self) -> bool {
        self.events.iter().any(|e| matches!(e, ChoreoEvent::Flash { .. }))
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.choreo.status
    }
}

/// Components alive between one mount and the next unmount.
#[derive(Debug)]
struct Mounted {
    viewport: Viewport,
    particles: Option<ParticleField>,
    tunnel: Option<TunnelField>,
    vortex: Option<SpiralVortex>,
    drift: Option<DriftField>,
    core: Option<ConstellationCore>,
    labels: Option<OrbitLabelSystem>,
    dissolve: Option<DissolveTransitionEngine>,
    choreographer: ProgressChoreographer,
}

impl Mounted {
    fn build(config: &PortalConfig, labels: &[String], viewport: Viewport) -> Self {
        let seed = config.seed;
        let layers = config.layers;

        let particles = layers.particles.then(|| {
            ParticleField::new(config.particle_count, salted(seed, SALT_PARTICLES), config.shell)
                .with_params(config.suction)
        });
        let tunnel = layers
            .tunnel
            .then(|| TunnelField::new(config.tunnel_count, salted(seed, SALT_TUNNEL), config.tunnel));
        let vortex = layers
            .vortex
            .then(|| SpiralVortex::new(config.vortex_count, salted(seed, SALT_VORTEX), config.vortex));
        let drift = layers
            .drift
            .then(|| DriftField::new(config.drift_count, salted(seed, SALT_DRIFT)));
        let core = layers
            .core
            .then(|| ConstellationCore::new(config.core_style, salted(seed, SALT_CORE)));
        let orbit = layers.labels.then(|| {
            let mut system = OrbitLabelSystem::new(salted(seed, SALT_LABELS));
            system.set_labels(labels.iter().cloned());
            system
        });
        let dissolve = layers.dissolve.then(|| {
            DissolveTransitionEngine::new(config.dissolve, config.color, salted(seed, SALT_DISSOLVE))
        });

        Self {
            viewport,
            particles,
            tunnel,
            vortex,
            drift,
            core,
            labels: orbit,
            dissolve,
            choreographer: ProgressChoreographer::new(salted(seed, SALT_CHOREO)),
        }
    }
}

/// Progress-driven loading visualization.
#[derive(Debug)]
pub struct Portal {
    config: PortalConfig,
    labels: Vec<String>,
    lifecycle: Lifecycle,
    mounted: Option<Mounted>,
    state: RenderState,
}

impl Portal {
    /// Create an unmounted portal.
    ///
    /// The config is validated here, so a mount can never spawn from
    /// non-finite or inverted ranges.
    pub fn new(config: PortalConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let labels = config.labels.clone();
        Ok(Self {
            config,
            labels,
            lifecycle: Lifecycle::new(),
            mounted: None,
            state: RenderState::default(),
        })
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Build every component and start a fresh cycle.
    ///
    /// Returns `false` if already mounted, in which case nothing changes.
    pub fn mount(&mut self, viewport: Viewport) -> bool {
        if !self.lifecycle.mount() {
            return false;
        }
        let viewport = self.sanitize(viewport);
        log::info!(
            "portal mounted {}x{} @{}x (generation {})",
            viewport.width,
            viewport.height,
            viewport.pixel_density,
            self.lifecycle.generation()
        );
        self.mounted = Some(Mounted::build(&self.config, &self.labels, viewport));
        self.state = RenderState {
            viewport,
            ..RenderState::default()
        };
        true
    }

    /// Drop every component and stop producing frames.
    ///
    /// Returns `false` if not mounted.
    pub fn unmount(&mut self) -> bool {
        if !self.lifecycle.unmount() {
            return false;
        }
        self.mounted = None;
        self.state = RenderState::default();
        log::info!("portal unmounted");
        true
    }

    pub fn is_mounted(&self) -> bool {
        self.lifecycle.is_mounted()
    }

    /// Current phase (idle while unmounted).
    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    /// Track a new drawing surface size. Ignored while unmounted.
    pub fn resize(&mut self, viewport: Viewport) {
        let viewport = self.sanitize(viewport);
        if let Some(mounted) = &mut self.mounted {
            log::debug!("resize {}x{}", viewport.width, viewport.height);
            mounted.viewport = viewport;
        }
    }

    /// Replace the orbit label list.
    ///
    /// Takes effect immediately when mounted and survives remounts. Passing
    /// the current list again is a no-op.
    pub fn set_labels<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        if let Some(orbit) = self.mounted.as_mut().and_then(|m| m.labels.as_mut()) {
            orbit.set_labels(self.labels.iter().cloned());
        }
    }

    /// The state from the most recent step.
    pub fn state(&self) -> Option<&RenderState> {
        self.mounted.as_ref().map(|_| &self.state)
    }

    /// Advance to `time` with the host's progress (percent, 0 to 100).
    ///
    /// Returns `None` while unmounted. Out-of-range or NaN progress is
    /// clamped. Calling twice with the same arguments yields the same state.
    pub fn step(&mut self, time: f32, progress_percent: f32) -> Option<&RenderState> {
        let mounted = self.mounted.as_mut()?;
        let progress = ProgressSignal::from_percent(progress_percent);
        let config = &self.config;
        let camera = &config.camera;
        let viewport = mounted.viewport;
        let density = viewport.pixel_density;
        let state = &mut self.state;

        self.lifecycle.observe(progress);
        let phase = self.lifecycle.phase();
        let terminal = phase == Phase::Terminal;

        let choreographer = &mut mounted.choreographer;
        state.events.clear();
        state.events.extend_from_slice(choreographer.update(time, progress));
        let terminal_since = choreographer.terminal_since();

        match &mounted.particles {
            Some(field) => field.step_into(time, progress, camera, density, &mut state.particles),
            None => state.particles.clear(),
        }
        match &mut mounted.tunnel {
            Some(tunnel) => {
                tunnel.advance(time, progress);
                tunnel.step_into(camera, &viewport, &mut state.tunnel);
            }
            None => state.tunnel.clear(),
        }
        match &mut mounted.vortex {
            Some(vortex) => {
                vortex.advance(time, progress);
                vortex.step_into(camera, &viewport, &mut state.vortex);
            }
            None => state.vortex.clear(),
        }
        state.drift_colors.clear();
        match &mounted.drift {
            Some(drift) => {
                drift.step_into(time, camera, &viewport, &mut state.drift);
                state.drift_colors.extend_from_slice(drift.colors());
            }
            None => state.drift.clear(),
        }

        state.core = mounted.core.as_ref().map(|core| {
            let frame = core.step(time, progress, terminal_since);
            core.lines_into(&frame, &mut state.core_lines);
            frame
        });
        if state.core.is_none() {
            state.core_lines.clear();
        }

        state.labels.clear();
        state.label_text.clear();
        if let Some(orbit) = &mounted.labels {
            if !terminal {
                orbit.step_into(time, progress, &mut state.labels);
            }
            state
                .label_text
                .extend(state.labels.iter().map(|p| orbit.labels()[p.index].display_text()));
        }

        state.dissolve = match &mut mounted.dissolve {
            Some(engine) => Some(engine.step_into(time, progress, terminal, camera, &mut state.dissolve_points)),
            None => {
                state.dissolve_points.clear();
                None
            }
        };

        state.choreo = choreographer.frame(time);
        choreographer.headline().render_into(time, &mut state.headline);
        state.log.clear();
        state.log.extend(choreographer.log_lines());

        let shaded_progress = state.dissolve.map_or(progress.value(), |d| d.smoothed_progress);
        state.uniforms = Some(ShaderUniformSet::new(time, shaded_progress, config.color, density));
        state.time = time;
        state.progress = progress;
        state.phase = phase;
        state.viewport = viewport;
        state.view_proj = camera.view_proj(&viewport);

        Some(&self.state)
    }

    fn sanitize(&self, viewport: Viewport) -> Viewport {
        Viewport {
            pixel_density: sanitize_pixel_density(viewport.pixel_density, self.config.max_pixel_density),
            ..viewport
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Layers;

    fn small() -> PortalConfig {
        PortalConfig::portal()
            .with_particle_count(64)
            .with_tunnel_count(64)
            .with_labels(["a", "b", "c"])
    }

    #[test]
    fn test_step_requires_mount() {
        let mut portal = Portal::new(small()).unwrap();
        assert!(portal.step(0.0, 10.0).is_none());
        assert!(portal.state().is_none());
        portal.mount(Viewport::default());
        assert!(portal.step(0.0, 10.0).is_some());
        portal.unmount();
        assert!(portal.step(0.1, 10.0).is_none());
    }

    #[test]
    fn test_mount_unmount_idempotent() {
        let mut portal = Portal::new(small()).unwrap();
        assert!(portal.mount(Viewport::default()));
        assert!(!portal.mount(Viewport::default()));
        assert!(portal.unmount());
        assert!(!portal.unmount());
        assert!(!portal.is_mounted());
    }

    #[test]
    fn test_layer_populations() {
        let mut portal = Portal::new(small()).unwrap();
        portal.mount(Viewport::default());
        let state = portal.step(0.5, 30.0).unwrap();
        assert_eq!(state.particles.len(), 64);
        assert_eq!(state.tunnel.len(), 64);
        assert!(state.vortex.is_empty());
        assert!(state.dissolve.is_none());
        assert!(state.core.is_some());
        assert_eq!(state.core_lines.len(), 120);
        assert_eq!(state.labels.len(), 3);
        assert_eq!(state.label_text[1], "[b]");
    }

    #[test]
    fn test_step_is_idempotent_for_same_time() {
        let mut portal = Portal::new(small().with_layers(Layers {
            vortex: true,
            dissolve: true,
            ..Layers::default()
        }))
        .unwrap();
        portal.mount(Viewport::default());
        portal.step(0.0, 0.0);
        let a = portal.step(1.0, 40.0).unwrap().clone();
        let b = portal.step(1.0, 40.0).unwrap();
        assert_eq!(a.particles, b.particles);
        assert_eq!(a.tunnel, b.tunnel);
        assert_eq!(a.vortex, b.vortex);
        assert_eq!(a.dissolve_points, b.dissolve_points);
    }

    #[test]
    fn test_terminal_hides_labels_and_latches() {
        let mut portal = Portal::new(small()).unwrap();
        portal.mount(Viewport::default());
        portal.step(0.0, 50.0);
        let state = portal.step(1.0, 99.5).unwrap();
        assert_eq!(state.phase, Phase::Terminal);
        assert!(state.labels.is_empty());

        let state = portal.step(2.0, 20.0).unwrap();
        assert_eq!(state.phase, Phase::Terminal);
        assert!(state.labels.is_empty());
        assert_eq!(state.choreo.whiteout_opacity, 1.0);
    }

    #[test]
    fn test_resize_caps_density() {
        let mut portal = Portal::new(small().with_max_pixel_density(1.5)).unwrap();
        portal.mount(Viewport::new(100, 100, 1.0));
        portal.resize(Viewport::new(640, 480, 3.0));
        let state = portal.step(0.0, 0.0).unwrap();
        assert_eq!(state.viewport.width, 640);
        assert_eq!(state.viewport.pixel_density, 1.5);
    }

    #[test]
    fn test_set_labels_survives_remount() {
        let mut portal = Portal::new(small()).unwrap();
        portal.mount(Viewport::default());
        portal.set_labels(["x"]);
        assert_eq!(portal.step(0.0, 10.0).unwrap().labels.len(), 1);
        portal.unmount();
        portal.mount(Viewport::default());
        assert_eq!(portal.step(0.0, 10.0).unwrap().label_text, vec!["[x]".to_string()]);
    }

    #[test]
    fn test_invalid_config_is_refused_before_mount() {
        let err = Portal::new(PortalConfig::new().with_shell(4.0, f32::INFINITY)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "shell", .. }));

        let inverted = PortalConfig::new().with_vortex(crate::vortex::VortexParams {
            min_radius: 30.0,
            ..Default::default()
        });
        assert!(Portal::new(inverted).is_err());
    }

    #[test]
    fn test_nan_progress_is_zero() {
        let mut portal = Portal::new(small()).unwrap();
        portal.mount(Viewport::default());
        let state = portal.step(0.0, f32::NAN).unwrap();
        assert_eq!(state.progress, ProgressSignal::ZERO);
        assert_eq!(state.phase, Phase::Idle);
    }
}
