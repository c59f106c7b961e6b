//! # portalfx - progress-driven loading portal
//!
//! Procedural visuals for the wait behind a slow request. Everything on
//! screen is a pure function of clock time and a single 0-100 progress value
//! the host reports: a particle field pulled into a vortex, a wireframe core
//! with a readout, labels orbiting the core, a solid materializing behind a
//! dissolve seam, and status text, flashes and a final whiteout.
//!
//! ## Quick Start
//!
//! ```ignore
//! use portalfx::prelude::*;
//!
//! let mut portal = Portal::new(
//!     PortalConfig::portal()
//!         .with_seed(42)
//!         .with_labels(ProfileLabels::new().with_occasion("birthday").with_age(30).build()),
//! )?;
//! portal.mount(Viewport::new(1280, 720, 2.0));
//!
//! // in the host's frame callback
//! if let Some(state) = portal.step(time, request.percent()) {
//!     draw(state);
//! }
//!
//! portal.unmount();
//! ```
//!
//! ## Components
//!
//! | Component | Module | Driven by |
//! |-----------|--------|-----------|
//! | [`ParticleField`] | [`particles`] | progress pulls particles from their shell to a ring |
//! | [`TunnelField`], [`SpiralVortex`], [`DriftField`] | [`vortex`] | background populations |
//! | [`ConstellationCore`] | [`constellation`] | pulsing wireframe plus percent readout |
//! | [`OrbitLabelSystem`] | [`orbit`] | label orbits, hidden once terminal |
//! | [`DissolveTransitionEngine`] | [`dissolve`] | smoothed progress moves the seam |
//! | [`ProgressChoreographer`] | [`choreographer`] | status, flashes, log, whiteout |
//!
//! [`Portal`] owns them all and produces one [`RenderState`] per frame.
//!
//! ## Determinism
//!
//! Every random attribute comes from the config seed, and every per-frame
//! value depends only on `(time, progress)`. Stepping twice with the same
//! arguments gives the same state, so hosts may redraw freely.
//!
//! ## Rendering
//!
//! With the default `render` feature, [`gpu::Renderer`] draws a
//! [`RenderState`] with wgpu and [`window::run`] hosts a demo in a winit
//! window. Without it the crate is CPU-only and draws nothing itself;
//! [`batch::DrawBatch`] flattens a frame into Pod vertex lists for any
//! backend.

pub mod batch;
pub mod camera;
pub mod choreographer;
pub mod config;
pub mod constellation;
pub mod dissolve;
pub mod error;
#[cfg(feature = "render")]
pub mod gpu;
pub mod lifecycle;
pub mod mesh;
pub mod orbit;
pub mod particles;
pub mod portal;
pub mod progress;
pub mod random;
pub mod script;
pub mod shaders;
pub mod spawn;
pub mod time;
pub mod uniforms;
pub mod vortex;
#[cfg(feature = "render")]
pub mod window;

pub use bytemuck;
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

pub use batch::{DrawBatch, LineVertex, SpriteInstance};
pub use camera::{Camera, Viewport};
pub use choreographer::{ChoreoEvent, ChoreoFrame, DecodedText, ProgressChoreographer, Status};
pub use config::{Layers, PortalConfig};
pub use constellation::{ConstellationCore, CoreFrame, CoreStyle, Readout};
pub use dissolve::{DissolveFrame, DissolveParams, DissolveTransitionEngine, ProgressSmoother, ShadedPoint, Zone};
pub use error::ConfigError;
#[cfg(feature = "render")]
pub use error::{GpuError, RunError};
pub use lifecycle::{Lifecycle, Phase};
pub use mesh::{SurfaceMesh, WireframeMesh};
pub use orbit::{LabelPlacement, OrbitLabel, OrbitLabelSystem, ProfileLabels};
pub use particles::{Particle, ParticleField, ParticleSample, Shell, SuctionParams};
pub use portal::{Portal, RenderState};
pub use progress::ProgressSignal;
pub use script::{ProgressScript, ScriptPhase};
pub use spawn::SpawnContext;
pub use time::FrameClock;
pub use uniforms::{GpuUniforms, ShaderUniformSet, UniformValue};
pub use vortex::{DriftField, SpiralVortex, TunnelField, TunnelParams, VortexParams};

/// Convenient re-exports for hosts.
///
/// ```ignore
/// use portalfx::prelude::*;
/// ```
pub mod prelude {
    pub use crate::camera::{Camera, Viewport};
    pub use crate::choreographer::{ChoreoEvent, Status};
    pub use crate::config::{Layers, PortalConfig};
    pub use crate::constellation::CoreStyle;
    pub use crate::lifecycle::Phase;
    pub use crate::orbit::ProfileLabels;
    pub use crate::portal::{Portal, RenderState};
    pub use crate::progress::ProgressSignal;
    pub use crate::script::{ProgressScript, ScriptPhase};
    pub use crate::time::FrameClock;
    pub use glam::{Vec2, Vec3, Vec4};
}
