//! Portal configuration.
//!
//! A [`PortalConfig`] describes everything a [`Portal`](crate::Portal) is
//! rebuilt from on mount: which layers exist, how many particles each holds,
//! the seed that fixes every random attribute, and the tuning of each
//! effect. Configs are plain data, serializable with serde so hosts can ship
//! them as JSON.
//!
//! ```ignore
//! let config = PortalConfig::portal()
//!     .with_particle_count(3000)
//!     .with_seed(7)
//!     .with_labels(["friend", "birthday"]);
//! config.validate()?;
//!
//! let from_disk = PortalConfig::from_json_file("portal.json")?;
//! ```
//!
//! Every field has a default, so a JSON file only needs the fields it
//! changes. `{}` is a valid config (the portal preset).

use crate::camera::{Camera, MAX_PIXEL_DENSITY};
use crate::constellation::CoreStyle;
use crate::dissolve::DissolveParams;
use crate::error::ConfigError;
use crate::particles::{Shell, SuctionParams};
use crate::vortex::{TunnelParams, VortexParams};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Upper bound on any single population.
pub const MAX_PARTICLES: u32 = 1_000_000;

/// Which visual layers are built and drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layers {
    /// Suction particle field.
    pub particles: bool,
    /// Background tunnel conveyor.
    pub tunnel: bool,
    /// HUD spiral vortex.
    pub vortex: bool,
    /// Ambient drifting motes.
    pub drift: bool,
    /// Wireframe core and readout.
    pub core: bool,
    /// Orbiting labels.
    pub labels: bool,
    /// Dissolving solid.
    pub dissolve: bool,
}

impl Layers {
    /// No layers at all.
    pub const NONE: Self = Self {
        particles: false,
        tunnel: false,
        vortex: false,
        drift: false,
        core: false,
        labels: false,
        dissolve: false,
    };
}

impl Default for Layers {
    fn default() -> Self {
        Self {
            particles: true,
            tunnel: true,
            core: true,
            labels: true,
            ..Self::NONE
        }
    }
}

/// Complete description of a portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub layers: Layers,
    /// Suction field population.
    pub particle_count: u32,
    /// Tunnel population.
    pub tunnel_count: u32,
    /// Spiral vortex population.
    pub vortex_count: u32,
    /// Drift population.
    pub drift_count: u32,
    /// Spawn shell for the suction field.
    pub shell: Shell,
    /// Seed for every random attribute.
    pub seed: u64,
    /// Primary effect colour (linear RGB).
    pub color: Vec3,
    /// Core wireframe colour.
    pub core_color: Vec3,
    /// Clear colour.
    pub background: Vec3,
    /// Cap on the device pixel ratio.
    pub max_pixel_density: f32,
    pub camera: Camera,
    pub core_style: CoreStyle,
    pub suction: SuctionParams,
    pub tunnel: TunnelParams,
    pub vortex: VortexParams,
    pub dissolve: DissolveParams,
    /// Orbit labels supplied at mount time.
    pub labels: Vec<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            layers: Layers::default(),
            particle_count: 2000,
            tunnel_count: 3000,
            vortex_count: 200,
            drift_count: 100,
            shell: Shell::default(),
            seed: 0x5EED,
            color: hex_color(0x00ffff),
            core_color: hex_color(0xffd700),
            background: hex_color(0x02020a),
            max_pixel_density: MAX_PIXEL_DENSITY,
            camera: Camera::default(),
            core_style: CoreStyle::Constellation,
            suction: SuctionParams::default(),
            tunnel: TunnelParams::default(),
            vortex: VortexParams::default(),
            dissolve: DissolveParams::default(),
            labels: Vec::new(),
        }
    }
}

impl PortalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Presets ==========

    /// Suction field, tunnel, constellation core and orbiting labels.
    pub fn portal() -> Self {
        Self::default()
    }

    /// A solid materializing behind the dissolve seam.
    pub fn hologram() -> Self {
        Self {
            layers: Layers {
                dissolve: true,
                ..Layers::NONE
            },
            camera: Camera {
                position: Vec3::new(0.0, 0.0, 5.0),
                ..Camera::default()
            },
            ..Self::default()
        }
    }

    /// Data vortex around a pulsing HUD core.
    pub fn hud() -> Self {
        Self {
            layers: Layers {
                vortex: true,
                core: true,
                ..Layers::NONE
            },
            core_style: CoreStyle::Hud,
            core_color: hex_color(0x00ffff),
            camera: Camera {
                position: Vec3::new(0.0, 0.0, 15.0),
                ..Camera::default()
            },
            ..Self::default()
        }
    }

    /// Golden motes around a charging core.
    pub fn mascot() -> Self {
        Self {
            layers: Layers {
                drift: true,
                core: true,
                ..Layers::NONE
            },
            core_style: CoreStyle::Charge,
            color: hex_color(0x4fc3f7),
            camera: Camera {
                position: Vec3::new(0.0, 0.0, 5.0),
                fov_y_degrees: 50.0,
                ..Camera::default()
            },
            ..Self::default()
        }
    }

    /// Preset by name (`portal`, `hologram`, `hud`, `mascot`).
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "portal" => Some(Self::portal()),
            "hologram" => Some(Self::hologram()),
            "hud" => Some(Self::hud()),
            "mascot" => Some(Self::mascot()),
            _ => None,
        }
    }

    // ========== Builder ==========

    pub fn with_layers(mut self, layers: Layers) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_particle_count(mut self, count: u32) -> Self {
        self.particle_count = count;
        self
    }

    pub fn with_tunnel_count(mut self, count: u32) -> Self {
        self.tunnel_count = count;
        self
    }

    pub fn with_vortex_count(mut self, count: u32) -> Self {
        self.vortex_count = count;
        self
    }

    pub fn with_drift_count(mut self, count: u32) -> Self {
        self.drift_count = count;
        self
    }

    pub fn with_shell(mut self, min: f32, max: f32) -> Self {
        self.shell = Shell { min, max };
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    pub fn with_core_color(mut self, color: Vec3) -> Self {
        self.core_color = color;
        self
    }

    pub fn with_background(mut self, color: Vec3) -> Self {
        self.background = color;
        self
    }

    pub fn with_max_pixel_density(mut self, density: f32) -> Self {
        self.max_pixel_density = density;
        self
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_core_style(mut self, style: CoreStyle) -> Self {
        self.core_style = style;
        self
    }

    pub fn with_suction(mut self, params: SuctionParams) -> Self {
        self.suction = params;
        self
    }

    pub fn with_tunnel(mut self, params: TunnelParams) -> Self {
        self.tunnel = params;
        self
    }

    pub fn with_vortex(mut self, params: VortexParams) -> Self {
        self.vortex = params;
        self
    }

    pub fn with_dissolve(mut self, params: DissolveParams) -> Self {
        self.dissolve = params;
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    // ========== Loading ==========

    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every field the engine relies on.
    ///
    /// Zero particle counts and empty label lists are valid; they simply
    /// render nothing for that layer.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, count) in [
            ("particle_count", self.particle_count),
            ("tunnel_count", self.tunnel_count),
            ("vortex_count", self.vortex_count),
            ("drift_count", self.drift_count),
        ] {
            if count > MAX_PARTICLES {
                return Err(ConfigError::invalid(field, format!("{count} exceeds {MAX_PARTICLES}")));
            }
        }

        let s = &self.suction;
        if ![
            s.target_radius,
            s.target_jitter,
            s.target_jitter_frequency,
            s.spin,
            s.swirl,
            s.instability,
            s.point_size_scale,
            s.point_size_base,
        ]
        .iter()
        .all(|v| v.is_finite())
            || s.target_radius < 0.0
            || s.target_jitter < 0.0
        {
            return Err(ConfigError::invalid(
                "suction",
                "values must be finite, target radius and jitter non-negative",
            ));
        }

        // Particles only ever move inward, so the shell must enclose the target.
        let Shell { min, max } = self.shell;
        let floor = s.target_radius + s.target_jitter;
        if !(min.is_finite() && max.is_finite()) || min < floor || min > max {
            return Err(ConfigError::invalid(
                "shell",
                format!("need {floor} <= min <= max, got {min}..{max}"),
            ));
        }

        for (field, color) in [
            ("color", self.color),
            ("core_color", self.core_color),
            ("background", self.background),
        ] {
            if !color.is_finite() || color.min_element() < 0.0 {
                return Err(ConfigError::invalid(field, "components must be finite and non-negative"));
            }
        }

        if !self.max_pixel_density.is_finite() || self.max_pixel_density < 1.0 {
            return Err(ConfigError::invalid("max_pixel_density", "must be at least 1"));
        }

        let camera = &self.camera;
        if !(camera.fov_y_degrees > 0.0 && camera.fov_y_degrees < 180.0) {
            return Err(ConfigError::invalid("camera.fov_y_degrees", "must be in (0, 180)"));
        }
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(ConfigError::invalid("camera", "need 0 < near < far"));
        }
        if camera.position.distance_squared(camera.target) <= f32::EPSILON {
            return Err(ConfigError::invalid("camera", "position and target coincide"));
        }

        let t = &self.tunnel;
        if ![
            t.base_speed,
            t.suction_speed,
            t.near,
            t.far,
            t.spin,
            t.ring_min,
            t.ring_max,
            t.depth_spread,
            t.point_size,
            t.opacity,
        ]
        .iter()
        .all(|v| v.is_finite())
        {
            return Err(ConfigError::invalid("tunnel", "values must be finite"));
        }
        if !(t.near > t.far) {
            return Err(ConfigError::invalid("tunnel", "near must be greater than far"));
        }
        if t.ring_min > t.ring_max {
            return Err(ConfigError::invalid("tunnel", "ring_min must not exceed ring_max"));
        }

        let v = &self.vortex;
        let finite = [
            v.angular_rate,
            v.inward_rate,
            v.suction_gain,
            v.min_radius,
            v.respawn_min,
            v.respawn_max,
        ]
        .iter()
        .all(|x| x.is_finite());
        if !finite || !(v.min_radius >= 0.0 && v.respawn_min >= v.min_radius && v.respawn_max >= v.respawn_min) {
            return Err(ConfigError::invalid(
                "vortex",
                "need finite 0 <= min_radius <= respawn_min <= respawn_max",
            ));
        }

        let d = &self.dissolve;
        if !(d.smooth_time > 0.0) {
            return Err(ConfigError::invalid("dissolve.smooth_time", "must be positive"));
        }
        if !(d.edge_width > 0.0) {
            return Err(ConfigError::invalid("dissolve.edge_width", "must be positive"));
        }
        if d.detail > 32 {
            return Err(ConfigError::invalid("dissolve.detail", "at most 32"));
        }

        Ok(())
    }
}

/// Convert a `0xRRGGBB` value to a colour with components in `[0, 1]`.
pub fn hex_color(rgb: u32) -> Vec3 {
    Vec3::new(
        ((rgb >> 16) & 0xff) as f32 / 255.0,
        ((rgb >> 8) & 0xff) as f32 / 255.0,
        (rgb & 0xff) as f32 / 255.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        for name in ["portal", "hologram", "hud", "MASCOT"] {
            let config = PortalConfig::preset(name).unwrap();
            config.validate().unwrap();
        }
        assert!(PortalConfig::preset("nope").is_none());
    }

    #[test]
    fn test_preset_layers() {
        assert!(PortalConfig::hologram().layers.dissolve);
        assert!(!PortalConfig::hologram().layers.particles);
        assert_eq!(PortalConfig::hud().core_style, CoreStyle::Hud);
        assert!(PortalConfig::mascot().layers.drift);
    }

    #[test]
    fn test_empty_json_is_portal() {
        let config = PortalConfig::from_json("{}").unwrap();
        assert_eq!(config, PortalConfig::portal());
    }

    #[test]
    fn test_json_round_trip() {
        let config = PortalConfig::hud().with_seed(99).with_labels(["a", "b"]);
        let json = config.to_json().unwrap();
        assert_eq!(PortalConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_partial_json() {
        let config = PortalConfig::from_json(r#"{ "particle_count": 10, "core_style": "charge", "shell": { "max": 12.0 } }"#)
            .unwrap();
        assert_eq!(config.particle_count, 10);
        assert_eq!(config.core_style, CoreStyle::Charge);
        assert_eq!(config.shell, Shell { min: 4.0, max: 12.0 });
        assert_eq!(config.tunnel_count, 3000);
    }

    #[test]
    fn test_invalid_configs() {
        let bad_shell = PortalConfig::new().with_shell(10.0, 4.0);
        assert!(matches!(bad_shell.validate(), Err(ConfigError::Invalid { field: "shell", .. })));

        let bad_color = PortalConfig::new().with_color(Vec3::new(f32::NAN, 0.0, 0.0));
        assert!(bad_color.validate().is_err());

        let too_many = PortalConfig::new().with_particle_count(MAX_PARTICLES + 1);
        assert!(too_many.validate().is_err());

        let bad_density = PortalConfig::new().with_max_pixel_density(0.5);
        assert!(bad_density.validate().is_err());

        assert!(matches!(
            PortalConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_shell_must_enclose_suction_target() {
        // Inside the target ring the suction ease would push particles outward.
        let inside = PortalConfig::new().with_shell(0.0, 1.0);
        assert!(matches!(inside.validate(), Err(ConfigError::Invalid { field: "shell", .. })));

        let straddling = PortalConfig::new().with_shell(1.25, 8.0);
        assert!(straddling.validate().is_err());

        let enclosing = PortalConfig::new().with_shell(1.5, 8.0);
        assert!(enclosing.validate().is_ok());

        let wider_target = PortalConfig::new().with_suction(SuctionParams {
            target_radius: 4.5,
            ..SuctionParams::default()
        });
        assert!(matches!(wider_target.validate(), Err(ConfigError::Invalid { field: "shell", .. })));
    }

    #[test]
    fn test_non_finite_params_rejected() {
        assert!(PortalConfig::new().with_shell(4.0, f32::INFINITY).validate().is_err());

        let tunnel = PortalConfig::new().with_tunnel(TunnelParams {
            ring_max: f32::NAN,
            ..TunnelParams::default()
        });
        assert!(matches!(tunnel.validate(), Err(ConfigError::Invalid { field: "tunnel", .. })));

        let vortex = PortalConfig::new().with_vortex(VortexParams {
            min_radius: f32::NAN,
            ..VortexParams::default()
        });
        assert!(matches!(vortex.validate(), Err(ConfigError::Invalid { field: "vortex", .. })));

        let suction = PortalConfig::new().with_suction(SuctionParams {
            swirl: f32::INFINITY,
            ..SuctionParams::default()
        });
        assert!(matches!(suction.validate(), Err(ConfigError::Invalid { field: "suction", .. })));
    }

    #[test]
    fn test_zero_counts_are_valid() {
        let config = PortalConfig::new()
            .with_particle_count(0)
            .with_tunnel_count(0)
            .with_labels(Vec::<String>::new());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color(0x00ffff), Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(hex_color(0xff0000), Vec3::X);
    }

    #[test]
    fn test_missing_file() {
        let err = PortalConfig::from_json_file("/nonexistent/portal.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
