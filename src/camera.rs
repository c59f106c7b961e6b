//! Fixed perspective camera and viewport.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Upper bound for the device pixel density (high-DPI screens are capped at 2x).
pub const MAX_PIXEL_DENSITY: f32 = 2.0;

/// Perspective camera looking at the portal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// Eye position in world space.
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
}

impl Camera {
    /// Camera nine units in front of the focal point.
    pub fn new() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 9.0),
            target: Vec3::ZERO,
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 200.0,
        }
    }

    /// View matrix (right-handed, Y up).
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Projection matrix for the given aspect ratio.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_degrees.to_radians(), aspect, self.near, self.far)
    }

    /// Combined view-projection for a viewport.
    pub fn view_proj(&self, viewport: &Viewport) -> Mat4 {
        self.projection(viewport.aspect()) * self.view_matrix()
    }

    /// Distance in front of the camera along its view axis.
    ///
    /// Positive for points in front of the camera, zero or negative behind it.
    #[inline]
    pub fn view_depth(&self, point: Vec3) -> f32 {
        let forward = (self.target - self.position).normalize_or_zero();
        (point - self.position).dot(forward)
    }

    /// Logical pixels covered by one world unit at the given depth.
    pub fn pixels_per_unit(&self, depth: f32, viewport: &Viewport) -> f32 {
        if depth <= self.near {
            return 0.0;
        }
        let half_fov = (self.fov_y_degrees.to_radians() * 0.5).tan();
        viewport.height as f32 / (2.0 * half_fov * depth)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Drawing surface dimensions as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in logical pixels.
    pub width: u32,
    /// Height in logical pixels.
    pub height: u32,
    /// Device pixel ratio.
    pub pixel_density: f32,
}

impl Viewport {
    /// Create a viewport, sanitizing the pixel density into `[1, MAX_PIXEL_DENSITY]`.
    pub fn new(width: u32, height: u32, pixel_density: f32) -> Self {
        Self {
            width,
            height,
            pixel_density: sanitize_pixel_density(pixel_density, MAX_PIXEL_DENSITY),
        }
    }

    /// Width over height; 1.0 for a degenerate viewport.
    pub fn aspect(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }

    /// Whether there is anything to draw into.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720, 1.0)
    }
}

/// Clamp a reported device pixel ratio into `[1, max]`, mapping garbage to 1.
pub fn sanitize_pixel_density(density: f32, max: f32) -> f32 {
    if !density.is_finite() {
        return 1.0;
    }
    density.clamp(1.0, max.max(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_depth() {
        let camera = Camera::new();
        assert!((camera.view_depth(Vec3::ZERO) - 9.0).abs() < 1e-5);
        assert!(camera.view_depth(Vec3::new(0.0, 0.0, 10.0)) < 0.0);
    }

    #[test]
    fn test_view_depth_matches_view_matrix() {
        let camera = Camera::new();
        let p = Vec3::new(1.0, -2.0, 3.0);
        let view_z = camera.view_matrix().transform_point3(p).z;
        assert!((camera.view_depth(p) + view_z).abs() < 1e-4);
    }

    #[test]
    fn test_pixel_density_sanitized() {
        assert_eq!(Viewport::new(10, 10, f32::NAN).pixel_density, 1.0);
        assert_eq!(Viewport::new(10, 10, 3.0).pixel_density, 2.0);
        assert_eq!(Viewport::new(10, 10, 0.5).pixel_density, 1.0);
        assert_eq!(Viewport::new(10, 10, 1.5).pixel_density, 1.5);
    }

    #[test]
    fn test_degenerate_viewport_aspect() {
        let v = Viewport::new(0, 0, 1.0);
        assert!(v.is_empty());
        assert_eq!(v.aspect(), 1.0);
    }

    #[test]
    fn test_pixels_per_unit_shrinks_with_depth() {
        let camera = Camera::new();
        let viewport = Viewport::default();
        let near = camera.pixels_per_unit(5.0, &viewport);
        let far = camera.pixels_per_unit(10.0, &viewport);
        assert!(near > far);
        assert_eq!(camera.pixels_per_unit(-1.0, &viewport), 0.0);
    }
}
