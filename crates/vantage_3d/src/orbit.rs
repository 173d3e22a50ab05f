//! Orbit camera controller
//!
//! Orbits around a target point, similar to 3D modeling software. The
//! controller does not own the camera: every [`OrbitController::update`]
//! reads the camera's current position, applies pending pointer input and
//! distance limits, then points the camera back at the target.

use crate::camera::RigCamera;
use std::f32::consts::PI;
use vantage_core::Vec3;

/// Orbit camera controller
///
/// # Example
///
/// ```ignore
/// let mut orbit = OrbitController::new(Vec3::ZERO);
/// orbit.min_distance = 3.0;
/// orbit.max_distance = 20.0;
/// orbit.zoom_enabled = false;
/// orbit.update(&mut camera);
/// ```
#[derive(Clone, Debug)]
pub struct OrbitController {
    /// Target point to orbit around
    pub target: Vec3,

    /// Minimum distance from target
    pub min_distance: f32,
    /// Maximum distance from target
    pub max_distance: f32,
    /// Minimum elevation angle (radians)
    pub min_elevation: f32,
    /// Maximum elevation angle (radians)
    pub max_elevation: f32,

    /// Rotation sensitivity (radians per pixel)
    pub rotation_speed: f32,
    /// Zoom sensitivity (fraction of distance per scroll unit)
    pub zoom_speed: f32,
    /// Share of pending input carried to the next update (0 = instant)
    pub damping: f32,

    /// Enable rotation
    pub rotate_enabled: bool,
    /// Enable zooming
    pub zoom_enabled: bool,

    enabled: bool,

    pending_azimuth: f32,
    pending_elevation: f32,
    pending_zoom: f32,
}

impl OrbitController {
    /// Create a new orbit controller
    pub fn new(target: Vec3) -> Self {
        Self {
            target,

            min_distance: 0.1,
            max_distance: 1000.0,
            min_elevation: -PI * 0.45,
            max_elevation: PI * 0.45,

            rotation_speed: 0.005,
            zoom_speed: 0.1,
            damping: 0.0,

            rotate_enabled: true,
            zoom_enabled: true,

            enabled: true,

            pending_azimuth: 0.0,
            pending_elevation: 0.0,
            pending_zoom: 0.0,
        }
    }

    /// Set distance limits
    pub fn with_distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max.max(min);
        self
    }

    /// Queue a pointer drag in pixels
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        if !self.rotate_enabled {
            return;
        }
        self.pending_azimuth -= dx * self.rotation_speed;
        self.pending_elevation += dy * self.rotation_speed;
    }

    /// Queue a scroll-wheel zoom; positive moves closer
    pub fn zoom(&mut self, scroll_delta: f32) {
        if !self.zoom_enabled {
            return;
        }
        self.pending_zoom += scroll_delta * self.zoom_speed;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Apply pending input and constraints, then look at the target
    ///
    /// Returns false when the controller is disabled.
    pub fn update(&mut self, camera: &mut dyn RigCamera) -> bool {
        if !self.enabled {
            return false;
        }

        let offset = camera.position() - self.target;
        let mut distance = offset.length();
        let (mut azimuth, mut elevation) = if distance > 1e-6 {
            (offset.x.atan2(offset.z), (offset.y / distance).clamp(-1.0, 1.0).asin())
        } else {
            distance = self.min_distance;
            (0.0, 0.0)
        };

        let keep = self.damping.clamp(0.0, 0.99);
        let step = 1.0 - keep;
        azimuth += self.pending_azimuth * step;
        elevation += self.pending_elevation * step;
        distance -= self.pending_zoom * step * distance;
        self.pending_azimuth *= keep;
        self.pending_elevation *= keep;
        self.pending_zoom *= keep;
        if self.pending_azimuth.abs() < 1e-6 {
            self.pending_azimuth = 0.0;
        }
        if self.pending_elevation.abs() < 1e-6 {
            self.pending_elevation = 0.0;
        }
        if self.pending_zoom.abs() < 1e-6 {
            self.pending_zoom = 0.0;
        }

        let elevation = elevation.clamp(self.min_elevation, self.max_elevation);
        let distance = distance.clamp(self.min_distance, self.max_distance);

        let (sin_elev, cos_elev) = elevation.sin_cos();
        let (sin_azim, cos_azim) = azimuth.sin_cos();
        camera.set_position(Vec3::new(
            self.target.x + distance * cos_elev * sin_azim,
            self.target.y + distance * sin_elev,
            self.target.z + distance * cos_elev * cos_azim,
        ));
        camera.look_at(self.target);
        true
    }
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PerspectiveCamera;

    fn camera_at(position: Vec3) -> PerspectiveCamera {
        PerspectiveCamera::default().with_position(position)
    }

    #[test]
    fn test_update_keeps_distance_and_looks_at_target() {
        let mut orbit = OrbitController::new(Vec3::ZERO).with_distance_limits(3.0, 20.0);
        let mut camera = camera_at(Vec3::new(0.0, 0.0, 6.0));
        assert!(orbit.update(&mut camera));
        assert!(camera.position.approx_eq(Vec3::new(0.0, 0.0, 6.0), 1e-4));
        assert!(camera.forward().approx_eq(Vec3::new(0.0, 0.0, -1.0), 1e-4));
    }

    #[test]
    fn test_distance_is_clamped() {
        let mut orbit = OrbitController::new(Vec3::ZERO).with_distance_limits(3.0, 20.0);
        let mut camera = camera_at(Vec3::new(0.0, 0.0, 1.0));
        orbit.update(&mut camera);
        assert!((camera.position.length() - 3.0).abs() < 1e-4);

        camera.position = Vec3::new(0.0, 40.0, 0.0);
        orbit.update(&mut camera);
        assert!(camera.position.length() <= 20.0 + 1e-4);
    }

    #[test]
    fn test_pointer_rotation_orbits_and_clamps_elevation() {
        let mut orbit = OrbitController::new(Vec3::ZERO);
        let mut camera = camera_at(Vec3::new(0.0, 0.0, 6.0));

        orbit.rotate(100.0, 0.0);
        orbit.update(&mut camera);
        assert!((camera.position.length() - 6.0).abs() < 1e-4);
        assert!((camera.position.x - 6.0 * (-0.5f32).sin()).abs() < 1e-4);

        orbit.rotate(0.0, 10_000.0);
        orbit.update(&mut camera);
        let max_y = 6.0 * (PI * 0.45).sin();
        assert!((camera.position.y - max_y).abs() < 1e-3);
    }

    #[test]
    fn test_zoom_respects_enable_flag() {
        let mut orbit = OrbitController::new(Vec3::ZERO);
        orbit.zoom_enabled = false;
        let mut camera = camera_at(Vec3::new(0.0, 0.0, 6.0));
        orbit.zoom(5.0);
        orbit.update(&mut camera);
        assert!((camera.position.length() - 6.0).abs() < 1e-4);

        orbit.zoom_enabled = true;
        orbit.zoom(1.0);
        orbit.update(&mut camera);
        assert!((camera.position.length() - 5.4).abs() < 1e-4);
    }

    #[test]
    fn test_disabled_controller_is_inert() {
        let mut orbit = OrbitController::new(Vec3::ZERO);
        orbit.set_enabled(false);
        let mut camera = camera_at(Vec3::new(0.0, 0.0, 1.0));
        assert!(!orbit.update(&mut camera));
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 1.0));
    }
}
