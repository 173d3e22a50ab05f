//! Render camera

use vantage_core::{Mat4, Quat, Vec3};

/// The camera surface a rig drives
///
/// Implemented by [`PerspectiveCamera`]; external 3D hosts can implement it
/// for their own camera objects.
pub trait RigCamera: Send {
    fn position(&self) -> Vec3;

    fn set_position(&mut self, position: Vec3);

    /// Vertical field of view in degrees
    fn fov(&self) -> f32;

    /// Set the field of view in degrees and recompute the projection
    fn set_fov(&mut self, fov: f32);

    fn orientation(&self) -> Quat;

    fn set_orientation(&mut self, orientation: Quat);

    /// Orient the camera so its forward axis points at `target`
    fn look_at(&mut self, target: Vec3) {
        let direction = target - self.position();
        if direction.length_squared() < 1e-12 {
            return;
        }
        self.set_orientation(Quat::look_rotation(direction.normalize(), Vec3::UP));
    }
}

/// Perspective camera for 3D rendering
///
/// Uses a frustum-based projection with a vertical field of view in degrees.
#[derive(Clone, Debug)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub orientation: Quat,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Near clipping plane distance
    pub near: f32,
    /// Far clipping plane distance
    pub far: f32,
    fov: f32,
    projection: Mat4,
    projection_updates: u32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(55.0, 16.0 / 9.0, 0.1, 1000.0)
    }
}

impl PerspectiveCamera {
    /// Create a new perspective camera
    ///
    /// # Arguments
    /// * `fov` - Vertical field of view in degrees
    /// * `aspect` - Aspect ratio (width / height)
    /// * `near` - Near clipping plane
    /// * `far` - Far clipping plane
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            aspect,
            near,
            far,
            fov,
            projection: Mat4::IDENTITY,
            projection_updates: 0,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Set the initial position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set aspect ratio and recompute the projection
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_projection_matrix();
    }

    /// Recompute the projection matrix from fov, aspect and clip planes
    pub fn update_projection_matrix(&mut self) {
        self.projection =
            Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far);
        self.projection_updates += 1;
    }

    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection
    }

    /// How many times the projection has been recomputed
    pub fn projection_updates(&self) -> u32 {
        self.projection_updates
    }

    /// Direction the camera is facing
    pub fn forward(&self) -> Vec3 {
        self.orientation.rotate_vec3(Vec3::FORWARD)
    }
}

impl RigCamera for PerspectiveCamera {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn fov(&self) -> f32 {
        self.fov
    }

    fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
        self.update_projection_matrix();
    }

    fn orientation(&self) -> Quat {
        self.orientation
    }

    fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fov_change_recomputes_projection() {
        let mut camera = PerspectiveCamera::default();
        let before = *camera.projection_matrix();
        let updates = camera.projection_updates();
        camera.set_fov(65.0);
        assert_eq!(camera.projection_updates(), updates + 1);
        assert_ne!(before, *camera.projection_matrix());
    }

    #[test]
    fn test_look_at_points_forward_at_target() {
        let mut camera = PerspectiveCamera::default().with_position(Vec3::new(0.0, 0.0, 6.0));
        camera.look_at(Vec3::new(3.0, 0.0, 6.0));
        assert!(camera.forward().approx_eq(Vec3::new(1.0, 0.0, 0.0), 1e-5));

        let orientation = camera.orientation;
        camera.look_at(camera.position);
        assert_eq!(camera.orientation, orientation);
    }
}
