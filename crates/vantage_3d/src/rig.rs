//! Camera rig
//!
//! Applies the logical [`CameraState`] to a render camera once per frame:
//! exponential smoothing toward the desired position, field-of-view sync,
//! look-at (directly or through an [`OrbitController`]) and an optional
//! relative rotation on top of the look-at orientation.
//!
//! The rig keeps its working vectors as fields and mutates them in place, so
//! a frame performs no allocation.

use crate::camera::RigCamera;
use crate::camera_state::{CameraState, SharedCameraState};
use crate::orbit::OrbitController;
use serde::{Deserialize, Serialize};
use vantage_core::{Quat, Vec3};

/// Smoothing factor used by the observed behavior
pub const DEFAULT_ALPHA: f32 = 0.15;

/// Frame duration the time-normalized factor is calibrated against (60 Hz)
pub const DEFAULT_REFERENCE_FRAME_MS: f32 = 1000.0 / 60.0;

/// How the interpolation factor is derived each frame
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Smoothing {
    /// Constant factor per frame; convergence speed depends on frame rate
    PerFrame { alpha: f32 },
    /// `1 - (1 - alpha)^(dt / reference_frame_ms)`
    TimeNormalized { alpha: f32, reference_frame_ms: f32 },
}

impl Default for Smoothing {
    fn default() -> Self {
        Smoothing::PerFrame {
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl Smoothing {
    /// Interpolation factor for a frame of `dt_ms`
    pub fn factor(&self, dt_ms: f32) -> f32 {
        match *self {
            Smoothing::PerFrame { alpha } => alpha.clamp(0.0, 1.0),
            Smoothing::TimeNormalized {
                alpha,
                reference_frame_ms,
            } => {
                let alpha = alpha.clamp(0.0, 1.0);
                if reference_frame_ms <= 0.0 || !dt_ms.is_finite() || dt_ms <= 0.0 {
                    return if dt_ms > 0.0 { alpha } else { 0.0 };
                }
                1.0 - (1.0 - alpha).powf(dt_ms / reference_frame_ms)
            }
        }
    }
}

/// Rig state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RigState {
    /// No live camera state to follow
    Idle,
    /// Following the attached camera state
    Tracking,
}

/// Per-frame camera rig
#[derive(Debug)]
pub struct CameraRig {
    source: Option<SharedCameraState>,
    smoothing: Smoothing,
    state: RigState,
    snapshot: CameraState,
    desired_position: Vec3,
    desired_target: Vec3,
    base_orientation: Quat,
    frames: u64,
}

impl CameraRig {
    pub fn new(smoothing: Smoothing) -> Self {
        Self {
            source: None,
            smoothing,
            state: RigState::Idle,
            snapshot: CameraState::default(),
            desired_position: Vec3::ZERO,
            desired_target: Vec3::ZERO,
            base_orientation: Quat::IDENTITY,
            frames: 0,
        }
    }

    /// Start following `source`
    pub fn attach(&mut self, source: SharedCameraState) {
        self.source = Some(source);
    }

    /// Stop following; the rig goes idle
    pub fn detach(&mut self) {
        self.source = None;
        self.state = RigState::Idle;
    }

    pub fn state(&self) -> RigState {
        self.state
    }

    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    pub fn set_smoothing(&mut self, smoothing: Smoothing) {
        self.smoothing = smoothing;
    }

    /// The camera state read on the last tracked frame
    pub fn last_state(&self) -> &CameraState {
        &self.snapshot
    }

    /// Frames that reached a camera
    pub fn frames_applied(&self) -> u64 {
        self.frames
    }

    /// Run one frame
    ///
    /// A missing camera makes this frame a no-op; a missing camera state
    /// leaves the rig idle. Neither is an error.
    pub fn frame(
        &mut self,
        dt_ms: f32,
        camera: Option<&mut dyn RigCamera>,
        controls: Option<&mut OrbitController>,
    ) -> RigState {
        let Some(source) = self.source.as_ref() else {
            self.state = RigState::Idle;
            return self.state;
        };
        match source.lock() {
            Ok(state) => self.snapshot = *state,
            Err(_) => {
                self.state = RigState::Idle;
                return self.state;
            }
        }
        self.state = RigState::Tracking;

        let Some(camera) = camera else {
            return self.state;
        };

        let s = &self.snapshot;
        self.desired_position.set(s.x, s.y, s.z);
        self.desired_target.set(s.tx, s.ty, s.tz);
        let alpha = self.smoothing.factor(dt_ms);

        let mut position = camera.position();
        position.lerp_toward(self.desired_position, alpha);
        camera.set_position(position);

        if camera.fov() != s.fov {
            camera.set_fov(s.fov);
        }

        match controls {
            Some(controls) => {
                controls.target.lerp_toward(self.desired_target, alpha);
                controls.update(&mut *camera);
            }
            None => camera.look_at(self.desired_target),
        }

        if let Some(euler) = s.relative_rotation() {
            self.base_orientation = camera.orientation();
            camera.set_orientation(
                self.base_orientation * Quat::from_euler_yxz(euler.x, euler.y, euler.z),
            );
        }

        self.frames += 1;
        self.state
    }
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new(Smoothing::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PerspectiveCamera;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(55.0, 1.0, 0.1, 1000.0).with_position(Vec3::new(0.0, 0.0, 6.0))
    }

    #[test]
    fn test_idle_until_state_attached() {
        let mut rig = CameraRig::default();
        let mut cam = camera();
        assert_eq!(rig.frame(16.0, Some(&mut cam), None), RigState::Idle);
        assert_eq!(cam.position, Vec3::new(0.0, 0.0, 6.0));

        rig.attach(CameraState::default().shared());
        assert_eq!(rig.frame(16.0, Some(&mut cam), None), RigState::Tracking);
        rig.detach();
        assert_eq!(rig.state(), RigState::Idle);
    }

    #[test]
    fn test_missing_camera_skips_only_that_frame() {
        let mut rig = CameraRig::default();
        let state = CameraState::new(Vec3::new(0.0, 0.0, 2.0), Vec3::ZERO, 55.0).shared();
        rig.attach(state);
        assert_eq!(rig.frame(16.0, None, None), RigState::Tracking);
        assert_eq!(rig.frames_applied(), 0);

        let mut cam = camera();
        rig.frame(16.0, Some(&mut cam), None);
        assert_eq!(rig.frames_applied(), 1);
        assert!(cam.position.z < 6.0);
    }

    #[test]
    fn test_converges_to_constant_target() {
        let mut rig = CameraRig::default();
        let target = Vec3::new(1.0, 2.0, 0.0);
        rig.attach(CameraState::new(target, Vec3::ZERO, 55.0).shared());
        let mut cam = camera();
        let initial = cam.position.distance(target);
        // 0.85^n < 1e-3 once n >= 43
        for _ in 0..43 {
            rig.frame(16.0, Some(&mut cam), None);
        }
        assert!(cam.position.distance(target) < 1e-3 * initial);
    }

    #[test]
    fn test_fov_assigned_when_changed() {
        let mut rig = CameraRig::default();
        let state = CameraState::default().shared();
        rig.attach(state.clone());
        let mut cam = camera();
        let updates = cam.projection_updates();
        rig.frame(16.0, Some(&mut cam), None);
        assert_eq!(cam.projection_updates(), updates);

        state.lock().unwrap().fov = 65.0;
        rig.frame(16.0, Some(&mut cam), None);
        assert_eq!(cam.fov(), 65.0);
        assert_eq!(cam.projection_updates(), updates + 1);
    }

    #[test]
    fn test_controls_target_follows_look_at() {
        let mut rig = CameraRig::default();
        let state = CameraState::new(Vec3::new(0.0, 0.0, 6.0), Vec3::new(2.0, 0.0, 0.0), 55.0);
        rig.attach(state.shared());
        let mut cam = camera();
        let mut orbit = OrbitController::new(Vec3::ZERO).with_distance_limits(3.0, 20.0);
        rig.frame(16.0, Some(&mut cam), Some(&mut orbit));
        assert!((orbit.target.x - 0.3).abs() < 1e-5);
        let to_target = (orbit.target - cam.position).normalize();
        assert!(cam.forward().approx_eq(to_target, 1e-4));
    }

    #[test]
    fn test_relative_rotation_composes_on_look_at() {
        let mut rig = CameraRig::default();
        let state = CameraState::default().with_rotation(0.0, std::f32::consts::FRAC_PI_2, 0.0);
        rig.attach(state.shared());
        let mut cam = camera();
        rig.frame(16.0, Some(&mut cam), None);
        // Base looks down -Z; a quarter yaw turns it to -X
        assert!(cam.forward().approx_eq(Vec3::new(-1.0, 0.0, 0.0), 1e-4));
    }

    #[test]
    fn test_time_normalized_factor() {
        let smoothing = Smoothing::TimeNormalized {
            alpha: 0.15,
            reference_frame_ms: DEFAULT_REFERENCE_FRAME_MS,
        };
        assert!((smoothing.factor(DEFAULT_REFERENCE_FRAME_MS) - 0.15).abs() < 1e-5);
        // Two half-length frames equal one reference frame
        let half = smoothing.factor(DEFAULT_REFERENCE_FRAME_MS / 2.0);
        let combined = 1.0 - (1.0 - half) * (1.0 - half);
        assert!((combined - 0.15).abs() < 1e-5);
        assert_eq!(smoothing.factor(0.0), 0.0);
        assert_eq!(Smoothing::default().factor(100.0), DEFAULT_ALPHA);
    }
}
