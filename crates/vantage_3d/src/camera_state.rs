//! Camera state bag
//!
//! The single source of truth for the logical camera pose. Tweens write it,
//! the camera rig reads it once per frame.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use vantage_animation::Animatable;
use vantage_core::Vec3;

/// Shared camera state, written by one tween and read by the rig
pub type SharedCameraState = Arc<Mutex<CameraState>>;

/// Logical camera pose
///
/// `fov` is the vertical field of view in degrees. The optional `rx`/`ry`/`rz`
/// Euler angles (radians) describe a rotation applied on top of the look-at
/// orientation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub tx: f32,
    pub ty: f32,
    pub tz: f32,
    pub fov: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ry: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rz: Option<f32>,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 6.0,
            tx: 0.0,
            ty: 0.0,
            tz: 0.0,
            fov: 55.0,
            rx: None,
            ry: None,
            rz: None,
        }
    }
}

impl CameraState {
    /// Pose at `position` looking at `target`
    pub fn new(position: Vec3, target: Vec3, fov: f32) -> Self {
        Self {
            x: position.x,
            y: position.y,
            z: position.z,
            tx: target.x,
            ty: target.y,
            tz: target.z,
            fov,
            rx: None,
            ry: None,
            rz: None,
        }
    }

    pub fn with_rotation(mut self, rx: f32, ry: f32, rz: f32) -> Self {
        self.rx = Some(rx);
        self.ry = Some(ry);
        self.rz = Some(rz);
        self
    }

    /// Wrap in a shared handle
    pub fn shared(self) -> SharedCameraState {
        Arc::new(Mutex::new(self))
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn look_at(&self) -> Vec3 {
        Vec3::new(self.tx, self.ty, self.tz)
    }

    /// Relative rotation, present if any of `rx`/`ry`/`rz` is set
    pub fn relative_rotation(&self) -> Option<Vec3> {
        if self.rx.is_none() && self.ry.is_none() && self.rz.is_none() {
            return None;
        }
        Some(Vec3::new(
            self.rx.unwrap_or(0.0),
            self.ry.unwrap_or(0.0),
            self.rz.unwrap_or(0.0),
        ))
    }
}

impl Animatable for CameraState {
    fn get_field(&self, field: &str) -> Option<f32> {
        match field {
            "x" => Some(self.x),
            "y" => Some(self.y),
            "z" => Some(self.z),
            "tx" => Some(self.tx),
            "ty" => Some(self.ty),
            "tz" => Some(self.tz),
            "fov" => Some(self.fov),
            "rx" => Some(self.rx.unwrap_or(0.0)),
            "ry" => Some(self.ry.unwrap_or(0.0)),
            "rz" => Some(self.rz.unwrap_or(0.0)),
            _ => None,
        }
    }

    fn set_field(&mut self, field: &str, value: f32) -> bool {
        match field {
            "x" => self.x = value,
            "y" => self.y = value,
            "z" => self.z = value,
            "tx" => self.tx = value,
            "ty" => self.ty = value,
            "tz" => self.tz = value,
            "fov" => self.fov = value,
            "rx" => self.rx = Some(value),
            "ry" => self.ry = Some(value),
            "rz" => self.rz = Some(value),
            _ => return false,
        }
        true
    }

    fn is_field_set(&self, field: &str) -> bool {
        match field {
            "rx" => self.rx.is_some(),
            "ry" => self.ry.is_some(),
            "rz" => self.rz.is_some(),
            other => self.get_field(other).is_some(),
        }
    }

    fn clear_field(&mut self, field: &str) -> bool {
        match field {
            "rx" => self.rx = None,
            "ry" => self.ry = None,
            "rz" => self.rz = None,
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pose() {
        let state = CameraState::default();
        assert_eq!(state.position(), Vec3::new(0.0, 0.0, 6.0));
        assert_eq!(state.fov, 55.0);
        assert!(state.relative_rotation().is_none());
    }

    #[test]
    fn test_fields_roundtrip_through_animatable() {
        let mut state = CameraState::default();
        assert!(state.set_field("tz", -2.0));
        assert!(state.set_field("ry", 0.5));
        assert!(!state.set_field("w", 1.0));
        assert_eq!(state.get_field("tz"), Some(-2.0));
        assert_eq!(state.relative_rotation(), Some(Vec3::new(0.0, 0.5, 0.0)));
        assert_eq!(state.get_field("nope"), None);
    }

    #[test]
    fn test_reverted_tilt_returns_to_unset() {
        use vantage_animation::{AnimationScheduler, FieldSpec, TweenSpec};

        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let state = CameraState::default().shared();
        let spec = TweenSpec::new()
            .field("rx", FieldSpec::to(0.3))
            .field("z", FieldSpec::to(2.0))
            .duration(100.0);
        let id = handle.register_tween(state.clone(), spec).unwrap();
        scheduler.tick_ms(50.0);
        assert!(state.lock().unwrap().rx.is_some());

        assert!(handle.revert_tween(id));
        let state = state.lock().unwrap();
        assert!(state.rx.is_none());
        assert!(state.relative_rotation().is_none());
        assert_eq!(state.z, 6.0);
    }

    #[test]
    fn test_deserialize_partial() {
        let state: CameraState = serde_json::from_str(r#"{"z": 5.0, "fov": 65.0}"#).unwrap();
        assert_eq!(state.z, 5.0);
        assert_eq!(state.fov, 65.0);
        assert_eq!(state.x, 0.0);
        assert!(state.rx.is_none());
    }
}
