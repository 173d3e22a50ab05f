//! Animatable targets
//!
//! A tween writes named numeric fields on a shared target. Targets are held
//! behind `Arc<Mutex<..>>` so the writer (a tween) and any reader (a per-frame
//! callback) share one record that is mutated in place and never replaced.

use std::sync::{Arc, Mutex};

/// A bag of named numeric fields that tweens can read and write
pub trait Animatable: Send {
    /// Current value of `field`, or `None` if the target has no such field
    fn get_field(&self, field: &str) -> Option<f32>;

    /// Write `field`; returns `false` if the target has no such field
    fn set_field(&mut self, field: &str, value: f32) -> bool;

    /// Whether `field` holds an explicit value
    ///
    /// Optional fields read as a fallback while unset. A tween that writes
    /// one clears it again on revert instead of pinning the fallback.
    fn is_field_set(&self, field: &str) -> bool {
        self.get_field(field).is_some()
    }

    /// Return an optional field to its unset state
    fn clear_field(&mut self, _field: &str) -> bool {
        false
    }
}

/// A shared, type-erased animation target
pub type SharedTarget = Arc<Mutex<dyn Animatable>>;

/// Identity of a shared target, stable for the lifetime of the allocation
///
/// Used to detect two tweens writing the same field of the same target.
pub fn target_key(target: &SharedTarget) -> usize {
    Arc::as_ptr(target) as *const () as usize
}

/// A single progress value `{ p }`, the smallest useful tween target
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProgressCell {
    pub p: f32,
}

impl ProgressCell {
    pub fn new(p: f32) -> Self {
        Self { p }
    }

    /// Create a shared cell ready to hand to a tween
    pub fn shared(p: f32) -> Arc<Mutex<ProgressCell>> {
        Arc::new(Mutex::new(Self::new(p)))
    }
}

impl Animatable for ProgressCell {
    fn get_field(&self, field: &str) -> Option<f32> {
        (field == "p").then_some(self.p)
    }

    fn set_field(&mut self, field: &str, value: f32) -> bool {
        if field == "p" {
            self.p = value;
            true
        } else {
            false
        }
    }
}
