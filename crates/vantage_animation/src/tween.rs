//! Tweens
//!
//! A tween owns one [`FieldTrack`] per animated field of a shared target and
//! writes sampled values straight into that target. It advances either over
//! time (scheduler ticks) or by explicit seeks from a scroll observer, which
//! is what makes scroll-driven playback scrubbable in both directions.

use crate::easing::Easing;
use crate::keyframe::{FieldSpec, FieldTrack};
use crate::scroll::{ObserverCallbacks, ScrollContainer, ScrollWindow, SyncMode};
use crate::target::{target_key, SharedTarget};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use vantage_core::{Result, VantageError};

/// How many times a time-driven tween runs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopMode {
    #[default]
    Once,
    /// Total number of iterations
    Count(u32),
    Infinite,
}

/// Playback state of a tween
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    /// Registered but never played
    Idle,
    Playing,
    Paused,
    Completed,
}

/// Discrete playback control
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackAction {
    /// Play forward from the current position
    Play,
    Pause,
    /// Continue in the current direction
    Resume,
    /// Play backward from the current position
    Reverse,
    /// Jump to the start and play forward
    Restart,
    /// Jump to the start and pause
    Reset,
    /// Jump to the end
    Complete,
    /// Flip the current direction and play
    Alternate,
    None,
}

impl FromStr for PlaybackAction {
    type Err = VantageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "play" => Ok(PlaybackAction::Play),
            "pause" => Ok(PlaybackAction::Pause),
            "resume" => Ok(PlaybackAction::Resume),
            "reverse" => Ok(PlaybackAction::Reverse),
            "restart" => Ok(PlaybackAction::Restart),
            "reset" => Ok(PlaybackAction::Reset),
            "complete" => Ok(PlaybackAction::Complete),
            "alternate" => Ok(PlaybackAction::Alternate),
            "none" => Ok(PlaybackAction::None),
            other => Err(VantageError::InvalidAction(other.to_string())),
        }
    }
}

/// Ties a tween to a scroll observer
#[derive(Clone)]
pub struct ScrollBinding {
    pub container: Arc<dyn ScrollContainer>,
    pub window: ScrollWindow,
    pub sync: SyncMode,
    pub callbacks: ObserverCallbacks,
    /// Log every recomputation at debug level
    pub debug: bool,
}

impl ScrollBinding {
    pub fn new(container: Arc<dyn ScrollContainer>, window: ScrollWindow) -> Self {
        Self {
            container,
            window,
            sync: SyncMode::Continuous,
            callbacks: ObserverCallbacks::default(),
            debug: false,
        }
    }

    pub fn sync(mut self, sync: SyncMode) -> Self {
        self.sync = sync;
        self
    }

    pub fn callbacks(mut self, callbacks: ObserverCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl fmt::Debug for ScrollBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollBinding")
            .field("window", &self.window)
            .field("sync", &self.sync)
            .field("callbacks", &self.callbacks)
            .field("debug", &self.debug)
            .finish()
    }
}

/// What drives a tween after registration
#[derive(Clone, Debug, Default)]
pub enum Autoplay {
    /// Start playing immediately
    #[default]
    Play,
    /// Wait for an explicit playback action
    Paused,
    /// Follow a scroll observer
    Scroll(ScrollBinding),
}

/// Declarative description of a tween
#[derive(Clone, Debug)]
pub struct TweenSpec {
    pub fields: Vec<(String, FieldSpec)>,
    pub duration_ms: f32,
    pub delay_ms: f32,
    pub easing: Easing,
    pub loop_mode: LoopMode,
    /// Flip direction on every loop
    pub alternate: bool,
    pub autoplay: Autoplay,
}

impl Default for TweenSpec {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            duration_ms: 1000.0,
            delay_ms: 0.0,
            easing: Easing::default(),
            loop_mode: LoopMode::Once,
            alternate: false,
            autoplay: Autoplay::Play,
        }
    }
}

impl TweenSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.push((name.into(), spec));
        self
    }

    pub fn duration(mut self, duration_ms: f32) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn delay(mut self, delay_ms: f32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn repeat(mut self, loop_mode: LoopMode) -> Self {
        self.loop_mode = loop_mode;
        self
    }

    pub fn alternate(mut self, alternate: bool) -> Self {
        self.alternate = alternate;
        self
    }

    pub fn paused(mut self) -> Self {
        self.autoplay = Autoplay::Paused;
        self
    }

    pub fn scroll(mut self, binding: ScrollBinding) -> Self {
        self.autoplay = Autoplay::Scroll(binding);
        self
    }

    /// Field names this tween writes
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }
}

/// A live tween bound to a target
pub struct Tween {
    target: SharedTarget,
    key: usize,
    tracks: SmallVec<[FieldTrack; 4]>,
    originals: SmallVec<[(String, Option<f32>); 4]>,
    duration_ms: f32,
    delay_ms: f32,
    delay_remaining: f32,
    loop_mode: LoopMode,
    alternate: bool,
    iteration: u32,
    backward: bool,
    progress: f32,
    state: PlaybackState,
}

impl Tween {
    /// Compile `spec` against the target's current values
    ///
    /// Fails on an empty or duplicated field list, unknown fields and
    /// malformed keyframes. A scroll-bound tween must have a positive
    /// duration to scrub through. Nothing is written to the target.
    pub fn new(target: SharedTarget, spec: &TweenSpec) -> Result<Self> {
        if spec.fields.is_empty() {
            return Err(VantageError::InvalidKeyframes(
                "tween has no fields".to_string(),
            ));
        }
        if !spec.delay_ms.is_finite() || spec.delay_ms < 0.0 {
            return Err(VantageError::InvalidKeyframes(format!(
                "invalid delay {}",
                spec.delay_ms
            )));
        }

        let mut tracks = SmallVec::new();
        let mut originals: SmallVec<[(String, Option<f32>); 4]> = SmallVec::new();
        {
            let guard = target
                .lock()
                .map_err(|_| VantageError::MissingReference("tween target".to_string()))?;
            for (field, field_spec) in &spec.fields {
                if originals.iter().any(|(name, _)| name == field) {
                    return Err(VantageError::InvalidKeyframes(format!(
                        "field '{}' listed twice",
                        field
                    )));
                }
                let current = guard.get_field(field).ok_or_else(|| {
                    VantageError::InvalidKeyframes(format!("target has no field '{}'", field))
                })?;
                tracks.push(FieldTrack::compile(
                    field,
                    field_spec,
                    current,
                    spec.duration_ms,
                    spec.easing,
                )?);
                originals.push((field.clone(), guard.is_field_set(field).then_some(current)));
            }
        }

        let duration_ms = tracks
            .iter()
            .map(FieldTrack::duration_ms)
            .fold(0.0_f32, f32::max);
        if matches!(spec.autoplay, Autoplay::Scroll(_)) && duration_ms <= 0.0 {
            return Err(VantageError::InvalidKeyframes(
                "scroll-bound tween has zero duration".to_string(),
            ));
        }

        let state = match spec.autoplay {
            Autoplay::Play => PlaybackState::Playing,
            Autoplay::Paused | Autoplay::Scroll(_) => PlaybackState::Idle,
        };

        Ok(Self {
            key: target_key(&target),
            target,
            tracks,
            originals,
            duration_ms,
            delay_ms: spec.delay_ms,
            delay_remaining: spec.delay_ms,
            loop_mode: spec.loop_mode,
            alternate: spec.alternate,
            iteration: 0,
            backward: false,
            progress: 0.0,
            state,
        })
    }

    /// Identity of the target this tween writes
    pub fn target_key(&self) -> usize {
        self.key
    }

    /// Names of the fields this tween writes
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.tracks.iter().map(FieldTrack::field)
    }

    pub fn duration_ms(&self) -> f32 {
        self.duration_ms
    }

    /// Position in the current iteration, 0..=1
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_backward(&self) -> bool {
        self.backward
    }

    /// Write the values for the current position into the target
    pub fn apply(&self) {
        let Ok(mut target) = self.target.lock() else {
            tracing::warn!("tween target lock poisoned, skipping write");
            return;
        };
        for track in &self.tracks {
            let value = if self.progress >= 1.0 {
                track.last_value()
            } else {
                track.sample(self.progress * self.duration_ms)
            };
            target.set_field(track.field(), value);
        }
    }

    /// Restore every field to the value it held at registration
    pub fn revert(&self) {
        let Ok(mut target) = self.target.lock() else {
            tracing::warn!("tween target lock poisoned, skipping revert");
            return;
        };
        for (field, value) in &self.originals {
            match value {
                Some(value) => target.set_field(field, *value),
                None => target.clear_field(field),
            };
        }
    }

    /// Jump to a normalized position and write it
    pub fn seek(&mut self, progress: f32) {
        self.progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        self.apply();
    }

    fn has_more_iterations(&self) -> bool {
        match self.loop_mode {
            LoopMode::Once => false,
            LoopMode::Count(n) => self.iteration + 1 < n,
            LoopMode::Infinite => true,
        }
    }

    /// Advance a playing tween by `dt_ms`; returns true while still playing
    pub fn tick(&mut self, dt_ms: f32) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        let mut dt = dt_ms.max(0.0);
        if self.delay_remaining > 0.0 {
            if dt < self.delay_remaining {
                self.delay_remaining -= dt;
                return true;
            }
            dt -= self.delay_remaining;
            self.delay_remaining = 0.0;
        }

        if self.duration_ms <= 0.0 {
            self.progress = if self.backward { 0.0 } else { 1.0 };
            self.state = PlaybackState::Completed;
            self.apply();
            return false;
        }

        let step = dt / self.duration_ms;
        let mut next = if self.backward {
            self.progress - step
        } else {
            self.progress + step
        };

        let overshoot = if self.backward { -next } else { next - 1.0 };
        if overshoot >= 0.0 {
            if self.has_more_iterations() {
                self.iteration += 1;
                let overshoot = overshoot.min(1.0);
                if self.alternate {
                    self.backward = !self.backward;
                }
                next = if self.backward {
                    1.0 - overshoot
                } else {
                    overshoot
                };
            } else {
                next = if self.backward { 0.0 } else { 1.0 };
                self.state = PlaybackState::Completed;
            }
        }

        self.progress = next;
        self.apply();
        self.state == PlaybackState::Playing
    }

    /// Apply a discrete playback action
    pub fn perform(&mut self, action: PlaybackAction) {
        match action {
            PlaybackAction::Play => {
                self.backward = false;
                self.state = PlaybackState::Playing;
            }
            PlaybackAction::Pause => {
                if self.state == PlaybackState::Playing {
                    self.state = PlaybackState::Paused;
                }
            }
            PlaybackAction::Resume => {
                if self.state != PlaybackState::Completed {
                    self.state = PlaybackState::Playing;
                }
            }
            PlaybackAction::Reverse => {
                self.backward = true;
                self.delay_remaining = 0.0;
                self.state = PlaybackState::Playing;
            }
            PlaybackAction::Restart => {
                self.backward = false;
                self.iteration = 0;
                self.delay_remaining = self.delay_ms;
                self.state = PlaybackState::Playing;
                self.seek(0.0);
            }
            PlaybackAction::Reset => {
                self.backward = false;
                self.iteration = 0;
                self.delay_remaining = self.delay_ms;
                self.state = PlaybackState::Paused;
                self.seek(0.0);
            }
            PlaybackAction::Complete => {
                self.backward = false;
                self.state = PlaybackState::Completed;
                self.seek(1.0);
            }
            PlaybackAction::Alternate => {
                self.backward = !self.backward;
                self.delay_remaining = 0.0;
                self.state = PlaybackState::Playing;
            }
            PlaybackAction::None => {}
        }
    }
}

impl fmt::Debug for Tween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tween")
            .field("fields", &self.fields().collect::<Vec<_>>())
            .field("duration_ms", &self.duration_ms)
            .field("progress", &self.progress)
            .field("state", &self.state)
            .field("backward", &self.backward)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::KeyframeStep;
    use crate::target::{Animatable, ProgressCell};
    use std::sync::Mutex;

    struct Pose {
        z: f32,
        fov: f32,
    }

    impl Animatable for Pose {
        fn get_field(&self, field: &str) -> Option<f32> {
            match field {
                "z" => Some(self.z),
                "fov" => Some(self.fov),
                _ => None,
            }
        }

        fn set_field(&mut self, field: &str, value: f32) -> bool {
            match field {
                "z" => self.z = value,
                "fov" => self.fov = value,
                _ => return false,
            }
            true
        }
    }

    fn linear(fields: &[(&str, FieldSpec)]) -> TweenSpec {
        let mut spec = TweenSpec::new().duration(100.0).easing(Easing::Linear);
        for (name, field) in fields {
            spec = spec.field(*name, field.clone());
        }
        spec
    }

    #[test]
    fn test_time_driven_tween_completes() {
        let cell = ProgressCell::shared(0.0);
        let mut tween = Tween::new(cell.clone(), &linear(&[("p", FieldSpec::between(0.0, 1.0))]))
            .unwrap();
        assert!(tween.is_playing());
        assert!(tween.tick(50.0));
        assert!((cell.lock().unwrap().p - 0.5).abs() < 1e-5);
        assert!(!tween.tick(60.0));
        assert_eq!(tween.state(), PlaybackState::Completed);
        assert_eq!(cell.lock().unwrap().p, 1.0);
    }

    #[test]
    fn test_delay_holds_start() {
        let cell = ProgressCell::shared(0.0);
        let spec = linear(&[("p", FieldSpec::between(0.0, 1.0))]).delay(50.0);
        let mut tween = Tween::new(cell.clone(), &spec).unwrap();
        tween.tick(40.0);
        assert_eq!(tween.progress(), 0.0);
        tween.tick(60.0);
        assert!((tween.progress() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_seek_scrubs_both_ways() {
        let pose = Arc::new(Mutex::new(Pose { z: 5.0, fov: 65.0 }));
        let spec = linear(&[("z", FieldSpec::to(0.0))]).paused();
        let mut tween = Tween::new(pose.clone(), &spec).unwrap();
        assert_eq!(tween.state(), PlaybackState::Idle);

        tween.seek(0.5);
        assert!((pose.lock().unwrap().z - 2.5).abs() < 1e-5);
        tween.seek(1.0);
        assert_eq!(pose.lock().unwrap().z, 0.0);
        tween.seek(0.0);
        assert_eq!(pose.lock().unwrap().z, 5.0);
        assert!(!tween.tick(16.0));
    }

    #[test]
    fn test_alternate_loop_returns_to_start() {
        let cell = ProgressCell::shared(0.0);
        let spec = linear(&[("p", FieldSpec::between(0.0, 1.0))])
            .repeat(LoopMode::Count(2))
            .alternate(true);
        let mut tween = Tween::new(cell.clone(), &spec).unwrap();
        tween.tick(100.0);
        assert!(tween.is_backward());
        assert!(tween.is_playing());
        tween.tick(50.0);
        assert!((cell.lock().unwrap().p - 0.5).abs() < 1e-5);
        tween.tick(100.0);
        assert_eq!(tween.state(), PlaybackState::Completed);
        assert_eq!(cell.lock().unwrap().p, 0.0);
    }

    #[test]
    fn test_infinite_loop_wraps() {
        let cell = ProgressCell::shared(0.0);
        let spec = linear(&[("p", FieldSpec::between(0.0, 1.0))]).repeat(LoopMode::Infinite);
        let mut tween = Tween::new(cell.clone(), &spec).unwrap();
        for _ in 0..10 {
            assert!(tween.tick(25.0));
        }
        assert!((tween.progress() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_playback_actions() {
        let cell = ProgressCell::shared(0.0);
        let spec = linear(&[("p", FieldSpec::between(0.0, 1.0))]).paused();
        let mut tween = Tween::new(cell.clone(), &spec).unwrap();

        tween.perform(PlaybackAction::Play);
        tween.tick(50.0);
        tween.perform(PlaybackAction::Pause);
        assert!(!tween.tick(50.0));
        assert!((tween.progress() - 0.5).abs() < 1e-5);

        tween.perform(PlaybackAction::Reverse);
        tween.tick(25.0);
        assert!((cell.lock().unwrap().p - 0.25).abs() < 1e-5);

        tween.perform(PlaybackAction::Complete);
        assert_eq!(cell.lock().unwrap().p, 1.0);
        assert_eq!(tween.state(), PlaybackState::Completed);

        tween.perform(PlaybackAction::Reset);
        assert_eq!(cell.lock().unwrap().p, 0.0);
        assert_eq!(tween.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_revert_restores_registration_values() {
        let pose = Arc::new(Mutex::new(Pose { z: 5.0, fov: 65.0 }));
        let spec = linear(&[
            ("z", FieldSpec::between(10.0, 0.0)),
            (
                "fov",
                FieldSpec::keyframes([KeyframeStep::to(40.0), KeyframeStep::to(50.0)]),
            ),
        ]);
        let mut tween = Tween::new(pose.clone(), &spec).unwrap();
        tween.tick(70.0);
        assert_ne!(pose.lock().unwrap().z, 5.0);
        tween.revert();
        let pose = pose.lock().unwrap();
        assert_eq!(pose.z, 5.0);
        assert_eq!(pose.fov, 65.0);
    }

    #[test]
    fn test_invalid_specs_rejected() {
        let pose = Arc::new(Mutex::new(Pose { z: 0.0, fov: 0.0 }));
        assert!(Tween::new(pose.clone(), &TweenSpec::new()).is_err());
        assert!(Tween::new(pose.clone(), &linear(&[("w", FieldSpec::to(1.0))])).is_err());
        assert!(Tween::new(
            pose.clone(),
            &linear(&[("z", FieldSpec::to(1.0)), ("z", FieldSpec::to(2.0))])
        )
        .is_err());
        assert!(Tween::new(pose, &linear(&[("z", FieldSpec::to(1.0))]).delay(-1.0)).is_err());
    }

    #[test]
    fn test_revert_clears_fields_that_were_unset() {
        struct Tilt {
            roll: Option<f32>,
        }

        impl Animatable for Tilt {
            fn get_field(&self, field: &str) -> Option<f32> {
                (field == "roll").then(|| self.roll.unwrap_or(0.0))
            }

            fn set_field(&mut self, field: &str, value: f32) -> bool {
                if field == "roll" {
                    self.roll = Some(value);
                }
                field == "roll"
            }

            fn is_field_set(&self, field: &str) -> bool {
                field == "roll" && self.roll.is_some()
            }

            fn clear_field(&mut self, field: &str) -> bool {
                if field == "roll" {
                    self.roll = None;
                }
                field == "roll"
            }
        }

        let tilt = Arc::new(Mutex::new(Tilt { roll: None }));
        let mut tween = Tween::new(tilt.clone(), &linear(&[("roll", FieldSpec::to(0.5))])).unwrap();
        tween.tick(50.0);
        assert_eq!(tilt.lock().unwrap().roll, Some(0.25));
        tween.revert();
        assert_eq!(tilt.lock().unwrap().roll, None);

        tilt.lock().unwrap().roll = Some(0.1);
        let mut tween = Tween::new(tilt.clone(), &linear(&[("roll", FieldSpec::to(0.5))])).unwrap();
        tween.seek(1.0);
        tween.revert();
        assert_eq!(tilt.lock().unwrap().roll, Some(0.1));
    }

    #[test]
    fn test_scroll_bound_tween_needs_duration() {
        use crate::scroll::tests::TestContainer;

        let container = TestContainer::new(1000.0, 3000.0);
        let binding = || {
            ScrollBinding::new(
                container.clone(),
                ScrollWindow::parse("top top", "bottom bottom").unwrap(),
            )
        };
        let cell = ProgressCell::shared(0.0);
        let flat = TweenSpec::new()
            .field("p", FieldSpec::between(0.0, 1.0))
            .duration(0.0)
            .scroll(binding());
        assert!(matches!(
            Tween::new(cell.clone(), &flat),
            Err(VantageError::InvalidKeyframes(_))
        ));
        assert_eq!(cell.lock().unwrap().p, 0.0);

        let timed = TweenSpec::new()
            .field("p", FieldSpec::between(0.0, 1.0))
            .easing(Easing::Linear)
            .scroll(binding());
        let mut tween = Tween::new(cell.clone(), &timed).unwrap();
        tween.seek(0.5);
        assert!((cell.lock().unwrap().p - 0.5).abs() < 1e-5);

        // Zero-length time-driven tweens still jump to the end
        let snap = linear(&[("p", FieldSpec::between(0.0, 1.0))]).duration(0.0);
        let mut tween = Tween::new(cell.clone(), &snap).unwrap();
        assert!(!tween.tick(16.0));
        assert_eq!(cell.lock().unwrap().p, 1.0);
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("reverse".parse::<PlaybackAction>().unwrap(), PlaybackAction::Reverse);
        assert_eq!("none".parse::<PlaybackAction>().unwrap(), PlaybackAction::None);
        assert!("rewind".parse::<PlaybackAction>().is_err());
    }
}
