//! Vantage Animation System
//!
//! Scroll observers, keyframe tweens and lifetime-bound animation scopes.
//!
//! # Features
//!
//! - **Scroll Observers**: Map a scroll container's offset to normalized progress
//!   inside an enter/leave window, with enter/leave edge events
//! - **Tweens**: Time- or progress-driven interpolation of named numeric fields on
//!   any [`Animatable`] target, mutated in place
//! - **Keyframes**: Ordered `{to, easing, duration}` steps per field
//! - **Sync Modes**: Continuous scrubbing, smoothed scrubbing, or discrete
//!   playback actions on enter/leave
//! - **Scopes**: Registries of tweens, observers and methods, revertible as a unit

pub mod easing;
pub mod keyframe;
pub mod scheduler;
pub mod scope;
pub mod scroll;
pub mod spring;
pub mod target;
pub mod tween;

pub use easing::Easing;
pub use keyframe::{FieldSpec, FieldTrack, KeyframeStep};
pub use scheduler::{AnimationScheduler, ObserverId, SchedulerHandle, TweenId};
pub use scope::{AnimationScope, RootId, ScopeContext, ScopeMethod};
pub use scroll::{
    window_progress, Axis, Boundary, EdgePosition, ListenerId, ObserverActions,
    ObserverCallbacks, PlayDirection, ScrollCallback, ScrollContainer, ScrollEvent,
    ScrollListener, ScrollNotice, ScrollObserver, ScrollWindow, SyncMode, TargetSpan,
};
pub use spring::SpringConfig;
pub use target::{target_key, Animatable, ProgressCell, SharedTarget};
pub use tween::{Autoplay, LoopMode, PlaybackAction, PlaybackState, ScrollBinding, Tween, TweenSpec};
