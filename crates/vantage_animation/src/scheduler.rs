//! Animation scheduler
//!
//! Owns every live tween and scroll observer. Time-driven tweens advance on
//! [`AnimationScheduler::tick`]; scroll-driven tweens are updated from the
//! container's listener as soon as the scroll offset changes, so progress is
//! always committed before the next frame reads animated values.
//!
//! Components never hold the scheduler itself. They get a [`SchedulerHandle`],
//! a weak reference that degrades to a no-op once the scheduler is dropped.

use crate::scroll::{
    ObserverCallbacks, ScrollCallback, ScrollEvent, ScrollListener, ScrollNotice, ScrollObserver,
    SyncMode,
};
use crate::target::{target_key, SharedTarget};
use crate::tween::{Autoplay, PlaybackAction, PlaybackState, ScrollBinding, Tween, TweenSpec};
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::sync::{Arc, Mutex, Weak};
use std::time::Instant;
use vantage_core::{Result, VantageError};

new_key_type! {
    /// Handle to a registered tween
    pub struct TweenId;
    /// Handle to a registered scroll observer
    pub struct ObserverId;
}

type Fired = SmallVec<[(ScrollCallback, ScrollEvent); 3]>;

/// Internal state of the animation scheduler
struct SchedulerInner {
    tweens: SlotMap<TweenId, Tween>,
    observers: SlotMap<ObserverId, ScrollObserver>,
    /// Current writer of each (target, field) pair
    writers: FxHashMap<(usize, String), TweenId>,
    /// Roots with a live animation scope
    live_roots: FxHashSet<u64>,
    last_frame: Instant,
}

impl SchedulerInner {
    fn new() -> Self {
        Self {
            tweens: SlotMap::with_key(),
            observers: SlotMap::with_key(),
            writers: FxHashMap::default(),
            live_roots: FxHashSet::default(),
            last_frame: Instant::now(),
        }
    }

    fn tick(&mut self, dt_ms: f32) -> bool {
        let SchedulerInner {
            tweens, observers, ..
        } = self;

        let mut smoothing = false;
        for (_, observer) in observers.iter_mut() {
            if let Some(progress) = observer.step_smoothing() {
                smoothing = true;
                if let Some(tween) = observer.tween().and_then(|id| tweens.get_mut(id)) {
                    tween.seek(progress);
                }
            }
        }

        let mut playing = false;
        for (_, tween) in tweens.iter_mut() {
            playing |= tween.tick(dt_ms);
        }
        playing || smoothing
    }

    fn has_active(&self) -> bool {
        self.tweens.values().any(Tween::is_playing)
            || self
                .observers
                .values()
                .any(|o| matches!(o.sync(), SyncMode::Smoothed(_)) && o.driven_progress() != o.progress())
    }

    /// Remove a tween, optionally restoring its fields, and drop its observers
    fn remove_tween(&mut self, id: TweenId, revert: bool) -> bool {
        let Some(tween) = self.tweens.remove(id) else {
            return false;
        };
        if revert {
            tween.revert();
        }
        self.writers.retain(|_, writer| *writer != id);

        let linked: SmallVec<[ObserverId; 1]> = self
            .observers
            .iter()
            .filter(|(_, o)| o.tween() == Some(id))
            .map(|(oid, _)| oid)
            .collect();
        for oid in linked {
            self.remove_observer(oid);
        }
        true
    }

    fn remove_observer(&mut self, id: ObserverId) -> bool {
        match self.observers.remove(id) {
            Some(mut observer) => {
                observer.detach();
                true
            }
            None => false,
        }
    }

    /// Recompute one observer and route the result to its tween
    fn handle_scroll(&mut self, id: ObserverId, notice: ScrollNotice) -> Fired {
        let SchedulerInner {
            tweens, observers, ..
        } = self;
        let Some(observer) = observers.get_mut(id) else {
            return Fired::new();
        };
        if notice == ScrollNotice::Resize {
            observer.refresh_bounds();
        }
        let events = observer.update();

        if let Some(tween) = observer.tween().and_then(|t| tweens.get_mut(t)) {
            match observer.sync() {
                SyncMode::Continuous => tween.seek(observer.progress()),
                SyncMode::Smoothed(_) => {}
                SyncMode::Actions(actions) => {
                    for event in events.iter().filter(|e| e.is_edge()) {
                        tween.perform(actions.for_event(event));
                    }
                }
            }
        }

        let callbacks = observer.callbacks();
        events
            .into_iter()
            .filter_map(|event| callbacks.for_event(&event).map(|cb| (cb, event)))
            .collect()
    }

    /// Insert and subscribe an observer, then bring it in sync with the container
    fn attach_observer(
        &mut self,
        weak: &Weak<Mutex<SchedulerInner>>,
        binding: ScrollBinding,
        tween: Option<TweenId>,
    ) -> (ObserverId, Fired) {
        let ScrollBinding {
            container,
            window,
            sync,
            callbacks,
            debug,
        } = binding;
        let observer = ScrollObserver::new(container.clone(), window, sync, callbacks, debug, tween);
        let id = self.observers.insert(observer);

        let listener = scroll_listener(weak.clone(), id);
        let listener_id = container.subscribe(listener);
        if let Some(observer) = self.observers.get_mut(id) {
            observer.set_listener(listener_id);
        }

        let fired = self.handle_scroll(id, ScrollNotice::Scroll);
        if let SyncMode::Smoothed(_) = sync {
            let driven = self.observers.get_mut(id).map(ScrollObserver::settle_driven);
            if let (Some(progress), Some(tween)) = (driven, tween.and_then(|t| self.tweens.get_mut(t))) {
                tween.seek(progress);
            }
        }
        (id, fired)
    }
}

/// Listener handed to a scroll container for one observer
fn scroll_listener(weak: Weak<Mutex<SchedulerInner>>, id: ObserverId) -> ScrollListener {
    Arc::new(move |notice| {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let fired = match inner.lock() {
            Ok(mut guard) => guard.handle_scroll(id, notice),
            Err(_) => {
                tracing::warn!("animation scheduler lock poisoned, dropping scroll notice");
                return;
            }
        };
        drop(inner);
        fire(fired);
    })
}

/// Invoke user callbacks with no scheduler lock held
fn fire(fired: Fired) {
    for (callback, event) in fired {
        callback(&event);
    }
}

/// The animation scheduler that ticks all active animations
///
/// Typically owned by the scene host and shared via [`SchedulerHandle`].
/// Dropping the scheduler unsubscribes every observer from its container.
pub struct AnimationScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner::new())),
        }
    }

    /// Get a handle to this scheduler for passing to components
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Tick all animations using wall-clock time since the previous tick
    ///
    /// Returns true if any animations are still active (need another tick).
    pub fn tick(&self) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        let now = Instant::now();
        let dt_ms = (now - inner.last_frame).as_secs_f32() * 1000.0;
        inner.last_frame = now;
        inner.tick(dt_ms)
    }

    /// Tick all animations by a fixed frame duration
    pub fn tick_ms(&self, dt_ms: f32) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        inner.last_frame = Instant::now();
        inner.tick(dt_ms)
    }

    /// Check if any animations are still active
    pub fn has_active_animations(&self) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.has_active())
            .unwrap_or(false)
    }

    /// Number of registered tweens
    pub fn tween_count(&self) -> usize {
        self.inner.lock().map(|i| i.tweens.len()).unwrap_or(0)
    }

    /// Number of registered scroll observers
    pub fn observer_count(&self) -> usize {
        self.inner.lock().map(|i| i.observers.len()).unwrap_or(0)
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AnimationScheduler {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.lock() {
            for (_, observer) in inner.observers.iter_mut() {
                observer.detach();
            }
        }
    }
}

/// A weak handle to the animation scheduler
///
/// This is passed to components that need to register animations.
/// It won't prevent the scheduler from being dropped.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<Mutex<SchedulerInner>>,
}

impl SchedulerHandle {
    fn with_inner<R>(&self, f: impl FnOnce(&mut SchedulerInner) -> R) -> Option<R> {
        let inner = self.inner.upgrade()?;
        let mut guard = inner.lock().ok()?;
        Some(f(&mut guard))
    }

    /// Whether the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    // =========================================================================
    // Tweens
    // =========================================================================

    /// Register a tween on `target`
    ///
    /// Any live tween already writing one of the same fields on the same
    /// target is reverted and removed first, once the new spec has compiled.
    /// A spec that fails to compile leaves the existing writers untouched.
    /// Start values are written immediately; scroll-bound tweens are synced
    /// to the container's current offset before this returns.
    pub fn register_tween(&self, target: SharedTarget, spec: TweenSpec) -> Result<TweenId> {
        let weak = self.inner.clone();
        let (id, fired) = self
            .with_inner(|inner| -> Result<(TweenId, Fired)> {
                // Compiling writes nothing, so a bad spec leaves the current writers in place
                let validated = Tween::new(target.clone(), &spec)?;
                let key = target_key(&target);
                let mut displaced: SmallVec<[TweenId; 2]> = SmallVec::new();
                for field in spec.field_names() {
                    if let Some(&writer) = inner.writers.get(&(key, field.to_string())) {
                        if !displaced.contains(&writer) {
                            displaced.push(writer);
                        }
                    }
                }
                let tween = if displaced.is_empty() {
                    validated
                } else {
                    for writer in displaced {
                        tracing::debug!(?writer, "replacing tween on shared target");
                        inner.remove_tween(writer, true);
                    }
                    // Recompile so relative starts read the reverted values
                    Tween::new(target, &spec)?
                };
                tween.apply();
                let fields: SmallVec<[String; 4]> = tween.fields().map(str::to_string).collect();
                let id = inner.tweens.insert(tween);
                for field in fields {
                    inner.writers.insert((key, field), id);
                }

                let fired = match spec.autoplay {
                    Autoplay::Scroll(binding) => inner.attach_observer(&weak, binding, Some(id)).1,
                    Autoplay::Play | Autoplay::Paused => Fired::new(),
                };
                tracing::trace!(?id, "registered tween");
                Ok((id, fired))
            })
            .ok_or(VantageError::SchedulerDropped)??;
        fire(fired);
        Ok(id)
    }

    /// Apply a playback action to a tween
    pub fn perform(&self, id: TweenId, action: PlaybackAction) -> bool {
        self.with_inner(|inner| match inner.tweens.get_mut(id) {
            Some(tween) => {
                tween.perform(action);
                true
            }
            None => false,
        })
        .unwrap_or(false)
    }

    /// Seek a tween to a normalized position
    pub fn seek(&self, id: TweenId, progress: f32) -> bool {
        self.with_inner(|inner| match inner.tweens.get_mut(id) {
            Some(tween) => {
                tween.seek(progress);
                true
            }
            None => false,
        })
        .unwrap_or(false)
    }

    pub fn tween_progress(&self, id: TweenId) -> Option<f32> {
        self.with_inner(|inner| inner.tweens.get(id).map(Tween::progress))
            .flatten()
    }

    pub fn tween_state(&self, id: TweenId) -> Option<PlaybackState> {
        self.with_inner(|inner| inner.tweens.get(id).map(Tween::state))
            .flatten()
    }

    /// Whether the tween is still registered
    pub fn contains_tween(&self, id: TweenId) -> bool {
        self.with_inner(|inner| inner.tweens.contains_key(id))
            .unwrap_or(false)
    }

    /// The tween currently writing `field` on `target`
    pub fn writer_of(&self, target: &SharedTarget, field: &str) -> Option<TweenId> {
        let key = target_key(target);
        self.with_inner(|inner| inner.writers.get(&(key, field.to_string())).copied())
            .flatten()
    }

    /// Restore a tween's fields, remove it and any observer driving it
    pub fn revert_tween(&self, id: TweenId) -> bool {
        self.with_inner(|inner| inner.remove_tween(id, true))
            .unwrap_or(false)
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Register a scroll observer that drives no tween, only callbacks
    pub fn register_observer(&self, binding: ScrollBinding) -> Result<ObserverId> {
        let weak = self.inner.clone();
        let (id, fired) = self
            .with_inner(|inner| inner.attach_observer(&weak, binding, None))
            .ok_or(VantageError::SchedulerDropped)?;
        fire(fired);
        Ok(id)
    }

    /// Unsubscribe and remove an observer
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        self.with_inner(|inner| inner.remove_observer(id))
            .unwrap_or(false)
    }

    pub fn observer_progress(&self, id: ObserverId) -> Option<f32> {
        self.with_inner(|inner| inner.observers.get(id).map(ScrollObserver::progress))
            .flatten()
    }

    /// Whether the observer's last offset was inside its window
    pub fn is_observer_active(&self, id: ObserverId) -> bool {
        self.with_inner(|inner| inner.observers.get(id).map(ScrollObserver::is_active))
            .flatten()
            .unwrap_or(false)
    }

    /// Observer attached to a tween, if any
    pub fn observer_of(&self, tween: TweenId) -> Option<ObserverId> {
        self.with_inner(|inner| {
            inner
                .observers
                .iter()
                .find(|(_, o)| o.tween() == Some(tween))
                .map(|(id, _)| id)
        })
        .flatten()
    }

    /// Replace an observer's callbacks
    pub fn set_callbacks(&self, id: ObserverId, callbacks: ObserverCallbacks) -> bool {
        self.with_inner(|inner| match inner.observers.get_mut(id) {
            Some(observer) => {
                observer.set_callbacks(callbacks);
                true
            }
            None => false,
        })
        .unwrap_or(false)
    }

    // =========================================================================
    // Scope roots
    // =========================================================================

    /// Mark `root` as owning a live scope
    pub fn claim_root(&self, root: u64) -> Result<()> {
        self.with_inner(|inner| {
            if inner.live_roots.insert(root) {
                Ok(())
            } else {
                Err(VantageError::ScopeAlreadyLive(root))
            }
        })
        .ok_or(VantageError::SchedulerDropped)?
    }

    /// Release a root claimed by [`SchedulerHandle::claim_root`]
    pub fn release_root(&self, root: u64) {
        self.with_inner(|inner| inner.live_roots.remove(&root));
    }

    pub fn is_root_live(&self, root: u64) -> bool {
        self.with_inner(|inner| inner.live_roots.contains(&root))
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use crate::keyframe::FieldSpec;
    use crate::scroll::tests::TestContainer;
    use crate::scroll::{ScrollWindow, SyncMode};
    use crate::target::ProgressCell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scrubbed(container: &Arc<TestContainer>, sync: SyncMode) -> TweenSpec {
        TweenSpec::new()
            .field("p", FieldSpec::between(0.0, 1.0))
            .easing(Easing::Linear)
            .scroll(
                ScrollBinding::new(
                    container.clone(),
                    ScrollWindow::parse("top top", "bottom bottom").unwrap(),
                )
                .sync(sync),
            )
    }

    #[test]
    fn test_scheduler_tick() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let cell = ProgressCell::shared(0.0);
        let spec = TweenSpec::new()
            .field("p", FieldSpec::between(0.0, 10.0))
            .duration(100.0);
        handle.register_tween(cell.clone(), spec).unwrap();

        assert!(scheduler.tick_ms(16.0));
        assert!(cell.lock().unwrap().p > 0.0);
        assert!(!scheduler.tick_ms(200.0));
        assert_eq!(cell.lock().unwrap().p, 10.0);
        assert!(!scheduler.has_active_animations());
    }

    #[test]
    fn test_continuous_scroll_scrubs_without_hysteresis() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let container = TestContainer::new(1000.0, 3000.0);
        let cell = ProgressCell::shared(0.0);
        handle
            .register_tween(cell.clone(), scrubbed(&container, SyncMode::Continuous))
            .unwrap();
        assert_eq!(container.listener_count(), 1);

        container.scroll_to(1000.0);
        assert!((cell.lock().unwrap().p - 0.5).abs() < 1e-5);
        container.scroll_to(2000.0);
        assert_eq!(cell.lock().unwrap().p, 1.0);
        container.scroll_to(0.0);
        assert_eq!(cell.lock().unwrap().p, 0.0);
    }

    #[test]
    fn test_smoothed_scroll_lags_then_converges() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let container = TestContainer::new(1000.0, 3000.0);
        let cell = ProgressCell::shared(0.0);
        handle
            .register_tween(cell.clone(), scrubbed(&container, SyncMode::Smoothed(0.2)))
            .unwrap();

        container.scroll_to(2000.0);
        assert_eq!(cell.lock().unwrap().p, 0.0);
        scheduler.tick_ms(16.0);
        let first = cell.lock().unwrap().p;
        assert!(first > 0.0 && first < 1.0);
        for _ in 0..200 {
            scheduler.tick_ms(16.0);
        }
        assert_eq!(cell.lock().unwrap().p, 1.0);
    }

    #[test]
    fn test_action_sync_plays_and_reverses() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let container = TestContainer::new(100.0, 1000.0);
        let cell = ProgressCell::shared(5.0);
        let spec = TweenSpec::new()
            .field("p", FieldSpec::between(0.0, 1.0))
            .duration(100.0)
            .easing(Easing::Linear)
            .scroll(
                ScrollBinding::new(
                    container.clone(),
                    ScrollWindow::parse("top 100px", "bottom bottom").unwrap(),
                )
                .sync("play reverse".parse().unwrap()),
            );
        let id = handle.register_tween(cell.clone(), spec).unwrap();
        assert_eq!(cell.lock().unwrap().p, 0.0);
        assert_eq!(handle.tween_state(id), Some(PlaybackState::Idle));

        container.scroll_to(50.0);
        scheduler.tick_ms(50.0);
        assert_eq!(cell.lock().unwrap().p, 0.0);

        container.scroll_to(150.0);
        assert_eq!(handle.tween_state(id), Some(PlaybackState::Playing));
        scheduler.tick_ms(200.0);
        assert_eq!(cell.lock().unwrap().p, 1.0);

        container.scroll_to(10.0);
        scheduler.tick_ms(200.0);
        assert_eq!(cell.lock().unwrap().p, 0.0);
    }

    #[test]
    fn test_replace_composition_reverts_previous_writer() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let container = TestContainer::new(1000.0, 3000.0);
        let cell = ProgressCell::shared(0.25);
        let target: SharedTarget = cell.clone();

        let first = handle
            .register_tween(target.clone(), scrubbed(&container, SyncMode::Continuous))
            .unwrap();
        let second = handle
            .register_tween(target.clone(), scrubbed(&container, SyncMode::Continuous))
            .unwrap();

        assert!(!handle.contains_tween(first));
        assert_eq!(handle.writer_of(&target, "p"), Some(second));
        assert_eq!(scheduler.tween_count(), 1);
        assert_eq!(scheduler.observer_count(), 1);
        assert_eq!(container.listener_count(), 1);

        handle.revert_tween(second);
        assert_eq!(cell.lock().unwrap().p, 0.25);
        assert_eq!(container.listener_count(), 0);
    }

    #[test]
    fn test_rejected_replacement_keeps_current_writer() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let container = TestContainer::new(1000.0, 3000.0);
        let cell = ProgressCell::shared(0.0);
        let target: SharedTarget = cell.clone();

        let first = handle
            .register_tween(target.clone(), scrubbed(&container, SyncMode::Continuous))
            .unwrap();
        container.scroll_to(1000.0);
        assert!((cell.lock().unwrap().p - 0.5).abs() < 1e-5);

        let broken = TweenSpec::new()
            .field("p", FieldSpec::Keyframes(Vec::new()))
            .scroll(ScrollBinding::new(
                container.clone(),
                ScrollWindow::parse("top top", "bottom bottom").unwrap(),
            ));
        assert!(handle.register_tween(target.clone(), broken).is_err());

        assert!(handle.contains_tween(first));
        assert_eq!(handle.writer_of(&target, "p"), Some(first));
        assert_eq!(container.listener_count(), 1);
        assert!((cell.lock().unwrap().p - 0.5).abs() < 1e-5);

        container.scroll_to(1500.0);
        assert!((cell.lock().unwrap().p - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_observer_callbacks_fire_outside_lock() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let container = TestContainer::new(100.0, 1000.0);
        let enters = Arc::new(AtomicUsize::new(0));
        let counter = enters.clone();
        let reentrant = handle.clone();
        let callbacks = ObserverCallbacks::default().on_enter(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            // Re-entering the scheduler from a callback must not deadlock
            assert_eq!(reentrant.tween_state(TweenId::default()), None);
        });
        let id = handle
            .register_observer(
                ScrollBinding::new(
                    container.clone(),
                    ScrollWindow::parse("top 100px", "top 200px").unwrap(),
                )
                .callbacks(callbacks),
            )
            .unwrap();

        container.scroll_to(150.0);
        container.scroll_to(160.0);
        assert_eq!(enters.load(Ordering::SeqCst), 1);
        assert!(handle.is_observer_active(id));
        assert!((handle.observer_progress(id).unwrap() - 0.6).abs() < 1e-5);

        handle.remove_observer(id);
        container.scroll_to(0.0);
        container.scroll_to(150.0);
        assert_eq!(enters.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_claim_root_is_exclusive() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        handle.claim_root(1).unwrap();
        assert_eq!(handle.claim_root(1), Err(VantageError::ScopeAlreadyLive(1)));
        handle.release_root(1);
        assert!(handle.claim_root(1).is_ok());
    }

    #[test]
    fn test_dropped_scheduler_detaches_listeners() {
        let container = TestContainer::new(100.0, 1000.0);
        let handle = {
            let scheduler = AnimationScheduler::new();
            let handle = scheduler.handle();
            handle
                .register_observer(ScrollBinding::new(
                    container.clone(),
                    ScrollWindow::parse("top", "bottom").unwrap(),
                ))
                .unwrap();
            assert_eq!(container.listener_count(), 1);
            handle
        };
        assert_eq!(container.listener_count(), 0);
        assert!(!handle.is_alive());
        assert!(handle
            .register_tween(ProgressCell::shared(0.0), TweenSpec::new())
            .is_err());
    }
}
