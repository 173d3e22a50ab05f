//! Animation scopes
//!
//! An [`AnimationScope`] is the registry of everything a mounted component
//! set up: tweens, standalone scroll observers and named methods. Reverting
//! the scope restores every animated field, unsubscribes every listener and
//! forgets every method in one step.
//!
//! ```ignore
//! let mut scope = AnimationScope::new(scheduler.handle(), root)?;
//! scope.add(|ctx| {
//!     ctx.animate(bar.clone(), TweenSpec::new().field("width", FieldSpec::between(0.0, 100.0)))?;
//!     Ok(())
//! })?;
//! // on unmount
//! scope.revert();
//! ```

use crate::scheduler::{ObserverId, SchedulerHandle, TweenId};
use crate::target::SharedTarget;
use crate::tween::{ScrollBinding, TweenSpec};
use rustc_hash::FxHashMap;
use vantage_core::{Result, VantageError};

/// Identifier of the element a scope is bound to
pub type RootId = u64;

/// A named scope method, invoked through [`AnimationScope::call`]
pub type ScopeMethod = Box<dyn FnMut(&mut ScopeContext<'_>, f32) -> Result<()> + Send>;

#[derive(Default)]
struct Registry {
    tweens: Vec<TweenId>,
    observers: Vec<ObserverId>,
}

/// Registration context passed to [`AnimationScope::add`] and scope methods
pub struct ScopeContext<'a> {
    handle: &'a SchedulerHandle,
    root: RootId,
    registry: &'a mut Registry,
    methods: &'a mut FxHashMap<String, ScopeMethod>,
}

impl ScopeContext<'_> {
    /// Register a tween owned by this scope
    pub fn animate(&mut self, target: SharedTarget, spec: TweenSpec) -> Result<TweenId> {
        let id = self.handle.register_tween(target, spec)?;
        // Drop ids of tweens the scheduler already replaced
        let handle = self.handle;
        self.registry.tweens.retain(|t| handle.contains_tween(*t));
        self.registry.tweens.push(id);
        Ok(id)
    }

    /// Register a scroll observer that only fires callbacks
    pub fn on_scroll(&mut self, binding: ScrollBinding) -> Result<ObserverId> {
        let id = self.handle.register_observer(binding)?;
        self.registry.observers.push(id);
        Ok(id)
    }

    /// Register a named method callable after setup
    pub fn add_method<F>(&mut self, name: impl Into<String>, method: F)
    where
        F: FnMut(&mut ScopeContext<'_>, f32) -> Result<()> + Send + 'static,
    {
        self.methods.insert(name.into(), Box::new(method));
    }

    /// Revert and forget one tween of this scope
    pub fn revert_tween(&mut self, id: TweenId) -> bool {
        self.registry.tweens.retain(|t| *t != id);
        self.handle.revert_tween(id)
    }

    pub fn handle(&self) -> &SchedulerHandle {
        self.handle
    }

    pub fn root(&self) -> RootId {
        self.root
    }
}

/// Lifetime-bound registry of animations, revertible as a unit
///
/// At most one scope can be live per root. `revert` consumes the scope, and
/// dropping an unreverted scope reverts it.
pub struct AnimationScope {
    handle: SchedulerHandle,
    root: RootId,
    registry: Registry,
    methods: FxHashMap<String, ScopeMethod>,
    reverted: bool,
}

impl AnimationScope {
    /// Create the scope for `root`
    ///
    /// Fails with [`VantageError::ScopeAlreadyLive`] while another scope for
    /// the same root has not been reverted.
    pub fn new(handle: SchedulerHandle, root: RootId) -> Result<Self> {
        handle.claim_root(root)?;
        tracing::debug!(root, "animation scope created");
        Ok(Self {
            handle,
            root,
            registry: Registry::default(),
            methods: FxHashMap::default(),
            reverted: false,
        })
    }

    /// Run a registration closure inside this scope
    pub fn add<F>(&mut self, setup: F) -> Result<()>
    where
        F: FnOnce(&mut ScopeContext<'_>) -> Result<()>,
    {
        let mut ctx = ScopeContext {
            handle: &self.handle,
            root: self.root,
            registry: &mut self.registry,
            methods: &mut self.methods,
        };
        setup(&mut ctx)
    }

    /// Invoke a method registered with [`ScopeContext::add_method`]
    pub fn call(&mut self, name: &str, arg: f32) -> Result<()> {
        let mut method = self
            .methods
            .remove(name)
            .ok_or_else(|| VantageError::UnknownMethod(name.to_string()))?;
        let result = {
            let mut ctx = ScopeContext {
                handle: &self.handle,
                root: self.root,
                registry: &mut self.registry,
                methods: &mut self.methods,
            };
            method(&mut ctx, arg)
        };
        self.methods.entry(name.to_string()).or_insert(method);
        result
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn root(&self) -> RootId {
        self.root
    }

    /// Tweens registered through this scope, oldest first
    pub fn tweens(&self) -> &[TweenId] {
        &self.registry.tweens
    }

    pub fn observers(&self) -> &[ObserverId] {
        &self.registry.observers
    }

    /// Revert every animation and release the root
    pub fn revert(mut self) {
        self.revert_all();
    }

    fn revert_all(&mut self) {
        if self.reverted {
            return;
        }
        self.reverted = true;

        for id in self.registry.observers.drain(..).rev() {
            self.handle.remove_observer(id);
        }
        let mut reverted = 0;
        for id in self.registry.tweens.drain(..).rev() {
            if self.handle.revert_tween(id) {
                reverted += 1;
            }
        }
        self.methods.clear();
        self.handle.release_root(self.root);
        tracing::debug!(root = self.root, reverted, "animation scope reverted");
    }
}

impl Drop for AnimationScope {
    fn drop(&mut self) {
        self.revert_all();
    }
}

impl std::fmt::Debug for AnimationScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationScope")
            .field("root", &self.root)
            .field("tweens", &self.registry.tweens.len())
            .field("observers", &self.registry.observers.len())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use crate::keyframe::FieldSpec;
    use crate::scheduler::AnimationScheduler;
    use crate::scroll::tests::TestContainer;
    use crate::scroll::ScrollWindow;
    use crate::target::ProgressCell;

    #[test]
    fn test_one_live_scope_per_root() {
        let scheduler = AnimationScheduler::new();
        let first = AnimationScope::new(scheduler.handle(), 1).unwrap();
        assert!(matches!(
            AnimationScope::new(scheduler.handle(), 1),
            Err(VantageError::ScopeAlreadyLive(1))
        ));
        assert!(AnimationScope::new(scheduler.handle(), 2).is_ok());
        first.revert();
        assert!(AnimationScope::new(scheduler.handle(), 1).is_ok());
    }

    #[test]
    fn test_revert_removes_listeners_and_restores_fields() {
        let scheduler = AnimationScheduler::new();
        let container = TestContainer::new(100.0, 1100.0);
        let cell = ProgressCell::shared(0.75);
        let mut scope = AnimationScope::new(scheduler.handle(), 9).unwrap();
        scope
            .add(|ctx| {
                ctx.animate(
                    cell.clone(),
                    TweenSpec::new()
                        .field("p", FieldSpec::between(0.0, 1.0))
                        .easing(Easing::Linear)
                        .scroll(ScrollBinding::new(
                            container.clone(),
                            ScrollWindow::parse("top top", "bottom bottom").unwrap(),
                        )),
                )?;
                ctx.on_scroll(ScrollBinding::new(
                    container.clone(),
                    ScrollWindow::parse("top", "bottom").unwrap(),
                ))?;
                Ok(())
            })
            .unwrap();
        assert_eq!(container.listener_count(), 2);

        container.scroll_to(500.0);
        assert!((cell.lock().unwrap().p - 0.5).abs() < 1e-5);

        scope.revert();
        assert_eq!(container.listener_count(), 0);
        assert_eq!(scheduler.tween_count(), 0);
        assert_eq!(cell.lock().unwrap().p, 0.75);

        container.scroll_to(900.0);
        assert_eq!(cell.lock().unwrap().p, 0.75);
    }

    #[test]
    fn test_drop_reverts_once() {
        let scheduler = AnimationScheduler::new();
        let cell = ProgressCell::shared(3.0);
        {
            let mut scope = AnimationScope::new(scheduler.handle(), 4).unwrap();
            scope
                .add(|ctx| {
                    ctx.animate(
                        cell.clone(),
                        TweenSpec::new().field("p", FieldSpec::to(10.0)),
                    )?;
                    Ok(())
                })
                .unwrap();
            scheduler.tick_ms(100.0);
            assert!(cell.lock().unwrap().p > 3.0);
        }
        assert_eq!(cell.lock().unwrap().p, 3.0);
        assert!(!scheduler.handle().is_root_live(4));
    }

    #[test]
    fn test_methods_register_tweens_in_scope() {
        let scheduler = AnimationScheduler::new();
        let logo = ProgressCell::shared(0.0);
        let mut scope = AnimationScope::new(scheduler.handle(), 5).unwrap();
        let target = logo.clone();
        scope
            .add(move |ctx| {
                ctx.add_method("rotate", move |ctx, turns| {
                    ctx.animate(
                        target.clone(),
                        TweenSpec::new()
                            .field("p", FieldSpec::to(turns * 360.0))
                            .duration(100.0)
                            .easing(Easing::Out(4.0)),
                    )?;
                    Ok(())
                });
                Ok(())
            })
            .unwrap();

        scope.call("rotate", 1.0).unwrap();
        scheduler.tick_ms(200.0);
        assert_eq!(logo.lock().unwrap().p, 360.0);

        scope.call("rotate", 2.0).unwrap();
        scheduler.tick_ms(200.0);
        assert_eq!(logo.lock().unwrap().p, 720.0);
        assert!(scope.has_method("rotate"));
        assert_eq!(scheduler.tween_count(), 1);

        for turns in 3..10 {
            scope.call("rotate", turns as f32).unwrap();
        }
        assert_eq!(scope.tweens().len(), 1);
        assert!(scheduler.handle().contains_tween(scope.tweens()[0]));

        assert!(matches!(
            scope.call("spin", 1.0),
            Err(VantageError::UnknownMethod(_))
        ));

        scope.revert();
        assert_eq!(logo.lock().unwrap().p, 0.0);
    }
}
