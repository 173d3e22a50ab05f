//! Progress bar binding
//!
//! Two scroll-bound tweens on the page's scroll container: the bar's
//! container fades and slides in once the page is scrolled past the reveal
//! boundary, and the inner bar's width follows overall scroll progress.

use crate::config::ProgressBarConfig;
use crate::dom::Document;
use std::sync::Arc;
use vantage_animation::{
    Easing, FieldSpec, ObserverCallbacks, ScopeContext, ScrollBinding, ScrollContainer,
    SharedTarget, TweenId, TweenSpec,
};
use vantage_core::Result;

/// Tweens created by [`bind_progress_bar`]; `None` where a node was missing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgressBarBinding {
    pub reveal: Option<TweenId>,
    pub fill: Option<TweenId>,
}

impl ProgressBarBinding {
    pub fn is_bound(&self) -> bool {
        self.reveal.is_some() || self.fill.is_some()
    }
}

/// Register the progress bar tweens inside a scope
///
/// Missing nodes (or a missing container) are skipped with a warning so the
/// binding can be registered again once they mount. Registering again
/// replaces the earlier tweens on the same nodes.
pub fn bind_progress_bar(
    ctx: &mut ScopeContext<'_>,
    document: &Document,
    container: Option<Arc<dyn ScrollContainer>>,
    config: &ProgressBarConfig,
) -> Result<ProgressBarBinding> {
    let mut binding = ProgressBarBinding::default();
    let Some(container) = container else {
        tracing::warn!("scroll container not mounted, skipping progress bar");
        return Ok(binding);
    };

    match document.query(&config.container_class) {
        Some(node) => {
            let target: SharedTarget = node;
            let spec = TweenSpec::new()
                .field("opacity", FieldSpec::between(0.0, 1.0))
                .field("y", FieldSpec::between(config.slide_offset, 0.0))
                .duration(config.fade_duration_ms)
                .easing(Easing::Linear)
                .scroll(
                    ScrollBinding::new(container.clone(), config.reveal.window()?)
                        .sync(config.reveal.sync_mode()?)
                        .debug(config.reveal.debug),
                );
            binding.reveal = Some(ctx.animate(target, spec)?);
        }
        None => tracing::warn!(
            class = %config.container_class,
            "progress bar container not found, skipping reveal"
        ),
    }

    match document.query(&config.bar_class) {
        Some(node) => {
            let target: SharedTarget = node;
            let callbacks = ObserverCallbacks::default()
                .on_enter(|event| tracing::debug!(?event, "progress bar entered"))
                .on_leave(|event| tracing::debug!(?event, "progress bar left"));
            let spec = TweenSpec::new()
                .field("width", FieldSpec::between(0.0, 100.0))
                .easing(Easing::Linear)
                .scroll(
                    ScrollBinding::new(container, config.fill.window()?)
                        .sync(config.fill.sync_mode()?)
                        .callbacks(callbacks)
                        .debug(config.fill.debug),
                );
            binding.fill = Some(ctx.animate(target, spec)?);
        }
        None => tracing::warn!(
            class = %config.bar_class,
            "progress bar node not found, skipping fill"
        ),
    }

    Ok(binding)
}
