//! Scroll observers
//!
//! A scroll observer watches one [`ScrollContainer`] and maps its offset along
//! an axis into a normalized progress value for a configured enter/leave
//! window. Crossing the window's edges produces [`ScrollEvent`]s, and the
//! observer's [`SyncMode`] decides how that progress reaches a linked tween.
//!
//! Boundaries use a `"<target edge> <container edge>"` notation:
//!
//! ```text
//! "top 150px"      enter once the container has scrolled 150px
//! "bottom bottom"  the target's bottom meets the viewport's bottom
//! "center"         the target's center meets the viewport's top
//! ```

use crate::tween::PlaybackAction;
use slotmap::new_key_type;
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use vantage_core::{Result, VantageError};

use crate::scheduler::TweenId;

new_key_type! {
    /// Handle to a listener subscribed on a scroll container
    pub struct ListenerId;
}

/// Scroll axis
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    #[default]
    Y,
}

/// Why a scroll listener is being notified
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollNotice {
    /// The scroll offset changed
    Scroll,
    /// The viewport or content size changed
    Resize,
}

/// Listener invoked by a container on scroll or resize
///
/// Containers must not hold their own locks while invoking listeners.
pub type ListenerFn = dyn Fn(ScrollNotice) + Send + Sync;
pub type ScrollListener = Arc<ListenerFn>;

/// A scrollable element the observers can watch
pub trait ScrollContainer: Send + Sync {
    /// Current scroll offset along `axis`
    fn scroll_offset(&self, axis: Axis) -> f32;

    /// Visible extent along `axis`
    fn viewport_extent(&self, axis: Axis) -> f32;

    /// Total scrollable content extent along `axis`
    fn content_extent(&self, axis: Axis) -> f32;

    /// Subscribe to scroll and resize notifications
    fn subscribe(&self, listener: ScrollListener) -> ListenerId;

    /// Remove a listener; returns false if it was not subscribed
    fn unsubscribe(&self, id: ListenerId) -> bool;

    /// Largest reachable scroll offset along `axis`
    fn max_scroll(&self, axis: Axis) -> f32 {
        (self.content_extent(axis) - self.viewport_extent(axis)).max(0.0)
    }
}

// ============================================================================
// Boundaries
// ============================================================================

/// One side of a boundary descriptor
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EdgePosition {
    /// `top` / `start`
    Start,
    /// `center`
    Center,
    /// `bottom` / `end`
    End,
    /// Absolute pixels
    Pixels(f32),
    /// Percentage of the relevant extent
    Percent(f32),
}

impl EdgePosition {
    fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        let edge = match token {
            "top" | "start" | "left" => EdgePosition::Start,
            "center" => EdgePosition::Center,
            "bottom" | "end" | "right" => EdgePosition::End,
            _ => {
                if let Some(px) = token.strip_suffix("px") {
                    EdgePosition::Pixels(px.trim().parse().ok()?)
                } else if let Some(pct) = token.strip_suffix('%') {
                    EdgePosition::Percent(pct.trim().parse().ok()?)
                } else {
                    EdgePosition::Pixels(token.parse().ok()?)
                }
            }
        };
        match edge {
            EdgePosition::Pixels(v) | EdgePosition::Percent(v) if !v.is_finite() => None,
            edge => Some(edge),
        }
    }

    /// Position within an extent
    pub fn resolve(&self, extent: f32) -> f32 {
        match *self {
            EdgePosition::Start => 0.0,
            EdgePosition::Center => extent * 0.5,
            EdgePosition::End => extent,
            EdgePosition::Pixels(px) => px,
            EdgePosition::Percent(pct) => extent * pct / 100.0,
        }
    }

    fn is_named(&self) -> bool {
        matches!(
            self,
            EdgePosition::Start | EdgePosition::Center | EdgePosition::End
        )
    }
}

impl fmt::Display for EdgePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgePosition::Start => write!(f, "top"),
            EdgePosition::Center => write!(f, "center"),
            EdgePosition::End => write!(f, "bottom"),
            EdgePosition::Pixels(px) => write!(f, "{}px", px),
            EdgePosition::Percent(pct) => write!(f, "{}%", pct),
        }
    }
}

/// The span of content an observer's boundaries are measured against
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetSpan {
    /// Offset of the target's leading edge within the scroll content
    pub start: f32,
    /// Extent of the target along the scroll axis
    pub extent: f32,
}

impl TargetSpan {
    pub fn new(start: f32, extent: f32) -> Self {
        Self { start, extent }
    }
}

/// An enter or leave boundary: where the target edge meets the container edge
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Boundary {
    pub target: EdgePosition,
    pub container: EdgePosition,
}

impl Boundary {
    pub fn new(target: EdgePosition, container: EdgePosition) -> Self {
        Self { target, container }
    }

    /// Resolve to a scroll offset
    ///
    /// Named container edges are viewport positions. Numeric container values
    /// count the distance already scrolled past the container's top.
    pub fn resolve(&self, span: TargetSpan, viewport: f32) -> f32 {
        let target = self.target.resolve(span.extent);
        let container = if self.container.is_named() {
            self.container.resolve(viewport)
        } else {
            -self.container.resolve(viewport)
        };
        span.start + target - container
    }
}

impl FromStr for Boundary {
    type Err = VantageError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let invalid = || VantageError::InvalidBoundary(s.to_string());
        let target = parts
            .next()
            .and_then(EdgePosition::parse)
            .ok_or_else(invalid)?;
        let container = match parts.next() {
            Some(token) => EdgePosition::parse(token).ok_or_else(invalid)?,
            None => EdgePosition::Start,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self { target, container })
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.target, self.container)
    }
}

/// Enter/leave window along one axis of a container
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollWindow {
    pub axis: Axis,
    pub enter: Boundary,
    pub leave: Boundary,
    /// Span the boundaries refer to; the whole content when `None`
    pub target: Option<TargetSpan>,
}

impl ScrollWindow {
    pub fn new(enter: Boundary, leave: Boundary) -> Self {
        Self {
            axis: Axis::Y,
            enter,
            leave,
            target: None,
        }
    }

    /// Parse both boundaries from descriptor strings
    pub fn parse(enter: &str, leave: &str) -> Result<Self> {
        Ok(Self::new(enter.parse()?, leave.parse()?))
    }

    pub fn axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }

    pub fn target(mut self, span: TargetSpan) -> Self {
        self.target = Some(span);
        self
    }

    /// Resolve the enter and leave scroll offsets against a container
    pub fn resolve(&self, container: &dyn ScrollContainer) -> (f32, f32) {
        let span = self
            .target
            .unwrap_or_else(|| TargetSpan::new(0.0, container.content_extent(self.axis)));
        let viewport = container.viewport_extent(self.axis);
        (
            self.enter.resolve(span, viewport),
            self.leave.resolve(span, viewport),
        )
    }
}

/// Normalized progress of `offset` inside `[enter, leave]`
///
/// Degenerate windows (`leave <= enter`) snap to 0 or 1.
pub fn window_progress(offset: f32, enter: f32, leave: f32) -> f32 {
    let span = leave - enter;
    if span <= 0.0 || span.is_nan() {
        return if offset <= enter { 0.0 } else { 1.0 };
    }
    ((offset - enter) / span).clamp(0.0, 1.0)
}

// ============================================================================
// Sync modes
// ============================================================================

/// Direction the scroll was moving when an edge was crossed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayDirection {
    Forward,
    Backward,
}

/// Playback actions applied at each edge crossing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObserverActions {
    pub enter_forward: PlaybackAction,
    pub leave_forward: PlaybackAction,
    pub enter_backward: PlaybackAction,
    pub leave_backward: PlaybackAction,
}

impl ObserverActions {
    /// Action for an edge event
    pub fn for_event(&self, event: &ScrollEvent) -> PlaybackAction {
        match event {
            ScrollEvent::Enter {
                direction: PlayDirection::Forward,
                ..
            } => self.enter_forward,
            ScrollEvent::Leave {
                direction: PlayDirection::Forward,
                ..
            } => self.leave_forward,
            ScrollEvent::Enter {
                direction: PlayDirection::Backward,
                ..
            } => self.enter_backward,
            ScrollEvent::Leave {
                direction: PlayDirection::Backward,
                ..
            } => self.leave_backward,
            ScrollEvent::Update { .. } => PlaybackAction::None,
        }
    }
}

impl FromStr for ObserverActions {
    type Err = VantageError;

    fn from_str(s: &str) -> Result<Self> {
        let actions = s
            .split_whitespace()
            .map(str::parse::<PlaybackAction>)
            .collect::<Result<SmallVec<[PlaybackAction; 4]>>>()?;
        use PlaybackAction::None as Skip;
        match actions.as_slice() {
            [enter] => Ok(Self {
                enter_forward: *enter,
                leave_forward: Skip,
                enter_backward: *enter,
                leave_backward: Skip,
            }),
            [enter, leave] => Ok(Self {
                enter_forward: *enter,
                leave_forward: *leave,
                enter_backward: *enter,
                leave_backward: *leave,
            }),
            [enter_forward, leave_forward, enter_backward] => Ok(Self {
                enter_forward: *enter_forward,
                leave_forward: *leave_forward,
                enter_backward: *enter_backward,
                leave_backward: Skip,
            }),
            [enter_forward, leave_forward, enter_backward, leave_backward] => Ok(Self {
                enter_forward: *enter_forward,
                leave_forward: *leave_forward,
                enter_backward: *enter_backward,
                leave_backward: *leave_backward,
            }),
            _ => Err(VantageError::InvalidSyncMode(s.to_string())),
        }
    }
}

/// How scroll progress drives the linked tween
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum SyncMode {
    /// Progress maps 1:1 onto the tween timeline
    #[default]
    Continuous,
    /// The tween's progress chases scroll progress by this factor each frame
    Smoothed(f32),
    /// Discrete playback actions on edge crossings
    Actions(ObserverActions),
}

impl FromStr for SyncMode {
    type Err = VantageError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed == "true" {
            return Ok(SyncMode::Continuous);
        }
        if let Ok(factor) = trimmed.parse::<f32>() {
            return if factor >= 1.0 && factor.is_finite() {
                Ok(SyncMode::Continuous)
            } else if factor > 0.0 {
                Ok(SyncMode::Smoothed(factor))
            } else {
                Err(VantageError::InvalidSyncMode(s.to_string()))
            };
        }
        trimmed
            .parse::<ObserverActions>()
            .map(SyncMode::Actions)
            .map_err(|_| VantageError::InvalidSyncMode(s.to_string()))
    }
}

// ============================================================================
// Events and callbacks
// ============================================================================

/// Notification produced by an observer
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScrollEvent {
    Enter { direction: PlayDirection, progress: f32 },
    Leave { direction: PlayDirection, progress: f32 },
    Update { direction: PlayDirection, progress: f32 },
}

impl ScrollEvent {
    pub fn progress(&self) -> f32 {
        match *self {
            ScrollEvent::Enter { progress, .. }
            | ScrollEvent::Leave { progress, .. }
            | ScrollEvent::Update { progress, .. } => progress,
        }
    }

    pub fn direction(&self) -> PlayDirection {
        match *self {
            ScrollEvent::Enter { direction, .. }
            | ScrollEvent::Leave { direction, .. }
            | ScrollEvent::Update { direction, .. } => direction,
        }
    }

    pub fn is_edge(&self) -> bool {
        !matches!(self, ScrollEvent::Update { .. })
    }
}

/// User callback attached to an observer
pub type ScrollCallback = Arc<dyn Fn(&ScrollEvent) + Send + Sync>;

/// Optional callbacks fired after the observer has updated
#[derive(Clone, Default)]
pub struct ObserverCallbacks {
    pub on_enter: Option<ScrollCallback>,
    pub on_leave: Option<ScrollCallback>,
    pub on_update: Option<ScrollCallback>,
}

impl ObserverCallbacks {
    pub fn on_enter(mut self, f: impl Fn(&ScrollEvent) + Send + Sync + 'static) -> Self {
        self.on_enter = Some(Arc::new(f));
        self
    }

    pub fn on_leave(mut self, f: impl Fn(&ScrollEvent) + Send + Sync + 'static) -> Self {
        self.on_leave = Some(Arc::new(f));
        self
    }

    pub fn on_update(mut self, f: impl Fn(&ScrollEvent) + Send + Sync + 'static) -> Self {
        self.on_update = Some(Arc::new(f));
        self
    }

    /// The callback that should see `event`, if any
    pub fn for_event(&self, event: &ScrollEvent) -> Option<ScrollCallback> {
        match event {
            ScrollEvent::Enter { .. } => self.on_enter.clone(),
            ScrollEvent::Leave { .. } => self.on_leave.clone(),
            ScrollEvent::Update { .. } => self.on_update.clone(),
        }
    }
}

impl fmt::Debug for ObserverCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverCallbacks")
            .field("on_enter", &self.on_enter.is_some())
            .field("on_leave", &self.on_leave.is_some())
            .field("on_update", &self.on_update.is_some())
            .finish()
    }
}

// ============================================================================
// Observer state
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Zone {
    Before,
    Inside,
    After,
}

/// Live state of one registered observer
pub struct ScrollObserver {
    container: Arc<dyn ScrollContainer>,
    window: ScrollWindow,
    sync: SyncMode,
    callbacks: ObserverCallbacks,
    debug: bool,
    tween: Option<TweenId>,
    listener: Option<ListenerId>,
    enter_point: f32,
    leave_point: f32,
    last_offset: f32,
    zone: Zone,
    progress: f32,
    driven: f32,
}

impl ScrollObserver {
    /// Create an observer positioned before its window
    pub(crate) fn new(
        container: Arc<dyn ScrollContainer>,
        window: ScrollWindow,
        sync: SyncMode,
        callbacks: ObserverCallbacks,
        debug: bool,
        tween: Option<TweenId>,
    ) -> Self {
        let (enter_point, leave_point) = window.resolve(container.as_ref());
        Self {
            container,
            window,
            sync,
            callbacks,
            debug,
            tween,
            listener: None,
            enter_point,
            leave_point,
            last_offset: enter_point,
            zone: Zone::Before,
            progress: 0.0,
            driven: 0.0,
        }
    }

    fn classify(&self, offset: f32) -> Zone {
        if offset <= self.enter_point {
            Zone::Before
        } else if offset <= self.leave_point {
            Zone::Inside
        } else {
            Zone::After
        }
    }

    /// Re-resolve boundaries after the container changed size
    pub fn refresh_bounds(&mut self) {
        let (enter, leave) = self.window.resolve(self.container.as_ref());
        self.enter_point = enter;
        self.leave_point = leave;
    }

    /// Read the container's offset and recompute progress
    ///
    /// Returns the edge events crossed since the previous update followed by
    /// one `Update` event.
    pub fn update(&mut self) -> SmallVec<[ScrollEvent; 3]> {
        let offset = self.container.scroll_offset(self.window.axis);
        let direction = if offset < self.last_offset {
            PlayDirection::Backward
        } else {
            PlayDirection::Forward
        };
        self.last_offset = offset;
        self.progress = window_progress(offset, self.enter_point, self.leave_point);

        let zone = self.classify(offset);
        let progress = self.progress;
        let mut events: SmallVec<[ScrollEvent; 3]> = SmallVec::new();
        let enter = |direction| ScrollEvent::Enter {
            direction,
            progress,
        };
        let leave = |direction| ScrollEvent::Leave {
            direction,
            progress,
        };
        match (self.zone, zone) {
            (Zone::Before, Zone::Inside) => events.push(enter(PlayDirection::Forward)),
            (Zone::Before, Zone::After) => {
                events.push(enter(PlayDirection::Forward));
                events.push(leave(PlayDirection::Forward));
            }
            (Zone::Inside, Zone::After) => events.push(leave(PlayDirection::Forward)),
            (Zone::After, Zone::Inside) => events.push(enter(PlayDirection::Backward)),
            (Zone::After, Zone::Before) => {
                events.push(enter(PlayDirection::Backward));
                events.push(leave(PlayDirection::Backward));
            }
            (Zone::Inside, Zone::Before) => events.push(leave(PlayDirection::Backward)),
            _ => {}
        }
        self.zone = zone;
        events.push(ScrollEvent::Update {
            direction,
            progress,
        });

        if self.debug {
            tracing::debug!(
                offset,
                enter = self.enter_point,
                leave = self.leave_point,
                progress,
                "scroll observer update"
            );
            for event in events.iter().filter(|e| e.is_edge()) {
                tracing::debug!(?event, "scroll observer edge");
            }
        }
        events
    }

    /// Advance smoothed progress one frame; returns the new driven value if it moved
    pub(crate) fn step_smoothing(&mut self) -> Option<f32> {
        let SyncMode::Smoothed(factor) = self.sync else {
            return None;
        };
        let delta = self.progress - self.driven;
        if delta == 0.0 {
            return None;
        }
        if delta.abs() < 1e-4 {
            self.driven = self.progress;
        } else {
            self.driven += delta * factor;
        }
        Some(self.driven)
    }

    /// Jump smoothed progress straight to the scroll progress
    pub(crate) fn settle_driven(&mut self) -> f32 {
        self.driven = self.progress;
        self.driven
    }

    /// Progress of the scroll offset inside the window
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Progress currently applied to the tween in smoothed mode
    pub fn driven_progress(&self) -> f32 {
        self.driven
    }

    /// Whether the last offset was inside the window
    pub fn is_active(&self) -> bool {
        self.zone == Zone::Inside
    }

    /// Resolved enter and leave offsets
    pub fn points(&self) -> (f32, f32) {
        (self.enter_point, self.leave_point)
    }

    pub fn sync(&self) -> SyncMode {
        self.sync
    }

    pub fn callbacks(&self) -> &ObserverCallbacks {
        &self.callbacks
    }

    pub fn tween(&self) -> Option<TweenId> {
        self.tween
    }

    pub(crate) fn container(&self) -> &Arc<dyn ScrollContainer> {
        &self.container
    }

    pub(crate) fn set_callbacks(&mut self, callbacks: ObserverCallbacks) {
        self.callbacks = callbacks;
    }

    pub(crate) fn set_listener(&mut self, id: ListenerId) {
        self.listener = Some(id);
    }

    /// Detach from the container
    pub(crate) fn detach(&mut self) {
        if let Some(id) = self.listener.take() {
            self.container.unsubscribe(id);
        }
    }
}

impl fmt::Debug for ScrollObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollObserver")
            .field("window", &self.window)
            .field("sync", &self.sync)
            .field("points", &(self.enter_point, self.leave_point))
            .field("progress", &self.progress)
            .field("active", &self.is_active())
            .finish()
    }
}
