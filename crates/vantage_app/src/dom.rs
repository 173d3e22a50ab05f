//! In-memory document host
//!
//! The scene drives DOM-like nodes it does not own. [`Document`] stands in
//! for the page: elements are looked up by class name and expose their
//! animatable style properties. [`ScrollArea`] is the page's scroll container.

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use vantage_animation::{Animatable, Axis, ListenerId, ScrollContainer, ScrollListener, ScrollNotice};

new_key_type! {
    /// Handle to an element in a [`Document`]
    pub struct ElementId;
}

/// Shared element handle, usable directly as a tween target
pub type SharedElement = Arc<Mutex<Element>>;

/// Style properties of one element
///
/// `width` is a percentage of the parent, `x` and `y` are translations in
/// pixels, `rotate` is in degrees.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    classes: SmallVec<[String; 2]>,
    pub opacity: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub rotate: f32,
    pub scale: f32,
    mutations: u64,
}

impl Element {
    pub fn new(classes: &[&str]) -> Self {
        Self {
            classes: classes.iter().map(|c| c.to_string()).collect(),
            opacity: 1.0,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            rotate: 0.0,
            scale: 1.0,
            mutations: 0,
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    /// Number of style writes made through [`Animatable::set_field`]
    pub fn mutations(&self) -> u64 {
        self.mutations
    }
}

impl Animatable for Element {
    fn get_field(&self, field: &str) -> Option<f32> {
        match field {
            "opacity" => Some(self.opacity),
            "x" => Some(self.x),
            "y" => Some(self.y),
            "width" => Some(self.width),
            "rotate" => Some(self.rotate),
            "scale" => Some(self.scale),
            _ => None,
        }
    }

    fn set_field(&mut self, field: &str, value: f32) -> bool {
        let slot = match field {
            "opacity" => &mut self.opacity,
            "x" => &mut self.x,
            "y" => &mut self.y,
            "width" => &mut self.width,
            "rotate" => &mut self.rotate,
            "scale" => &mut self.scale,
            _ => return false,
        };
        *slot = value;
        self.mutations += 1;
        true
    }
}

/// Element registry with class-name lookup
#[derive(Default)]
pub struct Document {
    elements: SlotMap<ElementId, SharedElement>,
    /// Insertion order, for first-match queries
    order: Vec<ElementId>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an element carrying `classes`
    pub fn create_element(&mut self, classes: &[&str]) -> (ElementId, SharedElement) {
        let element = Arc::new(Mutex::new(Element::new(classes)));
        let id = self.elements.insert(element.clone());
        self.order.push(id);
        (id, element)
    }

    /// Remove an element; tweens still holding it keep a detached copy
    pub fn remove(&mut self, id: ElementId) -> bool {
        self.order.retain(|e| *e != id);
        self.elements.remove(id).is_some()
    }

    pub fn get(&self, id: ElementId) -> Option<SharedElement> {
        self.elements.get(id).cloned()
    }

    /// First element carrying `class`, in insertion order
    pub fn query(&self, class: &str) -> Option<SharedElement> {
        self.order
            .iter()
            .filter_map(|id| self.elements.get(*id))
            .find(|e| e.lock().map(|e| e.has_class(class)).unwrap_or(false))
            .cloned()
    }

    /// Every element carrying `class`, in document order
    pub fn query_all(&self, class: &str) -> Vec<SharedElement> {
        self.order
            .iter()
            .filter_map(|id| self.elements.get(*id))
            .filter(|e| e.lock().map(|e| e.has_class(class)).unwrap_or(false))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("elements", &self.elements.len())
            .finish()
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct ScrollState {
    offset: (f32, f32),
    viewport: (f32, f32),
    content: (f32, f32),
}

impl ScrollState {
    fn max_offset(&self) -> (f32, f32) {
        (
            (self.content.0 - self.viewport.0).max(0.0),
            (self.content.1 - self.viewport.1).max(0.0),
        )
    }

    fn clamp_offset(&mut self) {
        let (max_x, max_y) = self.max_offset();
        self.offset = (self.offset.0.clamp(0.0, max_x), self.offset.1.clamp(0.0, max_y));
    }
}

/// Scrollable container with listener subscription
///
/// Offsets are clamped to `[0, content - viewport]` on each axis. Listeners
/// are invoked after every lock is released, so they may read the container
/// or subscribe and unsubscribe freely.
pub struct ScrollArea {
    state: Mutex<ScrollState>,
    listeners: Mutex<SlotMap<ListenerId, ScrollListener>>,
}

impl ScrollArea {
    /// Create a container with `(width, height)` viewport and content sizes
    pub fn new(viewport: (f32, f32), content: (f32, f32)) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ScrollState {
                offset: (0.0, 0.0),
                viewport,
                content,
            }),
            listeners: Mutex::new(SlotMap::with_key()),
        })
    }

    /// Vertical page of `content_height` shown through a `viewport_height` window
    pub fn vertical(viewport_height: f32, content_height: f32) -> Arc<Self> {
        Self::new((0.0, viewport_height), (0.0, content_height))
    }

    fn state(&self) -> MutexGuard<'_, ScrollState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, notice: ScrollNotice) {
        let listeners: SmallVec<[ScrollListener; 4]> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for listener in listeners {
            listener(notice);
        }
    }

    /// Set the vertical offset and notify listeners
    pub fn scroll_to(&self, y: f32) {
        let x = self.state().offset.0;
        self.scroll_to_xy(x, y);
    }

    pub fn scroll_to_xy(&self, x: f32, y: f32) {
        {
            let mut state = self.state();
            state.offset = (x, y);
            state.clamp_offset();
        }
        self.notify(ScrollNotice::Scroll);
    }

    pub fn scroll_by(&self, dy: f32) {
        let (x, y) = self.state().offset;
        self.scroll_to_xy(x, y + dy);
    }

    /// Change viewport and content sizes and notify listeners of a resize
    pub fn resize(&self, viewport: (f32, f32), content: (f32, f32)) {
        {
            let mut state = self.state();
            state.viewport = viewport;
            state.content = content;
            state.clamp_offset();
        }
        self.notify(ScrollNotice::Resize);
    }

    pub fn offset(&self) -> (f32, f32) {
        self.state().offset
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ScrollContainer for ScrollArea {
    fn scroll_offset(&self, axis: Axis) -> f32 {
        let offset = self.state().offset;
        match axis {
            Axis::X => offset.0,
            Axis::Y => offset.1,
        }
    }

    fn viewport_extent(&self, axis: Axis) -> f32 {
        let viewport = self.state().viewport;
        match axis {
            Axis::X => viewport.0,
            Axis::Y => viewport.1,
        }
    }

    fn content_extent(&self, axis: Axis) -> f32 {
        let content = self.state().content;
        match axis {
            Axis::X => content.0,
            Axis::Y => content.1,
        }
    }

    fn subscribe(&self, listener: ScrollListener) -> ListenerId {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(listener)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }
}

impl std::fmt::Debug for ScrollArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = *self.state();
        f.debug_struct("ScrollArea")
            .field("offset", &state.offset)
            .field("viewport", &state.viewport)
            .field("content", &state.content)
            .field("listeners", &self.listener_count())
            .finish()
    }
}
