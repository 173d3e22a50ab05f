//! Vantage application layer
//!
//! Wires the animation and camera crates to a page: an in-memory document
//! and scroll container, the progress bar binding, scene configuration and
//! the mount/frame/unmount lifecycle.
//!
//! # Example
//!
//! ```ignore
//! use vantage_app::prelude::*;
//!
//! let mut host = SceneHost::headless(SceneConfig::default())?;
//! let area = host.scroll_area().unwrap();
//! let mut scene = MountedScene::mount(&mut host)?;
//!
//! area.scroll_to(1200.0);
//! scene.frame(16.0);
//!
//! scene.unmount();
//! ```

pub mod config;
pub mod dom;
pub mod progress_bar;
pub mod scene;

pub use config::{
    BounceConfig, CameraConfig, LogoConfig, ModelConfig, OrbitConfig, PoseKeyframe,
    ProgressBarConfig, SceneConfig, TrackConfig, ViewportConfig, WindowConfig,
};
pub use dom::{Document, Element, ElementId, ScrollArea, SharedElement};
pub use progress_bar::{bind_progress_bar, ProgressBarBinding};
pub use scene::{MountedScene, SceneHost, DEFAULT_ROOT};

pub use vantage_core::{Result, VantageError};

/// Prelude module - import everything commonly needed
pub mod prelude {
    pub use crate::config::SceneConfig;
    pub use crate::dom::{Document, ScrollArea};
    pub use crate::scene::{MountedScene, SceneHost};
    pub use vantage_3d::{CameraState, RigState, Smoothing};
    pub use vantage_animation::ScrollContainer;
    pub use vantage_core::{Result, VantageError};
}
